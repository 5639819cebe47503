//! Transport errors shared by every networked adapter.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while talking to an upstream geodata service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The request did not complete in time.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL or endpoint.
        url: String,
        /// Timeout that elapsed, in whole seconds.
        timeout_secs: u64,
    },
    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Request URL or endpoint.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Short error description.
        message: String,
    },
    /// The connection failed before a response arrived.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Request URL or endpoint.
        url: String,
        /// Description reported by the client.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Request URL or endpoint.
        url: String,
        /// Decoder message.
        message: String,
    },
    /// The service needs an API key that was not configured.
    #[error("{service} API key is not configured")]
    MissingCredentials {
        /// Name of the service.
        service: &'static str,
    },
    /// A failover provider was configured without any endpoints.
    #[error("no endpoints configured")]
    NoEndpoints,
}

/// Whether a failed request is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Timeouts, dropped connections and 5xx responses.
    Transient,
    /// Everything else: 4xx responses, bad payloads, configuration gaps.
    Permanent,
}

/// Classify `error` for retry decisions.
///
/// # Examples
///
/// ```
/// use livability_data::{FailureClass, TransportError, classify_failure};
///
/// let err = TransportError::Http {
///     url: "https://overpass-api.de/api/interpreter".into(),
///     status: 504,
///     message: "Gateway Timeout".into(),
/// };
/// assert_eq!(classify_failure(&err), FailureClass::Transient);
/// ```
#[must_use]
pub const fn classify_failure(error: &TransportError) -> FailureClass {
    match error {
        TransportError::Timeout { .. } | TransportError::Network { .. } => FailureClass::Transient,
        TransportError::Http { status, .. } if *status >= 500 => FailureClass::Transient,
        TransportError::Http { .. }
        | TransportError::Decode { .. }
        | TransportError::MissingCredentials { .. }
        | TransportError::NoEndpoints => FailureClass::Permanent,
    }
}

/// Map a `reqwest` failure onto [`TransportError`].
pub(crate) fn convert_reqwest_error(
    error: &reqwest::Error,
    url: &str,
    timeout: Duration,
) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout {
            url: url.to_owned(),
            timeout_secs: timeout.as_secs(),
        };
    }

    if let Some(status) = error.status() {
        return TransportError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    if error.is_decode() {
        return TransportError::Decode {
            url: url.to_owned(),
            message: error.to_string(),
        };
    }

    TransportError::Network {
        url: url.to_owned(),
        message: error.to_string(),
    }
}

/// Errors raised while constructing an HTTP adapter.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// A configured URL did not parse.
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
}

pub(crate) fn parse_url(raw: &str) -> Result<url::Url, ClientBuildError> {
    url::Url::parse(raw).map_err(|source| ClientBuildError::InvalidUrl {
        url: raw.to_owned(),
        source,
    })
}
