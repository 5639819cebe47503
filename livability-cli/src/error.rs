//! Error types emitted by the livability CLI.
//!
//! Keep this error type reasonably small, as every CLI helper returns
//! `Result<_, CliError>`.

use std::path::PathBuf;
use std::sync::Arc;

use livability_core::{BatchError, SearchRadiusError};
use livability_data::ClientBuildError;
use thiserror::Error;

/// Errors emitted by the livability CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The search radius was zero.
    #[error(transparent)]
    InvalidRadius(#[from] SearchRadiusError),
    /// Reading the addresses file failed.
    #[error("failed to read addresses from {path:?}: {source}")]
    ReadAddresses {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Constructing an upstream HTTP adapter failed.
    #[error("failed to build {service} client: {source}")]
    BuildClient {
        service: &'static str,
        #[source]
        source: ClientBuildError,
    },
    /// Starting the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The address batch was rejected before any lookup.
    #[error("invalid batch: {0}")]
    InvalidBatch(#[from] BatchError),
    /// Serialising the results failed.
    #[error("failed to serialise results: {0}")]
    SerialiseReport(#[source] serde_json::Error),
    /// Writing the results failed.
    #[error("failed to write results: {0}")]
    WriteReport(#[source] std::io::Error),
}
