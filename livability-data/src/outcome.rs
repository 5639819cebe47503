//! Result of one POI provider fetch.

use crate::TransportError;

/// What a POI provider produced for one coordinate.
///
/// Providers never fail outright. A failed upstream call becomes
/// [`ProviderOutcome::Fallback`], which keeps the error for logging and
/// reads as an empty fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome<F> {
    /// Fetched from upstream and cached.
    Fresh(F),
    /// Served from the provider cache.
    Cached(F),
    /// Upstream failed; the fragment is empty.
    Fallback {
        /// The swallowed error.
        reason: TransportError,
    },
}

impl<F: Default> ProviderOutcome<F> {
    /// The fragment, or an empty one after a fallback.
    #[must_use]
    pub fn into_fragment(self) -> F {
        match self {
            Self::Fresh(fragment) | Self::Cached(fragment) => fragment,
            Self::Fallback { .. } => F::default(),
        }
    }
}

impl<F> ProviderOutcome<F> {
    /// Borrow the fragment if upstream or the cache supplied one.
    #[must_use]
    pub const fn fragment(&self) -> Option<&F> {
        match self {
            Self::Fresh(fragment) | Self::Cached(fragment) => Some(fragment),
            Self::Fallback { .. } => None,
        }
    }

    /// The swallowed error, if this is a fallback.
    #[must_use]
    pub const fn fallback_reason(&self) -> Option<&TransportError> {
        match self {
            Self::Fallback { reason } => Some(reason),
            Self::Fresh(_) | Self::Cached(_) => None,
        }
    }

    /// Whether the fragment came from the cache.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livability_core::TagQueryFragment;
    use rstest::rstest;

    #[rstest]
    fn fallback_reads_as_empty() {
        let outcome: ProviderOutcome<TagQueryFragment> = ProviderOutcome::Fallback {
            reason: TransportError::NoEndpoints,
        };
        assert_eq!(outcome.fallback_reason(), Some(&TransportError::NoEndpoints));
        assert!(outcome.fragment().is_none());
        assert!(outcome.into_fragment().is_empty());
    }
}
