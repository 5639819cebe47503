//! Input validation for address batches.
//!
//! A batch is checked as a whole before any network activity: one bad
//! entry rejects everything.

use thiserror::Error;

/// Largest batch accepted by default.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 20;

/// Reasons a batch of addresses is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// No addresses were supplied.
    #[error("at least one address is required")]
    Empty,
    /// More addresses than the configured maximum.
    #[error("{count} addresses supplied; at most {max} are accepted per batch")]
    TooMany {
        /// Number of addresses supplied.
        count: usize,
        /// Configured maximum.
        max: usize,
    },
    /// An address was empty or whitespace only.
    #[error("address at position {index} is blank")]
    BlankAddress {
        /// Zero-based position of the offending entry.
        index: usize,
    },
}

/// Check that `addresses` is non-empty, holds at most `max` entries and
/// contains no blank entries.
///
/// # Errors
///
/// Returns the first [`BatchError`] found, checking size before contents.
///
/// # Examples
///
/// ```
/// use livability_core::{BatchError, validate_batch};
///
/// assert!(validate_batch(&["Wenceslas Square, Prague"], 20).is_ok());
/// assert_eq!(
///     validate_batch(&["Wenceslas Square, Prague", ""], 20),
///     Err(BatchError::BlankAddress { index: 1 }),
/// );
/// ```
pub fn validate_batch<S: AsRef<str>>(addresses: &[S], max: usize) -> Result<(), BatchError> {
    if addresses.is_empty() {
        return Err(BatchError::Empty);
    }
    if addresses.len() > max {
        return Err(BatchError::TooMany {
            count: addresses.len(),
            max,
        });
    }
    addresses
        .iter()
        .position(|address| address.as_ref().trim().is_empty())
        .map_or(Ok(()), |index| Err(BatchError::BlankAddress { index }))
}
