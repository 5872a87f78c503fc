//! Notice Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A notice processing error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for notice processing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Only caller mistakes are errors here: content problems are always reported
/// as [`Notice`](crate::Notice)s instead.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A processing option is out of range or contradicts another option.
    #[display("invalid processing option: {_0}")]
    InvalidOption(#[error(not(source))] String),
    /// A sort order other than `AsFound` or `ByPriority` was requested.
    #[display("unknown sort order: {_0}")]
    UnknownSortOrder(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::UnknownSortOrder("ByColour".to_string()).to_string(), "unknown sort order: ByColour");
        assert_eq!(
            ErrorKind::InvalidOption("cutoff".to_string()).to_string(),
            "invalid processing option: cutoff"
        );
    }

    #[test]
    fn error_kind_never_retryable() {
        assert!(!ErrorKind::UnknownSortOrder(String::new()).is_retryable());
    }
}
