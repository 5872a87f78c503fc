//! Check Orchestration Error Types
//!
//! Missing repositories and files are reported as notices, never as errors.
//! What remains is caller mistakes and infrastructure failures.

use derive_more::{Display, Error};

/// An orchestration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for orchestration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Empty owner/language, unknown repo code, and similar caller mistakes.
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] String),
    /// The retrieval layer failed (cache store I/O).
    #[display("retrieval failed")]
    Retrieval,
    /// A content checker rejected its arguments.
    #[display("content checker failed on {_0}")]
    Checker(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retrieval)
    }
}
