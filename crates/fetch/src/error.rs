//! Retrieval Error Types
//!
//! Missing remote content is not an error for [`Retriever`](crate::Retriever)
//! callers: it becomes `None` (and a memoized failure message). These kinds
//! surface from [`RemoteHost`](crate::RemoteHost) implementations, from
//! malformed arguments, and from the cache stores.

use derive_more::{Display, Error};

/// A retrieval error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] String),
    #[display("cache store error")]
    Store,
    #[display("network error")]
    Network,
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    #[display("unexpected HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    #[display("invalid response data: {_0}")]
    InvalidData(#[error(not(source))] String),
    #[display("unreadable archive")]
    Archive,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network | Self::Store => true,
            Self::Status(code) => *code >= 500 || *code == 429,
            _ => false,
        }
    }
}
