//! Retrieval of repository files from a remote content host, through the
//! layered caches of [`tcv_store::Stores`].

mod archive;
pub mod error;
pub mod host;
mod retriever;

pub use crate::host::{DEFAULT_BASE_URL, Door43Host, HostSettings, RemoteHost};
#[cfg(any(test, feature = "mock"))]
pub use crate::host::{HostCalls, MockHost};
pub use crate::retriever::Retriever;
use std::sync::Arc;

pub type HostHandle = Arc<dyn RemoteHost + Send + Sync>;
