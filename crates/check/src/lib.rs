//! Multi-repository check orchestration.
//!
//! An [`Engine`] checks a book across its whole book package
//! ([`Engine::check_book_package`]), sweeps every file of a single
//! repository ([`Engine::check_repo`]), or warms the archive cache ahead of
//! either ([`Engine::preload`]). Files are handed to the registered
//! [`ContentChecker`]s and their findings merged into one
//! [`RawCheckResult`](tcv_notice::RawCheckResult), ready for the
//! `tcv_notice::process_*` functions.

mod books;
mod checker;
mod engine;
pub mod error;
mod options;
mod package;
mod preload;
mod progress;
mod repos;
mod sweep;

pub use crate::books::{BookCatalog, CatalogHandle, StandardBooks, Testament};
pub use crate::checker::{CheckContext, CheckerHandle, Checkers, ContentChecker, FileKind};
pub use crate::engine::Engine;
pub use crate::options::{CheckOptions, DEFAULT_ORIGINAL_LANGUAGE_THRESHOLD, DEFAULT_REF};
pub use crate::progress::Progress;
pub use crate::repos::{DatasetMode, NEW_FORMAT_REF, RepoCode};
