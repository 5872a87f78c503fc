use crate::books::{CatalogHandle, StandardBooks};
use crate::checker::{CheckContext, Checkers};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::sync::Arc;
use tcv_fetch::Retriever;
use tcv_notice::{Notice, RawCheckResult};

pub(crate) const MISSING_REPO: &str = "Repository doesn’t exist";

pub(crate) fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        exn::bail!(ErrorKind::InvalidArgument(format!("{name} must not be empty")));
    }
    Ok(())
}

/// Everything a check needs: cached retrieval, the book catalog, and the
/// content checkers to dispatch to.
///
/// Book packages, repository sweeps and preloading are methods on this.
#[derive(Clone)]
pub struct Engine {
    pub(crate) retriever: Retriever,
    pub(crate) books: CatalogHandle,
    pub(crate) checkers: Checkers,
}

impl Engine {
    pub fn new(retriever: Retriever, checkers: Checkers) -> Self {
        Self { retriever, books: Arc::new(StandardBooks), checkers }
    }

    pub fn with_books(mut self, books: CatalogHandle) -> Self {
        self.books = books;
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn books(&self) -> &CatalogHandle {
        &self.books
    }

    pub fn checkers(&self) -> &Checkers {
        &self.checkers
    }

    /// Notice for a file that could not be loaded: 997 if the whole
    /// repository is missing, otherwise `priority` with the remembered
    /// failure reason (or `details`, if given) attached.
    pub(crate) async fn load_failure(
        &self,
        context: &CheckContext,
        priority: u16,
        message: &str,
        filename: &str,
        details: Option<String>,
    ) -> Result<Notice> {
        let mut notice = if self.retriever.repository_exists(&context.owner, &context.repo_name).await {
            let details = match details {
                Some(details) => Some(details),
                None => self
                    .retriever
                    .last_failure(&context.owner, &context.repo_name, filename, &context.git_ref)
                    .await
                    .or_raise(|| ErrorKind::Retrieval)?,
            };
            let notice = Notice::new(priority, message).with_filename(filename);
            match details {
                Some(details) => notice.with_details(details),
                None => notice,
            }
        } else {
            Notice::new(997, MISSING_REPO)
        };
        notice.repo_name = Some(context.repo_name.clone());
        notice.owner = Some(context.owner.clone());
        notice.git_ref = Some(context.git_ref.clone());
        notice.repo_code = context.repo_code.map(|code| code.to_string());
        notice.book_id = context.book_id.clone();
        notice.c = context.c.clone();
        notice.v = context.v.clone();
        Ok(notice)
    }
}

/// Fold a checker's findings for `filename` into `result`.
///
/// Notices that already carry `extra` came from a linked resource and keep
/// their own attribution. Everything else is tagged with where it came from.
pub(crate) fn merge(result: &mut RawCheckResult, checked: RawCheckResult, context: &CheckContext, filename: &str, extra: &str) {
    result.success_list.extend(checked.success_list);
    if result.check_type.is_none() {
        result.check_type = checked.check_type;
    }
    for mut notice in checked.notice_list {
        if notice.extra.is_none() {
            if let Some(code) = context.repo_code {
                notice.repo_code = Some(code.to_string());
            }
            notice.repo_name = Some(context.repo_name.clone());
            notice.owner = Some(context.owner.clone());
            notice.git_ref = Some(context.git_ref.clone());
            notice.filename.get_or_insert_with(|| filename.to_string());
            if notice.book_id.is_none() {
                notice.book_id = context.book_id.clone();
            }
            if notice.c.is_none() && notice.v.is_none() {
                notice.c = context.c.clone();
                notice.v = context.v.clone();
            }
            notice.extra = Some(extra.to_string());
        }
        result.add_notice(notice);
    }
    result.accounting.absorb(checked.accounting);
}
