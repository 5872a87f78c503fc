//! The content checker contract, and dispatch by file kind.
//!
//! Format-specific checkers (USFM, TSV, markdown, …) live outside this
//! crate. They are registered in [`Checkers`] against the [`FileKind`] they
//! understand; orchestration hands them file text and merges what they find.

use crate::error::{ErrorKind, Result};
use crate::options::CheckOptions;
use crate::repos::RepoCode;
use async_trait::async_trait;
use exn::ResultExt;
use std::collections::HashMap;
use std::sync::Arc;
use tcv_notice::{Notice, RawCheckResult};

/// What kind of content a file holds, judged by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Tsv,
    Usfm,
    Markdown,
    PlainText,
    Manifest,
    Yaml,
}

impl FileKind {
    /// `None` if the extension is not recognized.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let name = filename.rsplit('/').next().unwrap_or(filename).to_lowercase();
        if name == "manifest.yaml" {
            return Some(Self::Manifest);
        }
        let (_, extension) = name.rsplit_once('.')?;
        match extension {
            "tsv" => Some(Self::Tsv),
            "usfm" | "sfm" => Some(Self::Usfm),
            "md" => Some(Self::Markdown),
            "txt" => Some(Self::PlainText),
            "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Where the content being checked came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckContext {
    pub owner: String,
    pub language_code: String,
    pub repo_name: String,
    pub repo_code: Option<RepoCode>,
    pub git_ref: String,
    pub book_id: Option<String>,
    pub c: Option<String>,
    pub v: Option<String>,
}

impl CheckContext {
    pub fn new(
        owner: impl Into<String>,
        language_code: impl Into<String>,
        repo_name: impl Into<String>,
        git_ref: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            language_code: language_code.into(),
            repo_name: repo_name.into(),
            repo_code: None,
            git_ref: git_ref.into(),
            book_id: None,
            c: None,
            v: None,
        }
    }

    pub fn with_repo_code(mut self, repo_code: RepoCode) -> Self {
        self.repo_code = Some(repo_code);
        self
    }

    pub fn with_book_id(mut self, book_id: impl Into<String>) -> Self {
        self.book_id = Some(book_id.into());
        self
    }

    pub fn with_reference(mut self, c: impl Into<String>, v: impl Into<String>) -> Self {
        self.c = Some(c.into());
        self.v = Some(v.into());
        self
    }
}

/// A format-specific content checker.
#[async_trait]
pub trait ContentChecker {
    /// Check `content` (the text of `filename`). `location` is a human
    /// readable suffix such as `" in en_ult"` for notices that want one.
    ///
    /// Findings are notices; an `Err` means the checker could not run at all.
    async fn check(
        &self,
        context: &CheckContext,
        filename: &str,
        content: &str,
        location: &str,
        options: &CheckOptions,
    ) -> Result<RawCheckResult>;
}

pub type CheckerHandle = Arc<dyn ContentChecker + Send + Sync>;

/// Registry of content checkers keyed by [`FileKind`].
#[derive(Clone, Default)]
pub struct Checkers {
    registered: HashMap<FileKind, CheckerHandle>,
}

impl Checkers {
    pub fn with(mut self, kind: FileKind, checker: CheckerHandle) -> Self {
        self.register(kind, checker);
        self
    }

    pub fn register(&mut self, kind: FileKind, checker: CheckerHandle) {
        self.registered.insert(kind, checker);
    }

    pub fn get(&self, kind: FileKind) -> Option<&CheckerHandle> {
        self.registered.get(&kind)
    }

    /// Run the checker registered for `filename`'s kind.
    ///
    /// Unrecognized extensions are checked as plain text, with a notice
    /// saying so. A kind without a registered checker yields no findings.
    pub async fn check_file(
        &self,
        context: &CheckContext,
        filename: &str,
        content: &str,
        location: &str,
        options: &CheckOptions,
    ) -> Result<RawCheckResult> {
        let mut result = RawCheckResult::new();
        let kind = match FileKind::from_filename(filename) {
            Some(kind) => kind,
            None => {
                result.add_notice(
                    Notice::new(995, "File extension is not recognized, so treated as plain text.")
                        .with_filename(filename)
                        .with_location(location),
                );
                FileKind::PlainText
            },
        };
        let Some(checker) = self.get(kind) else {
            tracing::warn!(filename, kind = ?kind, "No content checker registered");
            return Ok(result);
        };
        let checked = checker
            .check(context, filename, content, location, options)
            .await
            .or_raise(|| ErrorKind::Checker(filename.to_string()))?;
        result.success_list.extend(checked.success_list);
        result.notice_list.extend(checked.notice_list);
        result.check_type = checked.check_type;
        result.accounting.absorb(checked.accounting);
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! A content checker for orchestration tests.

    use super::*;
    use std::sync::Mutex;

    /// Flags every line containing `BAD` with a 500 notice, and fails on
    /// content containing `EXPLODE`. Remembers what it was asked to check.
    #[derive(Default)]
    pub(crate) struct StubChecker {
        pub(crate) seen: Mutex<Vec<(CheckContext, String)>>,
    }

    impl StubChecker {
        pub(crate) fn filenames(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|(_, filename)| filename.clone()).collect()
        }

        pub(crate) fn contexts(&self) -> Vec<CheckContext> {
            self.seen.lock().unwrap().iter().map(|(context, _)| context.clone()).collect()
        }
    }

    #[async_trait]
    impl ContentChecker for StubChecker {
        async fn check(
            &self,
            context: &CheckContext,
            filename: &str,
            content: &str,
            location: &str,
            _options: &CheckOptions,
        ) -> Result<RawCheckResult> {
            self.seen.lock().unwrap().push((context.clone(), filename.to_string()));
            if content.contains("EXPLODE") {
                exn::bail!(ErrorKind::InvalidArgument(format!("cannot check {filename}")));
            }
            let mut result = RawCheckResult::new();
            for (index, line) in content.lines().enumerate() {
                if line.contains("BAD") {
                    result.add_notice(
                        Notice::new(500, "Bad line")
                            .with_line_number(index as u32 + 1)
                            .with_excerpt(line)
                            .with_location(location),
                    );
                }
                if line.contains("LINKED") {
                    result.add_notice(Notice::new(450, "Broken link").with_extra("TW"));
                }
            }
            Ok(result)
        }
    }

    /// Every file kind checked by one shared stub.
    pub(crate) fn checkers(stub: Arc<StubChecker>) -> Checkers {
        [FileKind::Tsv, FileKind::Usfm, FileKind::Markdown, FileKind::PlainText, FileKind::Manifest, FileKind::Yaml]
            .into_iter()
            .fold(Checkers::default(), |checkers, kind| checkers.with(kind, stub.clone()))
    }
}
