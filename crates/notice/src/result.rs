//! Raw (unprocessed) check results and the accounting carried alongside them.

use crate::Notice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Bookkeeping about what a check actually looked at.
///
/// Passed through notice processing unchanged (apart from de-duplicating
/// [`checked_filenames`](Self::checked_filenames)).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accounting {
    pub checked_file_count: usize,
    pub checked_filenames: Vec<String>,
    pub checked_filename_extensions: BTreeSet<String>,
    pub checked_repo_names: BTreeSet<String>,
    /// Sum of the sizes (in bytes) of every checked file.
    pub checked_filesizes: u64,
    pub elapsed_seconds: f64,
}

impl Accounting {
    /// Record one checked file.
    pub fn record_file(&mut self, repo_name: &str, filename: &str, size: usize) {
        self.checked_file_count += 1;
        self.checked_filenames.push(filename.to_string());
        if let Some((_, extension)) = filename.rsplit_once('.') {
            self.checked_filename_extensions.insert(extension.to_string());
        }
        self.checked_repo_names.insert(repo_name.to_string());
        self.checked_filesizes += size as u64;
    }

    /// Fold another set of accounting into this one. Elapsed time is not
    /// summed: the outermost caller measures its own wall-clock time.
    pub fn absorb(&mut self, other: Accounting) {
        self.checked_file_count += other.checked_file_count;
        self.checked_filenames.extend(other.checked_filenames);
        self.checked_filename_extensions.extend(other.checked_filename_extensions);
        self.checked_repo_names.extend(other.checked_repo_names);
        self.checked_filesizes += other.checked_filesizes;
    }
}

/// Successes and notices as produced by checkers and orchestration, before
/// any filtering, suppression or classification.
///
/// Only ever appended to. `notice_list` may contain exact duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCheckResult {
    pub success_list: Vec<String>,
    pub notice_list: Vec<Notice>,
    /// Label of the check that produced this result (e.g. `"TN TSV file"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_type: Option<String>,
    #[serde(flatten)]
    pub accounting: Accounting,
}

impl RawCheckResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check_type(mut self, check_type: impl Into<String>) -> Self {
        self.check_type = Some(check_type.into());
        self
    }

    pub fn add_success(&mut self, message: impl Into<String>) {
        self.success_list.push(message.into());
    }

    pub fn add_notice(&mut self, notice: Notice) {
        self.notice_list.push(notice);
    }

    /// Convenience constructor for the "something fatal happened, here's why"
    /// result that orchestration returns early with.
    pub fn single(notice: Notice) -> Self {
        Self { notice_list: vec![notice], ..Self::default() }
    }
}
