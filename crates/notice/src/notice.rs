//! A single finding reported by a content checker or by orchestration.

use serde::{Deserialize, Serialize};

/// One finding (error, warning or informational) with optional location context.
///
/// Priorities run from 1 to 999. By convention, 900 and above are system or
/// parameter problems (e.g. a missing repository), and anything lower is a
/// content problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub priority: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "username")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "branch")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "bookID")]
    pub book_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "C")]
    pub c: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "V")]
    pub v: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "rowID")]
    pub row_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Short context tag (usually a repo code) that gets folded into the
    /// message during aggregation and then removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl Notice {
    pub fn new(priority: u16, message: impl Into<String>) -> Self {
        Self { priority, message: message.into(), ..Self::default() }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_repo_code(mut self, repo_code: impl Into<String>) -> Self {
        self.repo_code = Some(repo_code.into());
        self
    }

    pub fn with_repo_name(mut self, repo_name: impl Into<String>) -> Self {
        self.repo_name = Some(repo_name.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_book_id(mut self, book_id: impl Into<String>) -> Self {
        self.book_id = Some(book_id.into());
        self
    }

    /// Attach a chapter/verse reference. Either may be a bridge such as `"22-23"`.
    pub fn with_reference(mut self, c: impl Into<String>, v: impl Into<String>) -> Self {
        self.c = Some(c.into());
        self.v = Some(v.into());
        self
    }

    pub fn with_line_number(mut self, line_number: u32) -> Self {
        self.line_number = Some(line_number);
        self
    }

    pub fn with_character_index(mut self, character_index: usize) -> Self {
        self.character_index = Some(character_index);
        self
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// The identity used when counting and suppressing similar notices.
    pub(crate) fn similarity_key(&self) -> (u16, &str) {
        (self.priority, self.message.as_str())
    }
}
