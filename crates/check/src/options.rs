use crate::books::Testament;
use crate::repos::DatasetMode;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REF: &str = "master";
pub const DEFAULT_ORIGINAL_LANGUAGE_THRESHOLD: usize = 4;

/// Options steering book-package and repository checks.
///
/// Also handed to every [`ContentChecker`](crate::ContentChecker), which may
/// read whatever applies to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckOptions {
    pub dataset: DatasetMode,
    /// Owner of the original-language repositories (UHB, UGNT), when it
    /// differs from the owner being checked.
    pub original_language_owner: Option<String>,
    pub check_manifest: bool,
    pub check_readme: bool,
    pub check_license: bool,
    /// Skip everything that fetches files beyond the book files themselves.
    pub disable_all_link_fetching: bool,
    /// Repository sweeps skip books belonging to this testament.
    pub skip_testament: Option<Testament>,
    /// Preloading more books than this also fetches the original-language
    /// archives.
    pub original_language_threshold: usize,
    pub default_ref: String,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            dataset: DatasetMode::default(),
            original_language_owner: None,
            check_manifest: false,
            check_readme: false,
            check_license: false,
            disable_all_link_fetching: false,
            skip_testament: None,
            original_language_threshold: DEFAULT_ORIGINAL_LANGUAGE_THRESHOLD,
            default_ref: DEFAULT_REF.to_string(),
        }
    }
}

impl CheckOptions {
    /// Owner to fetch `code`'s repository from.
    pub(crate) fn owner_for<'a>(&'a self, code: crate::RepoCode, owner: &'a str) -> &'a str {
        match &self.original_language_owner {
            Some(original) if code.is_original_language() => original,
            _ => owner,
        }
    }
}
