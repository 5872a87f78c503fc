//! Options controlling how a raw notice list is filtered, suppressed and
//! classified.

use crate::error::{ErrorKind, Result};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_CUTOFF_PRIORITY_LEVEL: u16 = 0;
pub const DEFAULT_MAXIMUM_SIMILAR_MESSAGES: usize = 3;
pub const DEFAULT_ERROR_PRIORITY_LEVEL: u16 = 700;
pub const DEFAULT_SEVERE_PRIORITY_LEVEL: u16 = 800;
pub const DEFAULT_MEDIUM_PRIORITY_LEVEL: u16 = 600;
/// Success lists shorter than this are never summarized.
pub const SUMMARY_MINIMUM_LENGTH: usize = 5;

const MAXIMUM_PRIORITY: u16 = 999;

/// Output ordering of the surviving notices.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    /// Preserve the order the notices were produced in.
    AsFound,
    /// Stable sort, highest priority first.
    ByPriority,
}

impl FromStr for SortBy {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AsFound" => Ok(Self::AsFound),
            "ByPriority" => Ok(Self::ByPriority),
            other => exn::bail!(ErrorKind::UnknownSortOrder(other.to_string())),
        }
    }
}

/// # Notes
/// - `error_priority_level` applies only to the two-way (errors/warnings)
///   classification; `severe_priority_level` and `medium_priority_level`
///   apply only to the three-way classification.
/// - When `show_disabled_notices` is `false` (the default) notices matching a
///   [`DisableRule`](crate::DisableRule) are dropped and counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessingOptions {
    pub cutoff_priority_level: u16,
    /// Zero disables suppression entirely.
    pub maximum_similar_messages: usize,
    /// `None` uses the default for the classification mode.
    pub sort_by: Option<SortBy>,
    #[serde(alias = "ignorePriorityNumberList")]
    pub ignore_priority_numbers: Vec<u16>,
    pub error_priority_level: u16,
    pub severe_priority_level: u16,
    pub medium_priority_level: u16,
    pub show_disabled_notices: bool,
    pub summarize_success_list: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            cutoff_priority_level: DEFAULT_CUTOFF_PRIORITY_LEVEL,
            maximum_similar_messages: DEFAULT_MAXIMUM_SIMILAR_MESSAGES,
            sort_by: None,
            ignore_priority_numbers: Vec::new(),
            error_priority_level: DEFAULT_ERROR_PRIORITY_LEVEL,
            severe_priority_level: DEFAULT_SEVERE_PRIORITY_LEVEL,
            medium_priority_level: DEFAULT_MEDIUM_PRIORITY_LEVEL,
            show_disabled_notices: false,
            summarize_success_list: true,
        }
    }
}

impl ProcessingOptions {
    /// Reject option combinations that cannot be meaningfully applied.
    pub fn validate(&self) -> Result<()> {
        for (name, level) in [
            ("cutoffPriorityLevel", self.cutoff_priority_level),
            ("errorPriorityLevel", self.error_priority_level),
            ("severePriorityLevel", self.severe_priority_level),
            ("mediumPriorityLevel", self.medium_priority_level),
        ] {
            if level > MAXIMUM_PRIORITY {
                exn::bail!(ErrorKind::InvalidOption(format!("{name} must not exceed {MAXIMUM_PRIORITY} (got {level})")));
            }
        }
        if self.medium_priority_level > self.severe_priority_level {
            exn::bail!(ErrorKind::InvalidOption(format!(
                "mediumPriorityLevel ({}) must not exceed severePriorityLevel ({})",
                self.medium_priority_level, self.severe_priority_level
            )));
        }
        Ok(())
    }
}
