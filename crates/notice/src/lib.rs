//! Notices and the pipeline that turns thousands of raw findings into a
//! bounded, human-usable result.
//!
//! Checkers and orchestration produce a [`RawCheckResult`]: an append-only
//! list of success messages and [`Notice`]s. One of the `process_*` functions
//! then filters, de-duplicates, suppresses, orders and classifies it into a
//! [`ProcessedResult`].

pub mod consistency;
pub mod disabled;
pub mod error;
mod notice;
mod options;
mod process;
mod result;

pub use crate::disabled::{DISABLED_NOTICES, DisableRule};
pub use crate::notice::Notice;
pub use crate::options::{ProcessingOptions, SortBy};
pub use crate::process::{
    Classified, ProcessedResult, process_notices_to_errors_warnings, process_notices_to_errors_warnings_with_rules,
    process_notices_to_severe_medium_low, process_notices_to_severe_medium_low_with_rules,
    process_notices_to_single_list, process_notices_to_single_list_with_rules,
};
pub use crate::result::{Accounting, RawCheckResult};
