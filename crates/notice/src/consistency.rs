//! Development-time audit of notice shape and priority/message consistency.
//!
//! Nothing here halts processing. Findings are returned so that test suites
//! can fail hard on them, and logged at error level by the processing
//! functions in debug builds.

use crate::Notice;
use derive_more::Display;
use std::collections::HashMap;

/// Message prefixes that legitimately embed variable text after them, so the
/// same priority may appear with many distinct message strings.
const VARIABLE_MESSAGE_PREFIXES: &[&str] = &[
    "Mismatched ",
    "Unexpected doubled ",
    "Unexpected space after ",
    "Unexpected content after \\",
    "USFMGrammar: ",
    "Bad punctuation nesting: ",
    "At end of text with unclosed ",
    "Possible mismatched ",
];

/// As [`VARIABLE_MESSAGE_PREFIXES`], but for variable text before a fixed tail.
const VARIABLE_MESSAGE_SUFFIXES: &[&str] = &[
    " character combination",
    " character after space",
    " character at start of line",
    " character at end of line",
    " marker at start of line",
    " closing character (no matching opener)",
    " closing character doesn’t match",
];

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    #[display("priority {_0} is outside 1..=999 (message: {_1:?})")]
    PriorityOutOfRange(u16, String),
    #[display("notice with priority {_0} has an empty message")]
    EmptyMessage(u16),
    #[display("line numbers start at 1 (message: {_0:?})")]
    ZeroLineNumber(String),
    #[display("filename {_0:?} looks like a path or a location")]
    MalformedFilename(String),
    #[display("priority {priority} is used for both {first:?} and {second:?}")]
    DuplicatePriority { priority: u16, first: String, second: String },
}

fn has_variable_text(message: &str) -> bool {
    VARIABLE_MESSAGE_PREFIXES.iter().any(|prefix| message.starts_with(prefix))
        || VARIABLE_MESSAGE_SUFFIXES.iter().any(|suffix| message.ends_with(suffix))
}

/// Check every notice for shape problems and every priority for being mapped
/// to more than one fixed message text.
pub fn audit(notices: &[Notice]) -> Vec<Inconsistency> {
    let mut found = Vec::new();
    let mut messages_by_priority: HashMap<u16, &str> = HashMap::new();
    for notice in notices {
        if notice.priority == 0 || notice.priority > 999 {
            found.push(Inconsistency::PriorityOutOfRange(notice.priority, notice.message.clone()));
        }
        if notice.message.trim().is_empty() {
            found.push(Inconsistency::EmptyMessage(notice.priority));
        }
        if notice.line_number == Some(0) {
            found.push(Inconsistency::ZeroLineNumber(notice.message.clone()));
        }
        if let Some(filename) = &notice.filename
            && (filename.contains(':') || filename.contains('\\'))
        {
            found.push(Inconsistency::MalformedFilename(filename.clone()));
        }
        if has_variable_text(&notice.message) {
            continue;
        }
        match messages_by_priority.get(&notice.priority) {
            None => {
                messages_by_priority.insert(notice.priority, &notice.message);
            },
            Some(first) if *first != notice.message => found.push(Inconsistency::DuplicatePriority {
                priority: notice.priority,
                first: first.to_string(),
                second: notice.message.clone(),
            }),
            Some(_) => {},
        }
    }
    found
}

/// Run [`audit`] and log every finding. Only does work in debug builds.
pub(crate) fn log_inconsistencies(notices: &[Notice]) {
    if !cfg!(debug_assertions) {
        return;
    }
    for inconsistency in audit(notices) {
        tracing::error!(%inconsistency, "Programmer invariant violated by notice list");
    }
}
