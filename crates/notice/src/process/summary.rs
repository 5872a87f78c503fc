//! Collapsing long runs of "Checked … file: …" success messages.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Repo codes whose per-book success messages are grouped by code.
const GROUPED_REPO_CODES: &[&str] = &["UHB", "UGNT", "LT", "ST", "TN", "TN2", "TQ2", "TWL", "SN", "SQ"];

/// Ordered: the first matching group wins.
static GROUPS: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    let mut groups: Vec<(&str, String)> =
        GROUPED_REPO_CODES.iter().map(|code| (*code, format!(r"^Checked {code} file: (?P<item>.+)$"))).collect();
    groups.push(("USFM Bible", r"^Checked \w+ file: \d\d-(?P<item>\w\w\w)\.usfm$".to_string()));
    groups.push(("TSV notes", r"^Checked \w+ file: .*\d\d-(?P<item>\w\w\w)\.tsv$".to_string()));
    groups.push(("manifest", r"^Checked (?P<item>[\w\-]+) manifest file$".to_string()));
    groups.push(("README", r"^Checked (?P<item>[\w\-]+) README file$".to_string()));
    groups.push(("LICENSE", r"^Checked (?P<item>[\w\-]+) LICENSE file$".to_string()));
    groups
        .into_iter()
        // Patterns are static and known-good; a bad one is dropped rather than panicking.
        .filter_map(|(label, pattern)| Regex::new(&pattern).ok().map(|re| (re, label.to_string())))
        .collect()
});

enum Slot {
    Plain(String),
    Group(usize),
}

struct Group {
    first_message: String,
    items: Vec<String>,
}

fn classify(message: &str) -> Option<(usize, String)> {
    GROUPS.iter().enumerate().find_map(|(index, (re, _label))| {
        re.captures(message).and_then(|caps| caps.name("item")).map(|item| (index, item.as_str().to_string()))
    })
}

/// Collapse recognised success messages into one summary per group.
///
/// A group with two or more members becomes `Checked N {label} files: a, b`;
/// a group with a single member keeps its original message. Each summary
/// occupies the position of its group's first member, and unrecognised
/// messages are left untouched and in place.
pub(crate) fn summarize(success_list: Vec<String>) -> Vec<String> {
    let mut slots = Vec::with_capacity(success_list.len());
    let mut groups: HashMap<usize, Group> = HashMap::new();
    for message in success_list {
        match classify(&message) {
            Some((index, item)) => {
                let group = groups.entry(index).or_insert_with(|| {
                    slots.push(Slot::Group(index));
                    Group { first_message: message.clone(), items: Vec::new() }
                });
                group.items.push(item);
            },
            None => slots.push(Slot::Plain(message)),
        }
    }
    slots
        .into_iter()
        .filter_map(|slot| match slot {
            Slot::Plain(message) => Some(message),
            Slot::Group(index) => groups.remove(&index).map(|group| {
                if group.items.len() == 1 {
                    group.first_message
                } else {
                    let label = &GROUPS[index].1;
                    format!("Checked {} {label} files: {}", group.items.len(), group.items.join(", "))
                }
            }),
        })
        .collect()
}
