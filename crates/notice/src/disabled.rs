//! Rules for silencing specific, known-acceptable notices.
//!
//! Only recommended for relatively stable resources (e.g. completed book
//! packages), since rules usually pin details like filename and line number.

use crate::Notice;
use std::borrow::Cow;

type Text = Option<Cow<'static, str>>;

/// A partial [`Notice`]: every field that is set must equal the corresponding
/// field of a candidate notice for the rule to match. Unset fields are
/// wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisableRule {
    pub priority: Option<u16>,
    pub message: Text,
    pub details: Text,
    pub repo_code: Text,
    pub owner: Text,
    pub repo_name: Text,
    pub git_ref: Text,
    pub filename: Text,
    pub book_id: Text,
    pub c: Text,
    pub v: Text,
    pub row_id: Text,
    pub field_name: Text,
    pub line_number: Option<u32>,
    pub character_index: Option<usize>,
    pub excerpt: Text,
    pub location: Text,
}

fn text_matches(rule: &Text, candidate: &Option<String>) -> bool {
    match rule {
        None => true,
        Some(expected) => candidate.as_deref() == Some(expected.as_ref()),
    }
}

fn value_matches<T: PartialEq>(rule: &Option<T>, candidate: &Option<T>) -> bool {
    match rule {
        None => true,
        Some(expected) => candidate.as_ref() == Some(expected),
    }
}

impl DisableRule {
    /// Matches every notice. Useful as the base for struct-update syntax.
    pub const ANY: Self = Self {
        priority: None,
        message: None,
        details: None,
        repo_code: None,
        owner: None,
        repo_name: None,
        git_ref: None,
        filename: None,
        book_id: None,
        c: None,
        v: None,
        row_id: None,
        field_name: None,
        line_number: None,
        character_index: None,
        excerpt: None,
        location: None,
    };

    pub fn matches(&self, notice: &Notice) -> bool {
        value_matches(&self.priority, &Some(notice.priority))
            && self.message.as_ref().is_none_or(|m| m.as_ref() == notice.message)
            && text_matches(&self.details, &notice.details)
            && text_matches(&self.repo_code, &notice.repo_code)
            && text_matches(&self.owner, &notice.owner)
            && text_matches(&self.repo_name, &notice.repo_name)
            && text_matches(&self.git_ref, &notice.git_ref)
            && text_matches(&self.filename, &notice.filename)
            && text_matches(&self.book_id, &notice.book_id)
            && text_matches(&self.c, &notice.c)
            && text_matches(&self.v, &notice.v)
            && text_matches(&self.row_id, &notice.row_id)
            && text_matches(&self.field_name, &notice.field_name)
            && value_matches(&self.line_number, &notice.line_number)
            && value_matches(&self.character_index, &notice.character_index)
            && text_matches(&self.excerpt, &notice.excerpt)
            && text_matches(&self.location, &notice.location)
    }
}

const fn text(s: &'static str) -> Text {
    Some(Cow::Borrowed(s))
}

const QUOTEMARKS_ARTICLE: Text = text("translate/figs-quotemarks/01.md");

/// The built-in rules. The quote-marks article deliberately demonstrates
/// spacing around punctuation that would otherwise be flagged.
pub static DISABLED_NOTICES: &[DisableRule] = &[
    DisableRule {
        repo_code: text("TA"),
        filename: QUOTEMARKS_ARTICLE,
        message: text("Unexpected space after “ character"),
        line_number: Some(3),
        ..DisableRule::ANY
    },
    DisableRule {
        repo_code: text("TA"),
        filename: QUOTEMARKS_ARTICLE,
        message: text("Unexpected space after “ character"),
        line_number: Some(16),
        ..DisableRule::ANY
    },
    DisableRule {
        repo_code: text("TA"),
        filename: QUOTEMARKS_ARTICLE,
        message: text("Unexpected space after ‘ character"),
        line_number: Some(16),
        ..DisableRule::ANY
    },
    DisableRule {
        repo_code: text("TA"),
        filename: QUOTEMARKS_ARTICLE,
        message: text("Unexpected space after « character"),
        ..DisableRule::ANY
    },
    DisableRule {
        repo_code: text("TA"),
        filename: QUOTEMARKS_ARTICLE,
        message: text("Unexpected space after ‹ character"),
        ..DisableRule::ANY
    },
    DisableRule {
        repo_code: text("TA"),
        filename: QUOTEMARKS_ARTICLE,
        message: text("Unexpected space after — character"),
        ..DisableRule::ANY
    },
    DisableRule {
        repo_code: text("TA"),
        filename: QUOTEMARKS_ARTICLE,
        message: text("Unexpected . character after space"),
        line_number: Some(16),
        ..DisableRule::ANY
    },
    DisableRule {
        repo_code: text("TA"),
        filename: QUOTEMARKS_ARTICLE,
        message: text("Unexpected » character after space"),
        ..DisableRule::ANY
    },
    DisableRule {
        repo_code: text("TA"),
        filename: QUOTEMARKS_ARTICLE,
        message: text("Unexpected › character after space"),
        ..DisableRule::ANY
    },
    DisableRule {
        repo_code: text("TA"),
        filename: QUOTEMARKS_ARTICLE,
        message: text("Unexpected — character after space"),
        ..DisableRule::ANY
    },
];

/// Whether `notice` matches any of `rules`.
pub fn is_disabled(rules: &[DisableRule], notice: &Notice) -> bool {
    rules.iter().any(|rule| rule.matches(notice))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotemarks_notice(line_number: u32) -> Notice {
        Notice::new(191, "Unexpected space after “ character")
            .with_repo_code("TA")
            .with_filename("translate/figs-quotemarks/01.md")
            .with_line_number(line_number)
    }

    #[test]
    fn empty_rule_matches_everything() {
        assert!(DisableRule::ANY.matches(&Notice::new(1, "anything")));
    }

    #[test]
    fn every_set_field_must_match() {
        assert!(is_disabled(DISABLED_NOTICES, &quotemarks_notice(3)));
        assert!(!is_disabled(DISABLED_NOTICES, &quotemarks_notice(4)));
        // Right message and line, wrong repo.
        let other_repo = Notice { repo_code: Some("TW".to_string()), ..quotemarks_notice(3) };
        assert!(!is_disabled(DISABLED_NOTICES, &other_repo));
    }

    #[test]
    fn rule_field_set_but_notice_field_absent_does_not_match() {
        let rule = DisableRule { line_number: Some(3), ..DisableRule::ANY };
        assert!(!rule.matches(&Notice::new(100, "no line number")));
    }

    #[test]
    fn owned_rules_work_too() {
        let rule = DisableRule {
            repo_name: Some(Cow::Owned("en_tn".to_string())),
            priority: Some(450),
            ..DisableRule::default()
        };
        assert!(rule.matches(&Notice::new(450, "x").with_repo_name("en_tn")));
        assert!(!rule.matches(&Notice::new(451, "x").with_repo_name("en_tn")));
    }
}
