//! The notice aggregation pipeline.
//!
//! Three entry points share a common stage, and then diverge at
//! classification:
//!
//! 1. **Normalize**: give every notice a chapter/verse (empty if absent) and,
//!    optionally, summarize a long success list.
//! 2. **Filter**: drop ignored priorities first, then disabled notices, then
//!    anything below the cutoff, counting each category separately.
//! 3. **Sort**: preserve input order, or stable-sort by descending priority.
//! 4. **Fold context**: prefix each message with its `extra` tag (unless it is
//!    redundant) and remove the tag.
//! 5. **Suppress and classify**: see [`classify`].
//!
//! Before classification, any surviving notice mentioning the deprecated
//! `\s5` marker causes one extra high-priority notice to be added.

mod classify;
mod summary;

use crate::disabled::{DISABLED_NOTICES, DisableRule, is_disabled};
use crate::error::Result;
use crate::options::{ProcessingOptions, SUMMARY_MINIMUM_LENGTH, SortBy};
use crate::result::{Accounting, RawCheckResult};
use crate::{Notice, consistency};
use serde::Serialize;
use std::collections::HashSet;
use tracing::instrument;

const DEPRECATED_MARKUP: &str = "\\s5";
const DEPRECATED_MARKUP_PRIORITY: u16 = 701;
const DEPRECATED_MARKUP_MESSAGE: &str = "\\s5 fields should be coded as \\ts\\* milestones";

/// The classified notice lists; exactly one shape per entry point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum Classified {
    ErrorsWarnings {
        error_list: Vec<Notice>,
        warning_list: Vec<Notice>,
        num_suppressed_errors: usize,
    },
    SevereMediumLow {
        severe_list: Vec<Notice>,
        medium_list: Vec<Notice>,
        low_list: Vec<Notice>,
        num_severe_suppressed: usize,
        num_medium_suppressed: usize,
        num_low_suppressed: usize,
    },
    SingleList {
        warning_list: Vec<Notice>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResult {
    pub success_list: Vec<String>,
    #[serde(flatten)]
    pub classified: Classified,
    pub num_ignored_notices: usize,
    pub num_disabled_notices: usize,
    /// Notices dropped by the priority cutoff, plus (in the two-way and
    /// single-list modes) similar warnings suppressed.
    pub num_suppressed_warnings: usize,
    pub processing_options: ProcessingOptions,
    #[serde(flatten)]
    pub accounting: Accounting,
}

/// Output of the shared stage, ready for classification.
struct Prepared {
    success_list: Vec<String>,
    notices: Vec<Notice>,
    num_ignored_notices: usize,
    num_disabled_notices: usize,
    num_below_cutoff: usize,
    accounting: Accounting,
}

fn normalize(notice: &mut Notice) {
    notice.c.get_or_insert_with(String::new);
    notice.v.get_or_insert_with(String::new);
}

fn fold_context(notice: &mut Notice) {
    let Some(extra) = notice.extra.take() else {
        return;
    };
    let redundant = extra.is_empty()
        || notice.repo_name.as_deref() == Some(extra.as_str())
        || notice.book_id.as_deref() == Some(extra.as_str());
    if !redundant {
        notice.message = format!("{extra} {}", notice.message);
    }
}

fn deprecated_markup_notice(offender: &Notice, check_type: Option<&str>) -> Notice {
    Notice {
        priority: DEPRECATED_MARKUP_PRIORITY,
        message: DEPRECATED_MARKUP_MESSAGE.to_string(),
        book_id: offender.book_id.clone(),
        c: Some(String::new()),
        v: Some(String::new()),
        location: check_type.map(|check_type| format!(" in {check_type}")),
        extra: offender.extra.clone(),
        ..Notice::default()
    }
}

fn dedupe_in_order(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.into_iter().filter(|name| seen.insert(name.clone())).collect()
}

fn prepare(
    raw: RawCheckResult,
    options: &ProcessingOptions,
    rules: &[DisableRule],
    default_sort: SortBy,
) -> Result<Prepared> {
    options.validate()?;
    consistency::log_inconsistencies(&raw.notice_list);

    let RawCheckResult { success_list, notice_list, check_type, mut accounting } = raw;
    let success_list = if options.summarize_success_list && success_list.len() >= SUMMARY_MINIMUM_LENGTH {
        summary::summarize(success_list)
    } else {
        success_list
    };
    accounting.checked_filenames = dedupe_in_order(accounting.checked_filenames);

    let (mut num_ignored_notices, mut num_disabled_notices, mut num_below_cutoff) = (0, 0, 0);
    let mut notices = Vec::with_capacity(notice_list.len());
    for mut notice in notice_list {
        normalize(&mut notice);
        if options.ignore_priority_numbers.contains(&notice.priority) {
            num_ignored_notices += 1;
        } else if !options.show_disabled_notices && is_disabled(rules, &notice) {
            num_disabled_notices += 1;
        } else if notice.priority < options.cutoff_priority_level {
            num_below_cutoff += 1;
        } else {
            notices.push(notice);
        }
    }

    if let Some(offender) = notices.iter().find(|n| n.message.contains(DEPRECATED_MARKUP)) {
        let flagged = deprecated_markup_notice(offender, check_type.as_deref());
        notices.push(flagged);
    }

    match options.sort_by.unwrap_or(default_sort) {
        // `sort_by` is stable, so ties keep their input order.
        SortBy::ByPriority => notices.sort_by(|a, b| b.priority.cmp(&a.priority)),
        SortBy::AsFound => {},
    }

    notices.iter_mut().for_each(fold_context);

    Ok(Prepared { success_list, notices, num_ignored_notices, num_disabled_notices, num_below_cutoff, accounting })
}

/// Classify notices into errors (priority at or above
/// `error_priority_level`) and warnings.
pub fn process_notices_to_errors_warnings(
    raw: RawCheckResult,
    options: &ProcessingOptions,
) -> Result<ProcessedResult> {
    process_notices_to_errors_warnings_with_rules(raw, options, DISABLED_NOTICES)
}

#[instrument(skip_all, fields(notices = raw.notice_list.len()))]
pub fn process_notices_to_errors_warnings_with_rules(
    raw: RawCheckResult,
    options: &ProcessingOptions,
    rules: &[DisableRule],
) -> Result<ProcessedResult> {
    let prepared = prepare(raw, options, rules, SortBy::AsFound)?;
    let error_level = options.error_priority_level;
    let mut buckets = classify::suppress_and_classify(
        prepared.notices,
        options.maximum_similar_messages,
        2,
        |priority| usize::from(priority < error_level),
        |bucket| if bucket == 0 { "errors" } else { "warnings" },
    );
    let warning_list = buckets.lists.pop().unwrap_or_default();
    let error_list = buckets.lists.pop().unwrap_or_default();
    tracing::debug!(errors = error_list.len(), warnings = warning_list.len(), "Classified notices");
    Ok(ProcessedResult {
        success_list: prepared.success_list,
        classified: Classified::ErrorsWarnings { error_list, warning_list, num_suppressed_errors: buckets.suppressed[0] },
        num_ignored_notices: prepared.num_ignored_notices,
        num_disabled_notices: prepared.num_disabled_notices,
        num_suppressed_warnings: prepared.num_below_cutoff + buckets.suppressed[1],
        processing_options: options.clone(),
        accounting: prepared.accounting,
    })
}

/// Classify notices into severe (at or above `severe_priority_level`),
/// medium (at or above `medium_priority_level`) and low.
pub fn process_notices_to_severe_medium_low(
    raw: RawCheckResult,
    options: &ProcessingOptions,
) -> Result<ProcessedResult> {
    process_notices_to_severe_medium_low_with_rules(raw, options, DISABLED_NOTICES)
}

#[instrument(skip_all, fields(notices = raw.notice_list.len()))]
pub fn process_notices_to_severe_medium_low_with_rules(
    raw: RawCheckResult,
    options: &ProcessingOptions,
    rules: &[DisableRule],
) -> Result<ProcessedResult> {
    let prepared = prepare(raw, options, rules, SortBy::AsFound)?;
    let (severe_level, medium_level) = (options.severe_priority_level, options.medium_priority_level);
    let buckets = classify::suppress_and_classify(
        prepared.notices,
        options.maximum_similar_messages,
        3,
        |priority| match priority {
            p if p >= severe_level => 0,
            p if p >= medium_level => 1,
            _ => 2,
        },
        |bucket| if bucket == 2 { "warnings" } else { "errors" },
    );
    let mut lists = buckets.lists.into_iter();
    let (severe_list, medium_list, low_list) =
        (lists.next().unwrap_or_default(), lists.next().unwrap_or_default(), lists.next().unwrap_or_default());
    tracing::debug!(
        severe = severe_list.len(),
        medium = medium_list.len(),
        low = low_list.len(),
        "Classified notices"
    );
    Ok(ProcessedResult {
        success_list: prepared.success_list,
        classified: Classified::SevereMediumLow {
            severe_list,
            medium_list,
            low_list,
            num_severe_suppressed: buckets.suppressed[0],
            num_medium_suppressed: buckets.suppressed[1],
            num_low_suppressed: buckets.suppressed[2],
        },
        num_ignored_notices: prepared.num_ignored_notices,
        num_disabled_notices: prepared.num_disabled_notices,
        num_suppressed_warnings: prepared.num_below_cutoff,
        processing_options: options.clone(),
        accounting: prepared.accounting,
    })
}

/// Put every surviving notice into one list, sorted by priority unless the
/// caller asks otherwise.
pub fn process_notices_to_single_list(raw: RawCheckResult, options: &ProcessingOptions) -> Result<ProcessedResult> {
    process_notices_to_single_list_with_rules(raw, options, DISABLED_NOTICES)
}

#[instrument(skip_all, fields(notices = raw.notice_list.len()))]
pub fn process_notices_to_single_list_with_rules(
    raw: RawCheckResult,
    options: &ProcessingOptions,
    rules: &[DisableRule],
) -> Result<ProcessedResult> {
    let prepared = prepare(raw, options, rules, SortBy::ByPriority)?;
    let mut buckets =
        classify::suppress_and_classify(prepared.notices, options.maximum_similar_messages, 1, |_| 0, |_| "warnings");
    let warning_list = buckets.lists.pop().unwrap_or_default();
    Ok(ProcessedResult {
        success_list: prepared.success_list,
        classified: Classified::SingleList { warning_list },
        num_ignored_notices: prepared.num_ignored_notices,
        num_disabled_notices: prepared.num_disabled_notices,
        num_suppressed_warnings: prepared.num_below_cutoff + buckets.suppressed[0],
        processing_options: options.clone(),
        accounting: prepared.accounting,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;

    fn raw(notices: Vec<Notice>) -> RawCheckResult {
        RawCheckResult { notice_list: notices, ..RawCheckResult::default() }
    }

    fn errors_and_warnings(result: &ProcessedResult) -> (&[Notice], &[Notice], usize) {
        match &result.classified {
            Classified::ErrorsWarnings { error_list, warning_list, num_suppressed_errors } => {
                (error_list.as_slice(), warning_list.as_slice(), *num_suppressed_errors)
            },
            other => panic!("expected two-way classification, got {other:?}"),
        }
    }

    fn priorities(notices: &[Notice]) -> Vec<u16> {
        notices.iter().map(|n| n.priority).collect()
    }

    #[test]
    fn four_identical_errors_with_limit_two() {
        let options =
            ProcessingOptions { maximum_similar_messages: 2, error_priority_level: 700, ..ProcessingOptions::default() };
        let result = process_notices_to_errors_warnings(raw(vec![Notice::new(700, "Foo"); 4]), &options).unwrap();
        let (errors, warnings, suppressed) = errors_and_warnings(&result);
        assert_eq!(errors.len(), 3);
        assert!(warnings.is_empty());
        assert_eq!(errors[2].details.as_deref(), Some("2 more similar errors suppressed"));
        assert_eq!(errors[0].details, None);
        assert_eq!(suppressed, 2);
    }

    #[test]
    fn cutoff_drops_low_priorities() {
        let options = ProcessingOptions { cutoff_priority_level: 500, ..ProcessingOptions::default() };
        let notices = [100, 500, 499, 900].map(|p| Notice::new(p, format!("Message {p}"))).to_vec();
        let result = process_notices_to_errors_warnings(raw(notices), &options).unwrap();
        let (errors, warnings, _) = errors_and_warnings(&result);
        assert_eq!(priorities(errors), vec![900]);
        assert_eq!(priorities(warnings), vec![500]);
        assert_eq!(result.num_suppressed_warnings, 2);
    }

    #[rstest]
    #[case(700, true)]
    #[case(699, false)]
    fn classification_boundary(#[case] priority: u16, #[case] is_error: bool) {
        let result =
            process_notices_to_errors_warnings(raw(vec![Notice::new(priority, "Edge")]), &ProcessingOptions::default())
                .unwrap();
        let (errors, warnings, _) = errors_and_warnings(&result);
        assert_eq!(errors.len(), usize::from(is_error));
        assert_eq!(warnings.len(), usize::from(!is_error));
    }

    #[test]
    fn ignored_priority_is_never_checked_against_disable_rules() {
        let rule = DisableRule { priority: Some(191), ..DisableRule::ANY };
        let options = ProcessingOptions { ignore_priority_numbers: vec![191], ..ProcessingOptions::default() };
        let result =
            process_notices_to_errors_warnings_with_rules(raw(vec![Notice::new(191, "x")]), &options, &[rule]).unwrap();
        assert_eq!(result.num_ignored_notices, 1);
        assert_eq!(result.num_disabled_notices, 0);
    }

    #[test]
    fn disable_rules_only_hit_the_exact_notice() {
        let notice = |line| {
            Notice::new(191, "Unexpected space after “ character")
                .with_repo_code("TA")
                .with_filename("translate/figs-quotemarks/01.md")
                .with_line_number(line)
        };
        let result =
            process_notices_to_errors_warnings(raw(vec![notice(3), notice(4)]), &ProcessingOptions::default()).unwrap();
        let (_, warnings, _) = errors_and_warnings(&result);
        assert_eq!(result.num_disabled_notices, 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line_number, Some(4));
    }

    #[test]
    fn showing_disabled_notices_skips_the_filter() {
        let notice = Notice::new(191, "Unexpected space after « character")
            .with_repo_code("TA")
            .with_filename("translate/figs-quotemarks/01.md");
        let options = ProcessingOptions { show_disabled_notices: true, ..ProcessingOptions::default() };
        let result = process_notices_to_errors_warnings(raw(vec![notice]), &options).unwrap();
        assert_eq!(result.num_disabled_notices, 0);
        assert_eq!(errors_and_warnings(&result).1.len(), 1);
    }

    #[test]
    fn as_found_preserves_order() {
        let input = [300, 900, 100, 800, 500];
        let options = ProcessingOptions { error_priority_level: 1, ..ProcessingOptions::default() };
        let notices = input.map(|p| Notice::new(p, format!("M{p}"))).to_vec();
        let result = process_notices_to_errors_warnings(raw(notices), &options).unwrap();
        assert_eq!(priorities(errors_and_warnings(&result).0), input.to_vec());
    }

    #[test]
    fn by_priority_is_stable_and_descending() {
        let options = ProcessingOptions {
            sort_by: Some(SortBy::ByPriority),
            error_priority_level: 1,
            ..ProcessingOptions::default()
        };
        let notices = vec![
            Notice::new(300, "first 300"),
            Notice::new(900, "900"),
            Notice::new(300, "second 300"),
            Notice::new(500, "500"),
        ];
        let result = process_notices_to_errors_warnings(raw(notices), &options).unwrap();
        let messages: Vec<_> = errors_and_warnings(&result).0.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["900", "500", "first 300", "second 300"]);
    }

    #[test]
    fn single_list_defaults_to_priority_order() {
        let notices = [100, 900, 500].map(|p| Notice::new(p, format!("M{p}"))).to_vec();
        let result = process_notices_to_single_list(raw(notices), &ProcessingOptions::default()).unwrap();
        let Classified::SingleList { warning_list } = &result.classified else {
            panic!("expected single list");
        };
        assert_eq!(priorities(warning_list), vec![900, 500, 100]);
    }

    #[test]
    fn single_list_respects_explicit_as_found() {
        let options = ProcessingOptions { sort_by: Some(SortBy::AsFound), ..ProcessingOptions::default() };
        let notices = [100, 900, 500].map(|p| Notice::new(p, format!("M{p}"))).to_vec();
        let result = process_notices_to_single_list(raw(notices), &options).unwrap();
        let Classified::SingleList { warning_list } = &result.classified else {
            panic!("expected single list");
        };
        assert_eq!(priorities(warning_list), vec![100, 900, 500]);
    }

    #[test]
    fn three_way_buckets_and_nouns() {
        let mut notices = vec![Notice::new(850, "S"), Notice::new(650, "M"), Notice::new(599, "L")];
        notices.extend(vec![Notice::new(200, "Low again"); 6]);
        let options = ProcessingOptions { maximum_similar_messages: 2, ..ProcessingOptions::default() };
        let result = process_notices_to_severe_medium_low(raw(notices), &options).unwrap();
        let Classified::SevereMediumLow { severe_list, medium_list, low_list, num_low_suppressed, .. } =
            &result.classified
        else {
            panic!("expected three-way classification");
        };
        assert_eq!(priorities(severe_list), vec![850]);
        assert_eq!(priorities(medium_list), vec![650]);
        assert_eq!(low_list.len(), 4);
        assert_eq!(low_list[3].details.as_deref(), Some("4 more similar warnings suppressed"));
        assert_eq!(*num_low_suppressed, 4);
    }

    #[test]
    fn extra_is_folded_into_message_unless_redundant() {
        let notices = vec![
            Notice::new(500, "Bad link").with_extra("TN"),
            Notice::new(500, "Bad link").with_extra("TIT").with_book_id("TIT"),
            Notice::new(500, "Bad link").with_extra("en_tn").with_repo_name("en_tn"),
        ];
        let result = process_notices_to_errors_warnings(raw(notices), &ProcessingOptions::default()).unwrap();
        let messages: Vec<_> = errors_and_warnings(&result).1.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["TN Bad link", "Bad link", "Bad link"]);
        assert!(errors_and_warnings(&result).1.iter().all(|n| n.extra.is_none()));
    }

    #[test]
    fn deprecated_markup_adds_one_notice() {
        let mut input = raw(vec![
            Notice::new(100, "Found \\s5 marker").with_book_id("GEN"),
            Notice::new(100, "Found \\s5 marker").with_book_id("GEN"),
        ]);
        input.check_type = Some("USFM".to_string());
        let result = process_notices_to_errors_warnings(input, &ProcessingOptions::default()).unwrap();
        let (errors, warnings, _) = errors_and_warnings(&result);
        assert_eq!(warnings.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].priority, 701);
        assert_eq!(errors[0].message, "\\s5 fields should be coded as \\ts\\* milestones");
        assert_eq!(errors[0].location.as_deref(), Some(" in USFM"));
    }

    #[test]
    fn notices_are_normalized_with_empty_reference() {
        let result =
            process_notices_to_single_list(raw(vec![Notice::new(10, "x")]), &ProcessingOptions::default()).unwrap();
        let Classified::SingleList { warning_list } = &result.classified else {
            panic!("expected single list");
        };
        assert_eq!(warning_list[0].c.as_deref(), Some(""));
        assert_eq!(warning_list[0].v.as_deref(), Some(""));
    }

    #[test]
    fn accounting_passes_through_with_deduplicated_filenames() {
        let mut input = raw(Vec::new());
        input.accounting.record_file("en_tq", "01.md", 3);
        input.accounting.record_file("en_tq", "01.md", 4);
        input.accounting.elapsed_seconds = 2.5;
        let result = process_notices_to_errors_warnings(input, &ProcessingOptions::default()).unwrap();
        assert_eq!(result.accounting.checked_filenames, vec!["01.md".to_string()]);
        assert_eq!(result.accounting.checked_file_count, 2);
        assert_eq!(result.accounting.elapsed_seconds, 2.5);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = ProcessingOptions { severe_priority_level: 100, ..ProcessingOptions::default() };
        let err = process_notices_to_severe_medium_low(raw(Vec::new()), &options).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidOption(_)));
    }

    #[test]
    fn long_success_lists_are_summarized() {
        let mut input = raw(Vec::new());
        for book in ["GEN", "EXO", "LEV", "NUM", "DEU"] {
            input.add_success(format!("Checked UHB file: {book}.usfm"));
        }
        input.add_success("Checked unfoldingWord repo: hbo_uhb");
        let result = process_notices_to_errors_warnings(input, &ProcessingOptions::default()).unwrap();
        assert_eq!(
            result.success_list,
            vec![
                "Checked 5 UHB files: GEN.usfm, EXO.usfm, LEV.usfm, NUM.usfm, DEU.usfm".to_string(),
                "Checked unfoldingWord repo: hbo_uhb".to_string(),
            ]
        );
    }
}
