//! Similar-notice suppression combined with bucket classification.

use crate::Notice;
use std::collections::HashMap;

/// Notices sorted into buckets, with a suppression counter per bucket.
pub(crate) struct Buckets {
    pub lists: Vec<Vec<Notice>>,
    pub suppressed: Vec<usize>,
}

fn suppressed_summary(priority: u16, message: String, count: usize, noun: &str) -> Notice {
    let text = format!("{count} more similar {noun} suppressed");
    Notice {
        priority,
        message,
        c: Some(String::new()),
        v: Some(String::new()),
        location: Some(format!(" ◄ {text}")),
        details: Some(text),
        ..Notice::default()
    }
}

/// Walk `notices` in order, putting each into the bucket chosen by
/// `bucket_of(priority)`.
///
/// Once more than `maximum_similar` notices share a `(priority, message)`
/// key, and only if there are at least two more than that in total, a single
/// synthetic "N more similar … suppressed" notice replaces the next one and
/// every later one is dropped. Each replaced or dropped notice increments the
/// bucket's suppression counter by one. A `maximum_similar` of zero disables
/// suppression.
pub(crate) fn suppress_and_classify(
    notices: Vec<Notice>,
    maximum_similar: usize,
    bucket_count: usize,
    bucket_of: impl Fn(u16) -> usize,
    noun_of: impl Fn(usize) -> &'static str,
) -> Buckets {
    let mut buckets = Buckets { lists: vec![Vec::new(); bucket_count], suppressed: vec![0; bucket_count] };

    let mut totals: HashMap<(u16, String), usize> = HashMap::new();
    if maximum_similar > 0 {
        for notice in &notices {
            *totals.entry((notice.priority, notice.message.clone())).or_default() += 1;
        }
    }

    let mut running: HashMap<(u16, String), usize> = HashMap::new();
    for notice in notices {
        let bucket = bucket_of(notice.priority).min(bucket_count - 1);
        if maximum_similar == 0 {
            buckets.lists[bucket].push(notice);
            continue;
        }
        let (priority, message) = notice.similarity_key();
        let key = (priority, message.to_string());
        let total = totals.get(&key).copied().unwrap_or(0);
        let seen = running.entry(key).or_default();
        *seen += 1;

        if *seen <= maximum_similar || total <= maximum_similar + 1 {
            buckets.lists[bucket].push(notice);
        } else if *seen == maximum_similar + 1 {
            let summary = suppressed_summary(priority, notice.message, total - maximum_similar, noun_of(bucket));
            buckets.lists[bucket].push(summary);
            buckets.suppressed[bucket] += 1;
        } else {
            buckets.suppressed[bucket] += 1;
        }
    }
    buckets
}
