//! Relevance and freshness predicates, applied after extraction and before dedup.

use crate::models::Published;
use crate::normalize::fold_case;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Does any keyword occur in the title, summary or content?
///
/// Matching is a case-insensitive substring test that also folds the Turkish
/// dotted capital I, so `İstanbul` matches `istanbul`. An empty keyword list
/// accepts everything.
pub fn is_relevant(title: &str, summary: &str, content: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let haystack = fold_case(&[title, summary, content].join(" "));
    keywords
        .iter()
        .map(|k| fold_case(k.trim()))
        .any(|k| !k.is_empty() && haystack.contains(&k))
}

/// Is the item no older than `window`?
///
/// Unparsed timestamps are treated as fresh. The boundary is inclusive: an
/// item exactly `window` old is accepted.
pub fn is_fresh(published: &Published, window: Duration, now: DateTime<Utc>) -> bool {
    let Some(ts) = published.timestamp() else {
        return true;
    };
    match chrono::Duration::from_std(window) {
        Ok(window) => now.signed_duration_since(ts) <= window,
        Err(_) => true,
    }
}
