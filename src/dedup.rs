//! Identity and near-duplicate suppression over the merged candidate stream.
//!
//! Items are processed in the order given (source completion order, then
//! extraction order) and only ever compared against items already accepted.

use crate::models::NewsItem;
use crate::normalize::{fold_case, normalize_text};
use std::collections::HashSet;
use tracing::debug;

/// Titles at or above this word-set Jaccard similarity are near-duplicates.
pub const NEAR_DUPLICATE_THRESHOLD: f64 = 0.8;

/// Accepted items plus how many were dropped at each stage.
#[derive(Debug, Default)]
pub struct Deduplicated {
    pub items: Vec<NewsItem>,
    pub identical: usize,
    pub near: usize,
}

impl Deduplicated {
    pub fn removed(&self) -> usize {
        self.identical + self.near
    }
}

/// Lower-cased, normalized word set of a title.
pub fn title_words(title: &str) -> HashSet<String> {
    fold_case(&normalize_text(title))
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// |A ∩ B| / |A ∪ B|, with two empty sets scoring 0.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

pub fn deduplicate(items: Vec<NewsItem>) -> Deduplicated {
    let mut ids: HashSet<String> = HashSet::new();
    let mut accepted_words: Vec<HashSet<String>> = Vec::new();
    let mut out = Deduplicated::default();

    for item in items {
        if ids.contains(&item.id) {
            debug!(id = %item.id, url = %item.url, "Dropped identical item");
            out.identical += 1;
            continue;
        }
        let words = title_words(&item.title);
        if let Some(similarity) = accepted_words
            .iter()
            .map(|seen| jaccard(&words, seen))
            .find(|s| *s >= NEAR_DUPLICATE_THRESHOLD)
        {
            debug!(title = %item.title, similarity, "Dropped near-duplicate title");
            out.near += 1;
            continue;
        }
        ids.insert(item.id.clone());
        accepted_words.push(words);
        out.items.push(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, url: &str) -> NewsItem {
        NewsItem::new(title.to_string(), url.to_string(), "test", "example.com")
    }

    fn words(s: &str) -> HashSet<String> {
        title_words(s)
    }

    #[test]
    fn test_jaccard_values() {
        assert_eq!(jaccard(&words(""), &words("")), 0.0);
        assert_eq!(jaccard(&words("a b"), &words("a b")), 1.0);
        assert_eq!(
            jaccard(&words("Mayor opens new bridge today"), &words("Mayor opens new bridge")),
            0.8
        );
        assert_eq!(jaccard(&words("A b"), &words("c d")), 0.0);
    }

    #[test]
    fn test_identical_items_collapse() {
        let out = deduplicate(vec![
            item("Ferry strike ends", "https://example.com/a"),
            item("Ferry strike ends", "https://example.com/a"),
        ]);
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.identical, 1);
        assert_eq!(out.near, 0);
    }

    #[test]
    fn test_near_duplicate_first_seen_wins() {
        let out = deduplicate(vec![
            item("Mayor opens new bridge today", "https://a.example.com/1"),
            item("Mayor opens new bridge", "https://b.example.com/2"),
        ]);
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].url, "https://a.example.com/1");
        assert_eq!(out.near, 1);
        assert_eq!(out.removed(), 1);
    }

    #[test]
    fn test_near_duplicate_ignores_case() {
        let out = deduplicate(vec![
            item("İSTANBUL METRO LINE OPENS", "https://a.example.com/1"),
            item("istanbul metro line opens", "https://b.example.com/2"),
        ]);
        assert_eq!(out.items.len(), 1);
    }

    #[test]
    fn test_rejected_items_do_not_participate() {
        // B is a near-duplicate of A (8/9) and is dropped. C scores 0.8
        // against B but only 0.7 against A, so it must survive.
        let out = deduplicate(vec![
            item("one two three four five six seven eight", "https://example.com/a"),
            item("one two three four five six seven eight nine", "https://example.com/b"),
            item("two three four five six seven eight nine ten", "https://example.com/c"),
        ]);
        let urls: Vec<_> = out.items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/c"]);
    }

    #[test]
    fn test_distinct_titles_survive() {
        let out = deduplicate(vec![
            item("Ferry strike ends", "https://example.com/a"),
            item("Metro line M5 extended", "https://example.com/b"),
        ]);
        assert_eq!(out.items.len(), 2);
        assert_eq!(out.removed(), 0);
    }
}
