//! Deterministic priority scoring.
//!
//! ```text
//! score = trust(source)
//!       + max(0, 10 - hours_since_published)        (0 when unparsed)
//!       + 2 if title > 20 chars
//!       + 3 if summary > 50 chars
//!       + 1 if an image is present
//! ```

use crate::models::NewsItem;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

const RECENCY_HOURS: f64 = 10.0;

/// Trust weight per source name. Unknown sources get the lowest weight.
#[derive(Debug, Clone, Default)]
pub struct TrustTable {
    weights: HashMap<String, i64>,
}

impl TrustTable {
    pub fn insert(&mut self, source: &str, weight: i64) {
        self.weights.insert(source.to_string(), weight);
    }

    /// Lowest configured weight, and never above 0.
    fn floor(&self) -> i64 {
        self.weights.values().copied().min().unwrap_or(0).min(0)
    }

    pub fn weight(&self, source: &str) -> i64 {
        self.weights.get(source).copied().unwrap_or_else(|| self.floor())
    }
}

impl<'a> FromIterator<(&'a str, i64)> for TrustTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, i64)>>(iter: I) -> Self {
        let mut table = TrustTable::default();
        for (source, weight) in iter {
            table.insert(source, weight);
        }
        table
    }
}

/// Hours-based recency bonus. Timestamps in the future count as brand new.
fn recency(item: &NewsItem, now: DateTime<Utc>) -> f64 {
    let Some(ts) = item.published_at.timestamp() else {
        return 0.0;
    };
    let hours = (now - ts).num_seconds().max(0) as f64 / 3600.0;
    (RECENCY_HOURS - hours).max(0.0)
}

fn richness(item: &NewsItem) -> f64 {
    let mut score = 0.0;
    if item.title.chars().count() > 20 {
        score += 2.0;
    }
    if item.summary.chars().count() > 50 {
        score += 3.0;
    }
    if !item.image_url.is_empty() {
        score += 1.0;
    }
    score
}

pub fn score(item: &NewsItem, trust: &TrustTable, now: DateTime<Utc>) -> f64 {
    trust.weight(&item.source_name) as f64 + recency(item, now) + richness(item)
}

/// Sort by descending score. Equal scores keep their input order.
pub fn rank(items: Vec<NewsItem>, trust: &TrustTable, now: DateTime<Utc>) -> Vec<NewsItem> {
    let mut scored: Vec<(f64, NewsItem)> = items
        .into_iter()
        .map(|item| (score(&item, trust, now), item))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Published;

    fn now() -> DateTime<Utc> {
        "2025-10-18T12:00:00Z".parse().unwrap()
    }

    fn item(title: &str, source: &str) -> NewsItem {
        NewsItem::new(
            title.to_string(),
            format!("https://example.com/{}", title.replace(' ', "-")),
            source,
            "example.com",
        )
    }

    #[test]
    fn test_score_components() {
        let trust: TrustTable = [("primary", 5)].into_iter().collect();
        let mut it = item("A title longer than twenty", "primary");
        it.summary = "x".repeat(51);
        it.image_url = "https://example.com/i.jpg".to_string();
        it.published_at = Published::At(now() - chrono::Duration::hours(4));
        assert_eq!(score(&it, &trust, now()), 5.0 + 6.0 + 2.0 + 3.0 + 1.0);
    }

    #[test]
    fn test_recency_bounds() {
        let trust = TrustTable::default();
        let mut old = item("short", "x");
        old.published_at = Published::At(now() - chrono::Duration::hours(12));
        assert_eq!(score(&old, &trust, now()), 0.0);

        let unparsed = item("short", "x");
        assert_eq!(score(&unparsed, &trust, now()), 0.0);

        let mut future = item("short", "x");
        future.published_at = Published::At(now() + chrono::Duration::hours(1));
        assert_eq!(score(&future, &trust, now()), 10.0);
    }

    #[test]
    fn test_unknown_source_gets_lowest_weight() {
        let trust: TrustTable = [("primary", 5), ("minor", -1)].into_iter().collect();
        assert_eq!(trust.weight("primary"), 5);
        assert_eq!(trust.weight("somewhere-else"), -1);
        assert_eq!(TrustTable::default().weight("anything"), 0);
    }

    #[test]
    fn test_rank_orders_by_score() {
        let trust: TrustTable = [("primary", 5)].into_iter().collect();
        let items = vec![item("low", "other"), item("high", "primary")];
        let ranked = rank(items, &trust, now());
        assert_eq!(ranked[0].title, "high");
        assert_eq!(ranked[1].title, "low");
    }

    #[test]
    fn test_rank_is_stable_for_equal_scores() {
        let trust = TrustTable::default();
        let items = vec![item("first", "a"), item("second", "b"), item("third", "c")];
        let ranked = rank(items, &trust, now());
        let titles: Vec<_> = ranked.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }
}
