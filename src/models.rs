//! Data models shared by every stage of the aggregation pipeline.
//!
//! - [`NewsItem`]: one scraped, normalized news entry (the unit of output)
//! - [`SourceConfig`]: how and where to scrape one site
//! - [`AggregationRequest`]: run-scoped parameters
//! - [`PreviousItemSet`]: the caller-owned set of identifiers seen in earlier runs
//! - [`RunStats`] / [`Digest`]: what a finished run reports back

use crate::error::AggregateError;
use chrono::{DateTime, FixedOffset, Offset as _, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// Publication time of an item as far as it could be determined.
///
/// `Unparsed` keeps the cleaned-up original text. The freshness filter treats
/// it as "unknown" and accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Published {
    At(DateTime<Utc>),
    Unparsed(String),
}

impl Published {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Published::At(ts) => Some(*ts),
            Published::Unparsed(_) => None,
        }
    }
}

impl Default for Published {
    fn default() -> Self {
        Published::Unparsed(String::new())
    }
}

/// Whether the caller has seen an item in a previous run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    New,
    Seen,
}

/// A single news entry produced by an extractor.
///
/// Invariants upheld by the extractors:
/// - `title` is normalized and never empty
/// - `url` is absolute and canonical (no fragment)
/// - `id` is derived from `(title, url)` only, so re-scraping yields the same id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub summary: String,
    /// Article body text, filled only by detail enrichment.
    #[serde(default)]
    pub content: String,
    pub published_at: Published,
    pub image_url: String,
    pub source_name: String,
    pub source_origin: String,
    #[serde(default)]
    pub status: ItemStatus,
}

impl NewsItem {
    pub fn new(title: String, url: String, source_name: &str, source_origin: &str) -> Self {
        let id = content_id(&title, &url);
        Self {
            id,
            title,
            url,
            summary: String::new(),
            content: String::new(),
            published_at: Published::default(),
            image_url: String::new(),
            source_name: source_name.to_string(),
            source_origin: source_origin.to_string(),
            status: ItemStatus::New,
        }
    }
}

/// Stable identifier for an item: 16 hex chars of SHA-256 over title and url.
pub fn content_id(title: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hasher.finalize()[..8]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Which extraction strategy applies to a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// The site whose listing layout is known exactly.
    Primary,
    /// Ordered selector fallback chains, for every other site.
    #[default]
    Generic,
}

/// Ordered selector candidates used by the generic extractor.
///
/// Every list is resolved with the same rule: the first selector that matches
/// and yields a non-empty value wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSet {
    pub containers: Vec<String>,
    pub title: Vec<String>,
    pub link: Vec<String>,
    pub summary: Vec<String>,
    pub published: Vec<String>,
    pub image: Vec<String>,
    /// Attributes tried, in order, on a matched image element.
    pub image_attrs: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            containers: strings(&[
                "li.nws",
                "div.news-item",
                "article.news",
                "div.haber-item",
                "article",
            ]),
            title: strings(&["span.title", "h2", "h3", ".title", ".headline"]),
            link: strings(&["a.content", "a", "a.news-link"]),
            summary: strings(&["p.news-detail", ".description", ".summary", ".excerpt"]),
            published: strings(&["span.mdate", ".date", ".time", "time"]),
            image: strings(&["img"]),
            image_attrs: strings(&["src", "data-src", "data-originalm"]),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_title_len() -> usize {
    15
}

/// One scrapeable site. Supplied by the caller, immutable during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Origin that relative links are resolved against, e.g. `https://www.example.com`.
    pub base: String,
    #[serde(default)]
    pub seeds: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub extractor: ExtractorKind,
    /// Ranking weight; unknown sources get the lowest weight, 0.
    #[serde(default)]
    pub trust: i64,
    #[serde(default)]
    pub selectors: SelectorSet,
    #[serde(default = "default_min_title_len")]
    pub min_title_len: usize,
    /// A container candidate is adopted when it yields more than this many elements.
    #[serde(default)]
    pub min_listing_items: usize,
    /// How many listing items get their article page fetched (primary sources only).
    #[serde(default)]
    pub detail_limit: usize,
}

impl SourceConfig {
    pub fn new(name: &str, base: &str, seeds: &[&str], extractor: ExtractorKind) -> Self {
        Self {
            name: name.to_string(),
            base: base.to_string(),
            seeds: strings(seeds),
            enabled: true,
            extractor,
            trust: 0,
            selectors: SelectorSet::default(),
            min_title_len: default_min_title_len(),
            min_listing_items: 0,
            detail_limit: 0,
        }
    }
}

/// Per-attempt HTTP settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Parameters of a single aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRequest {
    /// `None` disables the freshness filter.
    pub freshness_window: Option<Duration>,
    pub max_items: usize,
    pub concurrency: usize,
    /// Empty disables the relevance filter.
    pub keywords: Vec<String>,
    /// Hard deadline for one source task, detail fetches included.
    pub task_timeout: Duration,
    pub fetch: FetchSettings,
    /// Offset naive scraped timestamps are interpreted in.
    pub utc_offset: FixedOffset,
}

/// Istanbul time, UTC+3 all year round.
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 3 * 3600;

pub fn default_utc_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

impl Default for AggregationRequest {
    fn default() -> Self {
        Self {
            freshness_window: Some(Duration::from_secs(24 * 3600)),
            max_items: 100,
            concurrency: 3,
            keywords: Vec::new(),
            task_timeout: Duration::from_secs(60),
            fetch: FetchSettings::default(),
            utc_offset: default_utc_offset(),
        }
    }
}

impl AggregationRequest {
    /// Reject requests that cannot describe a meaningful run.
    pub fn validate(&self) -> Result<(), AggregateError> {
        let invalid = |msg: &str| Err(AggregateError::InvalidRequest(msg.to_string()));
        if self.concurrency == 0 {
            return invalid("concurrency must be at least 1");
        }
        if self.max_items == 0 {
            return invalid("max_items must be at least 1");
        }
        if self.task_timeout.is_zero() {
            return invalid("task_timeout must be positive");
        }
        if self.fetch.max_attempts == 0 {
            return invalid("fetch.max_attempts must be at least 1");
        }
        if self.fetch.timeout.is_zero() {
            return invalid("fetch.timeout must be positive");
        }
        if self.keywords.iter().any(|k| k.trim().is_empty()) {
            return invalid("keywords must not be blank");
        }
        Ok(())
    }
}

/// URLs or ids the caller has already seen. Owned and persisted by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviousItemSet {
    seen: HashSet<String>,
}

impl PreviousItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.seen.insert(key.into())
    }

    /// An item counts as seen when either its url or its id was recorded.
    pub fn contains(&self, item: &NewsItem) -> bool {
        self.seen.contains(&item.url) || self.seen.contains(&item.id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.seen.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for PreviousItemSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            seen: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// How a single source task ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum SourceOutcome {
    Completed,
    Disabled,
    Skipped(String),
    Failed(String),
    TimedOut,
}

/// Per-source bookkeeping for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub name: String,
    pub outcome: SourceOutcome,
    /// Candidates produced by extraction.
    pub extracted: usize,
    /// Listing entries the extractor rejected.
    pub rejected: usize,
    /// Candidates left after relevance and freshness filtering.
    pub kept: usize,
}

impl SourceReport {
    pub fn empty(name: &str, outcome: SourceOutcome) -> Self {
        Self {
            name: name.to_string(),
            outcome,
            extracted: 0,
            rejected: 0,
            kept: 0,
        }
    }
}

/// Statistics that make partial coverage of a run observable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub new: usize,
    pub seen: usize,
    /// Items in the final output, per source name (0 for sources that failed).
    pub per_source: BTreeMap<String, usize>,
    pub sources: Vec<SourceReport>,
    pub irrelevant: usize,
    pub stale: usize,
    pub duplicates_removed: usize,
    pub elapsed_ms: u64,
}

/// The result of a run: the ranked items plus statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub generated_at: DateTime<Utc>,
    pub items: Vec<NewsItem>,
    pub stats: RunStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, url: &str) -> NewsItem {
        NewsItem::new(title.to_string(), url.to_string(), "test", "example.com")
    }

    #[test]
    fn test_content_id_is_deterministic() {
        let a = item("Ferry services resume", "https://example.com/a");
        let b = item("Ferry services resume", "https://example.com/a");
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 16);
        assert!(a.id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_content_id_depends_on_title_and_url() {
        let base = content_id("Title", "https://example.com/a");
        assert_ne!(base, content_id("Title", "https://example.com/b"));
        assert_ne!(base, content_id("Other", "https://example.com/a"));
    }

    #[test]
    fn test_previous_set_matches_url_or_id() {
        let a = item("One", "https://example.com/1");
        let b = item("Two", "https://example.com/2");
        let c = item("Three", "https://example.com/3");
        let previous: PreviousItemSet = ["https://example.com/1".to_string(), b.id.clone()]
            .into_iter()
            .collect();
        assert!(previous.contains(&a));
        assert!(previous.contains(&b));
        assert!(!previous.contains(&c));
    }

    #[test]
    fn test_default_request_is_valid() {
        assert!(AggregationRequest::default().validate().is_ok());
    }

    #[test]
    fn test_request_validation_rejects_zero_concurrency() {
        let request = AggregationRequest {
            concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(
            request.validate(),
            Err(AggregateError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_request_validation_rejects_blank_keyword() {
        let request = AggregationRequest {
            keywords: vec!["istanbul".to_string(), "  ".to_string()],
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_published_serialization() {
        let unparsed = Published::Unparsed("yesterday-ish".to_string());
        let json = serde_json::to_string(&unparsed).unwrap();
        assert_eq!(json, "\"yesterday-ish\"");

        let at = Published::At("2025-05-06T10:00:00Z".parse().unwrap());
        let back: Published = serde_json::from_str(&serde_json::to_string(&at).unwrap()).unwrap();
        assert_eq!(back, at);
    }

    #[test]
    fn test_source_config_defaults_from_yaml() {
        let yaml = r#"
name: city-desk
base: https://news.example.com
seeds: ["https://news.example.com/city/"]
"#;
        let source: SourceConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(source.enabled);
        assert_eq!(source.extractor, ExtractorKind::Generic);
        assert_eq!(source.trust, 0);
        assert_eq!(source.selectors, SelectorSet::default());
        assert_eq!(source.min_title_len, 15);
    }
}
