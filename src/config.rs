//! YAML configuration file.
//!
//! ```yaml
//! request:
//!   freshness_hours: 24      # null disables the freshness filter
//!   max_items: 100
//!   concurrency: 3
//!   keywords: [istanbul, kadıköy]
//!   task_timeout_secs: 60
//!   fetch_timeout_secs: 30
//!   max_attempts: 3
//!   base_delay_secs: 1
//!   utc_offset_hours: 3
//! sources:
//!   - name: sondakika-istanbul
//!     base: https://www.sondakika.com
//!     seeds: [/istanbul/]
//!     extractor: primary
//!     trust: 5
//!     detail_limit: 10
//! ```
//!
//! Every field is optional. Without a `sources` list the built-in
//! [`default_sources`] are used.

use crate::error::ConfigError;
use crate::models::{
    AggregationRequest, DEFAULT_UTC_OFFSET_SECS, ExtractorKind, FetchSettings, SourceConfig,
};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Run parameters as written in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub freshness_hours: Option<u64>,
    pub max_items: usize,
    pub concurrency: usize,
    pub keywords: Vec<String>,
    pub task_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_attempts: usize,
    pub base_delay_secs: u64,
    pub utc_offset_hours: i32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        let request = AggregationRequest::default();
        Self {
            freshness_hours: request.freshness_window.map(|w| w.as_secs() / 3600),
            max_items: request.max_items,
            concurrency: request.concurrency,
            keywords: request.keywords,
            task_timeout_secs: request.task_timeout.as_secs(),
            fetch_timeout_secs: request.fetch.timeout.as_secs(),
            max_attempts: request.fetch.max_attempts,
            base_delay_secs: request.fetch.base_delay.as_secs(),
            utc_offset_hours: DEFAULT_UTC_OFFSET_SECS / 3600,
        }
    }
}

impl RequestConfig {
    pub fn to_request(&self) -> Result<AggregationRequest, ConfigError> {
        let utc_offset = self
            .utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ConfigError::Unreadable(format!(
                    "utc_offset_hours {} is out of range",
                    self.utc_offset_hours
                ))
            })?;
        Ok(AggregationRequest {
            freshness_window: self
                .freshness_hours
                .map(|h| Duration::from_secs(h.saturating_mul(3600))),
            max_items: self.max_items,
            concurrency: self.concurrency,
            keywords: self.keywords.clone(),
            task_timeout: Duration::from_secs(self.task_timeout_secs),
            fetch: FetchSettings {
                timeout: Duration::from_secs(self.fetch_timeout_secs),
                max_attempts: self.max_attempts,
                base_delay: Duration::from_secs(self.base_delay_secs),
            },
            utc_offset,
        })
    }
}

fn default_sources_field() -> Vec<SourceConfig> {
    default_sources()
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub request: RequestConfig,
    #[serde(default = "default_sources_field")]
    pub sources: Vec<SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request: RequestConfig::default(),
            sources: default_sources(),
        }
    }
}

/// The primary site's regional and current-affairs listing pages.
pub fn default_sources() -> Vec<SourceConfig> {
    let mut regional = SourceConfig::new(
        "sondakika-istanbul",
        "https://www.sondakika.com",
        &["/istanbul/"],
        ExtractorKind::Primary,
    );
    regional.trust = 5;
    regional.detail_limit = 10;

    let mut current = SourceConfig::new(
        "sondakika-guncel",
        "https://www.sondakika.com",
        &["/guncel/"],
        ExtractorKind::Primary,
    );
    current.trust = 4;
    current.detail_limit = 10;

    vec![regional, current]
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Unreadable(e.to_string()))
    }

    /// Load from `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_yaml_str(&yaml)?;
        info!(sources = config.sources.len(), "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(config, Config::default());
        let request = config.request.to_request().unwrap();
        assert_eq!(request, AggregationRequest::default());
        assert_eq!(config.sources.len(), 2);
        assert!(config.sources.iter().all(|s| s.extractor == ExtractorKind::Primary));
    }

    #[test]
    fn test_request_block_overrides() {
        let yaml = r#"
request:
  freshness_hours: null
  max_items: 20
  concurrency: 5
  keywords: [istanbul, "kadıköy"]
  task_timeout_secs: 15
  max_attempts: 2
  utc_offset_hours: 0
sources:
  - name: local-paper
    base: https://paper.example.com
    seeds: [/city/]
    trust: 2
    selectors:
      containers: [div.story]
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        let request = config.request.to_request().unwrap();
        assert_eq!(request.freshness_window, None);
        assert_eq!(request.max_items, 20);
        assert_eq!(request.concurrency, 5);
        assert_eq!(request.keywords, vec!["istanbul", "kadıköy"]);
        assert_eq!(request.task_timeout, Duration::from_secs(15));
        assert_eq!(request.fetch.max_attempts, 2);
        assert_eq!(request.fetch.timeout, Duration::from_secs(30));
        assert_eq!(request.utc_offset.local_minus_utc(), 0);

        assert_eq!(config.sources.len(), 1);
        let source = &config.sources[0];
        assert_eq!(source.extractor, ExtractorKind::Generic);
        assert!(source.enabled);
        assert_eq!(source.trust, 2);
        assert_eq!(source.min_title_len, 15);
        assert_eq!(source.selectors.containers, vec!["div.story"]);
        assert_eq!(source.selectors.title[0], "span.title");
    }

    #[test]
    fn test_bad_offset_and_bad_yaml_are_errors() {
        let config = Config::from_yaml_str("request:\n  utc_offset_hours: 99\n").unwrap();
        assert!(matches!(
            config.request.to_request(),
            Err(ConfigError::Unreadable(_))
        ));
        assert!(Config::from_yaml_str("request: [unclosed").is_err());
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = Config::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable(_)));
    }
}
