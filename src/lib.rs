//! # Regional News
//!
//! Aggregates news items about one region from several independently
//! formatted websites, filters them for topical relevance and recency,
//! removes duplicates and near-duplicates across sources, and ranks what is
//! left for editorial use.
//!
//! ## Architecture
//!
//! The pipeline, leaf modules first:
//! 1. [`normalize`]: entity decoding, whitespace cleanup, label stripping, date parsing
//! 2. [`fetch`]: HTTP GET with a browser-like identity, retries and backoff
//! 3. [`scrapers`]: the primary-site extractor and the generic selector-chain extractor
//! 4. [`filter`]: keyword relevance and freshness window
//! 5. [`dedup`]: identity and word-set Jaccard near-duplicate suppression
//! 6. [`rank`]: trust + recency + richness scoring, stable sort
//! 7. [`aggregator`]: bounded-concurrency fan-out with per-source deadlines
//!
//! ## Usage
//!
//! ```no_run
//! use regional_news::{Aggregator, AggregationRequest, PreviousItemSet, default_sources};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let request = AggregationRequest::default();
//! let mut aggregator = Aggregator::http(&request.fetch)?;
//! let digest = aggregator
//!     .run(&request, &default_sources(), &PreviousItemSet::new())
//!     .await?;
//! println!("{} items", digest.stats.total);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod outputs;
pub mod rank;
pub mod scrapers;
pub mod utils;

pub use aggregator::{Aggregator, RunState};
pub use config::{Config, default_sources};
pub use error::{AggregateError, ConfigError, FetchError, Rejection, SourceError};
pub use fetch::{HttpFetcher, PageFetcher, RetryFetch};
pub use models::{
    AggregationRequest, Digest, ExtractorKind, NewsItem, PreviousItemSet, Published, RunStats,
    SourceConfig,
};
