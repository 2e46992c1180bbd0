//! Error taxonomy for the aggregation engine.
//!
//! Only [`AggregateError`] ever reaches the caller of a run. Everything that
//! can go wrong inside a single source is converted into a per-source outcome
//! and reported through the run statistics instead.

use thiserror::Error;

/// A single HTTP GET that did not produce a body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: usize,
        #[source]
        last: Box<FetchError>,
    },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else if err.is_body() || err.is_decode() {
            FetchError::Body(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// A source whose configuration cannot be used for this run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("source `{0}` has no seed URL")]
    NoSeeds(String),

    #[error("source `{source_name}` has an invalid URL `{url}`: {reason}")]
    InvalidUrl {
        source_name: String,
        url: String,
        reason: String,
    },

    #[error("source `{source_name}` has an invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        source_name: String,
        selector: String,
        reason: String,
    },

    #[error("could not read configuration: {0}")]
    Unreadable(String),
}

/// Why a whole source contributed nothing to a run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source is misconfigured: {0}")]
    Configuration(#[from] ConfigError),

    #[error("fetching {url} failed: {error}")]
    Network { url: String, error: FetchError },

    #[error("all {0} seed URLs failed")]
    AllSeedsFailed(usize),
}

/// Why one listing entry was not turned into a candidate item.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("no title")]
    MissingTitle,

    #[error("no link")]
    MissingLink,

    #[error("link `{0}` cannot be made absolute")]
    InvalidLink(String),

    #[error("title has {len} chars, minimum is {min}")]
    TitleTooShort { len: usize, min: usize },
}

/// Fatal errors: contract violations detected before any work is dispatched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("invalid aggregation request: {0}")]
    InvalidRequest(String),
}
