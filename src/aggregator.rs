//! The aggregation run: Fetch → Extract → Filter → Dedup → Rank.
//!
//! ```text
//! Idle ──validate──▶ Dispatching ──▶ Collecting ──▶ Deduplicating ──▶ Ranking ──▶ Done
//! ```
//!
//! One task per enabled source runs under a bounded concurrency budget
//! (`buffer_unordered`). Each task owns its results and is cut off by a hard
//! deadline. Nothing a single source does can fail the run: every task settles
//! into a [`SourceOutcome`] and the merge, dedup and ranking stages run on one
//! thread after all tasks have settled.

use crate::dedup::deduplicate;
use crate::error::{AggregateError, FetchError, SourceError};
use crate::fetch::{HttpFetcher, PageFetcher, RetryFetch, http_fetcher};
use crate::filter::{is_fresh, is_relevant};
use crate::models::{
    AggregationRequest, Digest, FetchSettings, ItemStatus, NewsItem, PreviousItemSet, RunStats,
    SourceConfig, SourceOutcome, SourceReport,
};
use crate::rank::{TrustTable, rank};
use crate::scrapers::{self, ExtractContext, PreparedSource, Strategy, detail};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tokio::time::timeout_at;
use tracing::{debug, info, instrument, warn};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Dispatching,
    Collecting,
    Deduplicating,
    Ranking,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Dispatching => "dispatching",
            RunState::Collecting => "collecting",
            RunState::Deduplicating => "deduplicating",
            RunState::Ranking => "ranking",
            RunState::Done => "done",
        };
        f.write_str(name)
    }
}

fn transition(state: &mut RunState, next: RunState) {
    debug!(from = %state, to = %next, "Run state transition");
    *state = next;
}

/// What one source task hands back to the merge stage.
#[derive(Debug)]
struct SourceResult {
    index: usize,
    report: SourceReport,
    items: Vec<NewsItem>,
    irrelevant: usize,
    stale: usize,
}

impl SourceResult {
    fn empty(index: usize, name: &str, outcome: SourceOutcome) -> Self {
        Self {
            index,
            report: SourceReport::empty(name, outcome),
            items: Vec::new(),
            irrelevant: 0,
            stale: 0,
        }
    }
}

/// Runs aggregations with a given page fetcher.
#[derive(Debug)]
pub struct Aggregator<F> {
    fetcher: F,
    state: RunState,
    now: Option<DateTime<Utc>>,
}

impl Aggregator<RetryFetch<HttpFetcher>> {
    /// An aggregator fetching over HTTP with retries.
    pub fn http(settings: &FetchSettings) -> Result<Self, FetchError> {
        Ok(Self::new(http_fetcher(settings)?))
    }
}

impl<F: PageFetcher> Aggregator<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            state: RunState::Idle,
            now: None,
        }
    }

    /// Pin the clock used for date parsing, freshness and recency.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run one aggregation.
    ///
    /// # Arguments
    ///
    /// * `request` - Filters, limits, deadlines and fetch settings
    /// * `sources` - Every configured source, disabled ones included
    /// * `previous` - URLs and ids from earlier runs, for status tagging
    ///
    /// # Returns
    ///
    /// The ranked [`Digest`]. Only a malformed request is an error;
    /// source-level trouble shows up in [`RunStats::sources`].
    #[instrument(level = "info", skip_all, fields(sources = sources.len()))]
    pub async fn run(
        &mut self,
        request: &AggregationRequest,
        sources: &[SourceConfig],
        previous: &PreviousItemSet,
    ) -> Result<Digest, AggregateError> {
        let Self {
            fetcher,
            state,
            now: clock,
        } = self;
        *state = RunState::Idle;
        request.validate()?;

        let started = Instant::now();
        let now = clock.unwrap_or_else(Utc::now);
        let ctx = ExtractContext {
            now,
            offset: request.utc_offset,
        };

        transition(state, RunState::Dispatching);
        let mut settled: Vec<SourceResult> = Vec::new();
        let mut dispatch: Vec<(usize, PreparedSource)> = Vec::new();
        let mut trust = TrustTable::default();
        for (index, config) in sources.iter().enumerate() {
            if !config.enabled {
                debug!(source = %config.name, "Source disabled");
                settled.push(SourceResult::empty(index, &config.name, SourceOutcome::Disabled));
                continue;
            }
            match scrapers::prepare(config) {
                Ok(prepared) => {
                    trust.insert(&prepared.name, prepared.trust);
                    dispatch.push((index, prepared));
                }
                Err(e) => {
                    let e = SourceError::from(e);
                    warn!(source = %config.name, error = %e, "Skipping source");
                    settled.push(SourceResult::empty(
                        index,
                        &config.name,
                        SourceOutcome::Skipped(e.to_string()),
                    ));
                }
            }
        }
        info!(
            dispatched = dispatch.len(),
            concurrency = request.concurrency,
            "Dispatching source tasks"
        );

        transition(state, RunState::Collecting);
        let fetcher = &*fetcher;
        let completed: Vec<SourceResult> = stream::iter(dispatch)
            .map(|(index, source)| run_with_deadline(fetcher, index, source, &ctx, request))
            .buffer_unordered(request.concurrency)
            .collect()
            .await;

        // Completion order decides which duplicate survives.
        let mut stats = RunStats::default();
        let mut merged: Vec<NewsItem> = Vec::new();
        for result in completed {
            stats.irrelevant += result.irrelevant;
            stats.stale += result.stale;
            merged.extend(result.items);
            settled.push(SourceResult {
                items: Vec::new(),
                ..result
            });
        }

        transition(state, RunState::Deduplicating);
        let deduplicated = deduplicate(merged);
        stats.duplicates_removed = deduplicated.removed();
        debug!(
            identical = deduplicated.identical,
            near = deduplicated.near,
            "Removed duplicates"
        );

        transition(state, RunState::Ranking);
        let mut items = rank(deduplicated.items, &trust, now);
        items.truncate(request.max_items);
        for item in &mut items {
            item.status = if previous.contains(item) {
                ItemStatus::Seen
            } else {
                ItemStatus::New
            };
        }

        stats.total = items.len();
        stats.seen = items
            .iter()
            .filter(|i| i.status == ItemStatus::Seen)
            .count();
        stats.new = stats.total - stats.seen;
        stats.per_source = per_source_counts(sources, &items);
        settled.sort_by_key(|r| r.index);
        stats.sources = settled.into_iter().map(|r| r.report).collect();
        stats.elapsed_ms = started.elapsed().as_millis() as u64;

        transition(state, RunState::Done);
        info!(
            total = stats.total,
            new = stats.new,
            seen = stats.seen,
            duplicates_removed = stats.duplicates_removed,
            irrelevant = stats.irrelevant,
            stale = stats.stale,
            elapsed_ms = stats.elapsed_ms,
            "Aggregation complete"
        );

        Ok(Digest {
            generated_at: now,
            items,
            stats,
        })
    }
}

fn per_source_counts(sources: &[SourceConfig], items: &[NewsItem]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> =
        sources.iter().map(|s| (s.name.clone(), 0)).collect();
    for item in items {
        *counts.entry(item.source_name.clone()).or_default() += 1;
    }
    counts
}

/// Run one source task under the request's hard deadline.
async fn run_with_deadline<F: PageFetcher>(
    fetcher: &F,
    index: usize,
    source: PreparedSource,
    ctx: &ExtractContext,
    request: &AggregationRequest,
) -> SourceResult {
    let name = source.name.clone();
    let deadline = tokio::time::Instant::now() + request.task_timeout;
    let task = run_source(fetcher, index, source, ctx, request, deadline);
    match timeout_at(deadline, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!(source = %name, error = %e, "Source failed; contributing no items");
            SourceResult::empty(index, &name, SourceOutcome::Failed(e.to_string()))
        }
        Err(_) => {
            warn!(
                source = %name,
                timeout_ms = request.task_timeout.as_millis() as u64,
                "Source timed out; contributing no items"
            );
            SourceResult::empty(index, &name, SourceOutcome::TimedOut)
        }
    }
}

/// Fetch every seed of a source, extract, enrich and filter.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
async fn run_source<F: PageFetcher>(
    fetcher: &F,
    index: usize,
    source: PreparedSource,
    ctx: &ExtractContext,
    request: &AggregationRequest,
    deadline: tokio::time::Instant,
) -> Result<SourceResult, SourceError> {
    let mut items: Vec<NewsItem> = Vec::new();
    let mut rejected = 0usize;
    let mut last_failure: Option<(String, FetchError)> = None;
    let mut fetched = 0usize;

    for seed in &source.seeds {
        match fetcher.fetch(seed.as_str()).await {
            Ok(page) => {
                fetched += 1;
                let extraction = scrapers::extract(&page, seed, &source, ctx);
                debug!(
                    %seed,
                    items = extraction.items.len(),
                    rejected = extraction.rejected.len(),
                    "Extracted seed page"
                );
                rejected += extraction.rejected.len();
                items.extend(extraction.items);
            }
            Err(e) => {
                warn!(%seed, error = %e, "Seed fetch failed; trying next seed");
                last_failure = Some((seed.to_string(), e));
            }
        }
    }

    if fetched == 0 {
        return Err(match (source.seeds.len(), last_failure) {
            (1, Some((url, error))) => SourceError::Network { url, error },
            (n, _) => SourceError::AllSeedsFailed(n),
        });
    }

    if matches!(source.strategy, Strategy::Primary) && source.detail_limit > 0 {
        // Stop early enough that the listing items still make it out.
        let enrich_by = deadline - request.task_timeout / 10;
        items = detail::enrich(fetcher, items, source.detail_limit, enrich_by).await;
    }

    let extracted = items.len();
    let mut irrelevant = 0usize;
    let mut stale = 0usize;
    items.retain(|item| {
        if !is_relevant(&item.title, &item.summary, &item.content, &request.keywords) {
            irrelevant += 1;
            return false;
        }
        if let Some(window) = request.freshness_window {
            if !is_fresh(&item.published_at, window, ctx.now) {
                stale += 1;
                return false;
            }
        }
        true
    });

    info!(extracted, rejected, kept = items.len(), irrelevant, stale, "Source finished");
    Ok(SourceResult {
        index,
        report: SourceReport {
            name: source.name.clone(),
            outcome: SourceOutcome::Completed,
            extracted,
            rejected,
            kept: items.len(),
        },
        items,
        irrelevant,
        stale,
    })
}
