//! The orchestrator: fan out one query to every source of a region, absorb
//! per-source failures, then merge, dedupe, rank, and truncate.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pricescout_core::{
    AppConfig, PriceOffer, Region, RegionCatalog, SourceDescriptor, SourceQuery,
};
use serde::Serialize;
use tokio::task::JoinSet;

use crate::error::SearchError;
use crate::extract::extract_offers;
use crate::fetch::Fetcher;

/// Engine-wide limits, usually taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Per-source task timeout unless a descriptor sets its own.
    pub source_timeout: Duration,
    /// Overall deadline after which pending sources are abandoned.
    pub deadline: Option<Duration>,
    /// Upper bound accepted for `max_results`.
    pub max_results_limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            source_timeout: Duration::from_secs(25),
            deadline: Some(Duration::from_secs(40)),
            max_results_limit: 20,
        }
    }
}

impl From<&AppConfig> for SearchOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            source_timeout: Duration::from_secs(config.source_timeout_secs),
            deadline: (config.search_deadline_secs > 0)
                .then(|| Duration::from_secs(config.search_deadline_secs)),
            max_results_limit: config.max_results_limit,
        }
    }
}

/// One search as submitted by a caller.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    /// Region code, e.g. `us`. Parsed case-insensitively.
    pub region: String,
    /// Result cap, also used as the per-source extraction quota.
    pub max_results: usize,
    /// Restrict the search to these source ids. Unknown ids are ignored.
    pub sources: Option<Vec<String>>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>, region: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            region: region.into(),
            max_results,
            sources: None,
        }
    }

    #[must_use]
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = Some(sources);
        self
    }
}

/// What happened to one source during a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Ok { offers: usize },
    Empty,
    Failed { reason: String },
    TimedOut,
    DeadlineExceeded,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source_id: String,
    #[serde(flatten)]
    pub status: SourceStatus,
    pub elapsed_ms: u64,
}

/// Ranked result of one search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub region: Region,
    /// Deduplicated, sorted ascending by price, at most `max_results` long.
    pub offers: Vec<PriceOffer>,
    pub total: usize,
    pub elapsed_ms: u64,
    /// Every source that was contacted, in priority order.
    pub sources_searched: Vec<String>,
    /// Sources that returned at least one offer, in priority order.
    pub sources_used: Vec<String>,
    pub source_reports: Vec<SourceReport>,
}

enum SourceResult {
    Offers(Vec<PriceOffer>),
    Failed(String),
    TimedOut,
    DeadlineExceeded,
}

/// Runs searches against a frozen [`RegionCatalog`] through one [`Fetcher`].
pub struct SearchEngine {
    catalog: Arc<RegionCatalog>,
    fetcher: Arc<dyn Fetcher>,
    options: SearchOptions,
}

impl SearchEngine {
    #[must_use]
    pub fn new(catalog: Arc<RegionCatalog>, fetcher: Arc<dyn Fetcher>, options: SearchOptions) -> Self {
        Self {
            catalog,
            fetcher,
            options,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Search every selected source of the request's region concurrently.
    ///
    /// Source failures never fail the search; they show up in
    /// [`SearchOutcome::source_reports`] and as missing offers.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] for input errors, before any source is contacted.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchOutcome, SearchError> {
        let started = Instant::now();
        let text = request.query.trim();
        if text.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let region = Region::from_str(&request.region)?;
        if request.max_results == 0 || request.max_results > self.options.max_results_limit {
            return Err(SearchError::InvalidMaxResults {
                max_results: request.max_results,
                limit: self.options.max_results_limit,
            });
        }

        let profile = self.catalog.profile(region)?;
        let sources = select_sources(&profile.sources, request.sources.as_deref())?;
        let query = SourceQuery::new(
            text,
            region,
            request.max_results,
            profile.locale.as_str(),
            profile.currency.as_str(),
        );

        tracing::info!(
            query = text,
            region = %region,
            sources = sources.len(),
            max_results = request.max_results,
            "starting search"
        );

        let results = self.fan_out(&query, &sources).await;

        let mut source_reports = Vec::with_capacity(sources.len());
        let mut sources_used = Vec::new();
        let mut merged = Vec::new();
        for (source, (result, elapsed)) in sources.iter().zip(results) {
            let status = match result {
                SourceResult::Offers(offers) if offers.is_empty() => SourceStatus::Empty,
                SourceResult::Offers(offers) => {
                    sources_used.push(source.id.clone());
                    let count = offers.len();
                    merged.extend(offers);
                    SourceStatus::Ok { offers: count }
                }
                SourceResult::Failed(reason) => SourceStatus::Failed { reason },
                SourceResult::TimedOut => SourceStatus::TimedOut,
                SourceResult::DeadlineExceeded => SourceStatus::DeadlineExceeded,
            };
            source_reports.push(SourceReport {
                source_id: source.id.clone(),
                status,
                elapsed_ms: millis(elapsed),
            });
        }

        let offers = rank_offers(merged, request.max_results);
        let elapsed_ms = millis(started.elapsed());

        tracing::info!(
            query = text,
            region = %region,
            results = offers.len(),
            sources_used = sources_used.len(),
            elapsed_ms,
            "search finished"
        );

        Ok(SearchOutcome {
            query: text.to_string(),
            region,
            total: offers.len(),
            offers,
            elapsed_ms,
            sources_searched: sources.iter().map(|s| s.id.clone()).collect(),
            sources_used,
            source_reports,
        })
    }

    /// Run fetch-then-extract for every source on its own task.
    ///
    /// Returns one result per source, in priority order.
    async fn fan_out(
        &self,
        query: &SourceQuery,
        sources: &[SourceDescriptor],
    ) -> Vec<(SourceResult, Duration)> {
        let started = Instant::now();
        let deadline = self
            .options
            .deadline
            .map(|d| tokio::time::Instant::now() + d);
        let mut tasks = JoinSet::new();

        for (priority, source) in sources.iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let query = query.clone();
            let source = source.clone();
            let timeout = source.timeout(self.options.source_timeout);
            tasks.spawn(async move {
                let started = Instant::now();
                let result = run_source(fetcher.as_ref(), &query, &source, timeout).await;
                (priority, result, started.elapsed())
            });
        }

        let mut slots: Vec<Option<(SourceResult, Duration)>> =
            std::iter::repeat_with(|| None).take(sources.len()).collect();
        let mut deadline_hit = false;

        loop {
            let next = if let Some(at) = deadline {
                let waited = tokio::time::timeout_at(at, tasks.join_next()).await;
                if let Ok(next) = waited {
                    next
                } else {
                    tracing::warn!(
                        pending = tasks.len(),
                        "search deadline reached, abandoning pending sources"
                    );
                    tasks.abort_all();
                    deadline_hit = true;
                    break;
                }
            } else {
                tasks.join_next().await
            };
            match next {
                Some(Ok((priority, result, elapsed))) => slots[priority] = Some((result, elapsed)),
                Some(Err(e)) => tracing::warn!(error = %e, "source task did not complete"),
                None => break,
            }
        }

        let abandoned_after = started.elapsed();
        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    let result = if deadline_hit {
                        SourceResult::DeadlineExceeded
                    } else {
                        SourceResult::Failed("source task did not complete".to_string())
                    };
                    (result, abandoned_after)
                })
            })
            .collect()
    }
}

async fn run_source(
    fetcher: &dyn Fetcher,
    query: &SourceQuery,
    source: &SourceDescriptor,
    timeout: Duration,
) -> SourceResult {
    let resolved = source.with_region_defaults(query.locale(), query.currency());
    let source = &*resolved;
    let raw = match tokio::time::timeout(timeout, fetcher.fetch(query, source)).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            tracing::warn!(source = %source.id, error = %e, "source fetch failed");
            return SourceResult::Failed(e.to_string());
        }
        Err(_) => {
            tracing::warn!(
                source = %source.id,
                timeout_ms = millis(timeout),
                "source timed out"
            );
            return SourceResult::TimedOut;
        }
    };

    let report = extract_offers(source, &raw, query.max_results());
    tracing::debug!(
        source = %source.id,
        count = report.offers.len(),
        skipped = report.skipped.len(),
        "source extraction finished"
    );
    SourceResult::Offers(report.offers)
}

/// Apply the optional id filter, keeping catalog priority order.
fn select_sources(
    available: &[SourceDescriptor],
    requested: Option<&[String]>,
) -> Result<Vec<SourceDescriptor>, SearchError> {
    let wanted: HashSet<String> = requested
        .unwrap_or_default()
        .iter()
        .map(|id| id.trim().to_ascii_lowercase())
        .filter(|id| !id.is_empty())
        .collect();
    if wanted.is_empty() {
        return Ok(available.to_vec());
    }

    let selected: Vec<SourceDescriptor> = available
        .iter()
        .filter(|s| wanted.contains(&s.id))
        .cloned()
        .collect();
    if selected.is_empty() {
        let mut requested: Vec<String> = wanted.into_iter().collect();
        requested.sort();
        return Err(SearchError::NoMatchingSources {
            requested: requested.join(","),
            available: available
                .iter()
                .map(|s| s.id.as_str())
                .collect::<Vec<_>>()
                .join(","),
        });
    }
    Ok(selected)
}

/// Dedupe by product key (first in merge order wins), stable-sort by price,
/// then truncate.
fn rank_offers(merged: Vec<PriceOffer>, max_results: usize) -> Vec<PriceOffer> {
    let mut seen = HashSet::new();
    let mut offers: Vec<PriceOffer> = merged
        .into_iter()
        .filter(|offer| seen.insert(offer.dedup_key()))
        .collect();
    offers.sort_by_key(PriceOffer::price);
    offers.truncate(max_results);
    offers
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
