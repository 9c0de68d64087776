//! Fetch, extract and merge arrivals across all configured feed sources.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::announce;
use crate::arrivals::{ArrivalRecord, Direction, FetchOutcome, aggregate, extract_arrivals};
use crate::error::{FetchFailure, PipelineError};
use crate::fetch::{HttpClient, fetch_bytes};
use crate::parser::parse_feed;

/// A named GTFS-RT feed, e.g. the `ACE` line group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub tag: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(tag: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            url: url.into(),
        }
    }
}

/// Produces one decoded snapshot per call. Implementations log and return
/// failures instead of raising them.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> FetchOutcome;
}

/// Fetches feeds over HTTP, or from disk for non-`http` locations.
pub struct HttpFeedFetcher<C> {
    client: C,
}

impl<C: HttpClient> HttpFeedFetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: HttpClient> FeedFetcher for HttpFeedFetcher<C> {
    #[tracing::instrument(skip(self, source), fields(source_tag = %source.tag))]
    async fn fetch(&self, source: &FeedSource) -> FetchOutcome {
        let outcome = if source.url.starts_with("http") {
            match fetch_bytes(&self.client, &source.url).await {
                Ok(bytes) => {
                    debug!(bytes = bytes.len(), "Feed bytes received, parsing");
                    parse_feed(&bytes)
                }
                Err(e) => Err(e),
            }
        } else {
            tokio::fs::read(&source.url)
                .await
                .map_err(FetchFailure::from)
                .and_then(|bytes| parse_feed(&bytes))
        };

        match &outcome {
            Ok(feed) => debug!(entity_count = feed.entity.len(), "Feed parsed successfully"),
            Err(e) => error!(url = %source.url, error = %e, "Error fetching feed"),
        }
        outcome
    }
}

/// Fetches every source concurrently and returns the merged, sorted
/// arrivals at `station_id`.
///
/// A source that fails to fetch contributes no arrivals. A fetch task that
/// panics or is cancelled fails the whole collection.
#[tracing::instrument(skip(fetcher, sources), fields(source_count = sources.len()))]
pub async fn collect_arrivals(
    fetcher: Arc<dyn FeedFetcher>,
    sources: &[FeedSource],
    station_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<ArrivalRecord>, PipelineError> {
    if sources.is_empty() {
        return Err(PipelineError::NoSources);
    }

    let tasks: Vec<_> = sources
        .iter()
        .cloned()
        .map(|source| {
            let fetcher = fetcher.clone();
            tokio::spawn(async move {
                let outcome = fetcher.fetch(&source).await;
                (source, outcome)
            })
        })
        .collect();

    let mut per_source = Vec::with_capacity(tasks.len());
    for (task, source) in tasks.into_iter().zip(sources) {
        let (source, outcome) = task.await.map_err(|e| PipelineError::TaskFailed {
            source_tag: source.tag.clone(),
            message: e.to_string(),
        })?;
        let records = extract_arrivals(&outcome, station_id, &source.tag, now);
        if outcome.is_err() {
            warn!(source = %source.tag, "Source contributed no arrivals");
        } else {
            debug!(source = %source.tag, arrivals = records.len(), "Arrivals extracted");
        }
        per_source.push(records);
    }

    Ok(aggregate(per_source))
}

/// Collects arrivals and composes the announcement for `filter`, with
/// source lines announced in the order of `sources`. `None` when nothing
/// matches.
pub async fn compose_announcement(
    fetcher: Arc<dyn FeedFetcher>,
    sources: &[FeedSource],
    station_id: &str,
    spoken_name: &str,
    filter: Option<Direction>,
) -> Result<Option<String>, PipelineError> {
    let arrivals = collect_arrivals(fetcher, sources, station_id, Utc::now()).await?;
    let tags: Vec<&str> = sources.iter().map(|s| s.tag.as_str()).collect();
    Ok(announce::compose_arrivals(&arrivals, &tags, filter, spoken_name))
}
