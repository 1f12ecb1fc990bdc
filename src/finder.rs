//! The lookup pipeline: metadata, queries, search, extraction.
//!
//! Every network call runs strictly one after another. Queries are tried in
//! priority order and the loop stops after the first query whose videos yield
//! at least one stream.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ScraperConfig;
use crate::error::Result;
use crate::metadata::{ImdbClient, TitlePair};
use crate::queries::{Episode, MediaKind, generate_queries};
use crate::sktonline::{SkTorrentClient, Stream, VideoId};

/// Source of catalog titles.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// `Ok(None)` means the id is unknown; `Err` means the provider failed.
    async fn resolve_title(&self, imdb_id: &str) -> Result<Option<TitlePair>>;
}

/// Video site that can be searched and scraped for direct files.
#[async_trait]
pub trait VideoHost: Send + Sync {
    /// Ids of matching videos in result order; empty when nothing matched.
    async fn search(&self, query: &str) -> Result<Vec<VideoId>>;

    /// Playable streams of one video; empty when the page offers none.
    async fn extract_streams(&self, id: &VideoId, titles: &TitlePair) -> Result<Vec<Stream>>;
}

/// One validated lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub imdb_id: String,
    pub kind: MediaKind,
    pub episode: Option<Episode>,
}

/// How the metadata step ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetadataOutcome {
    Resolved { titles: TitlePair },
    NotFound,
    Failed { error: String },
}

/// How the search for one query ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    NoResults,
    Videos { videos: Vec<VideoExtraction> },
    Failed { error: String },
}

/// Result of scraping a single video page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoExtraction {
    pub id: VideoId,
    pub streams: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAttempt {
    pub query: String,
    pub outcome: SearchOutcome,
}

/// Everything a lookup did, in order. Upstream failures end up here instead of
/// aborting the lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeReport {
    pub metadata: MetadataOutcome,
    pub queries: Vec<String>,
    pub attempts: Vec<QueryAttempt>,
    pub streams: Vec<Stream>,
}

impl ScrapeReport {
    fn new(metadata: MetadataOutcome) -> Self {
        Self {
            metadata,
            queries: Vec::new(),
            attempts: Vec::new(),
            streams: Vec::new(),
        }
    }

    /// Number of upstream calls that failed and were treated as empty.
    pub fn failures(&self) -> usize {
        let metadata = usize::from(matches!(self.metadata, MetadataOutcome::Failed { .. }));
        let upstream: usize = self
            .attempts
            .iter()
            .map(|attempt| match &attempt.outcome {
                SearchOutcome::Failed { .. } => 1,
                SearchOutcome::Videos { videos } => videos.iter().filter(|v| v.error.is_some()).count(),
                SearchOutcome::NoResults => 0,
            })
            .sum();
        metadata + upstream
    }
}

/// Drives one lookup through the metadata source and the video host.
#[derive(Clone)]
pub struct StreamFinder {
    metadata: Arc<dyn MetadataSource>,
    host: Arc<dyn VideoHost>,
}

impl StreamFinder {
    pub fn new(metadata: Arc<dyn MetadataSource>, host: Arc<dyn VideoHost>) -> Self {
        Self { metadata, host }
    }

    /// IMDb for metadata, online.sktorrent.eu for videos, one shared HTTP client.
    pub fn from_config(config: Arc<ScraperConfig>) -> Result<Self> {
        let client = config.http_client()?;
        let metadata = ImdbClient::new(client.clone(), Arc::clone(&config));
        let host = SkTorrentClient::new(client, config)?;
        Ok(Self::new(Arc::new(metadata), Arc::new(host)))
    }

    /// Streams for `request`; empty when nothing could be found.
    pub async fn find_streams(&self, request: &LookupRequest) -> Vec<Stream> {
        self.run(request).await.streams
    }

    /// Runs the whole pipeline and returns what happened at each step.
    pub async fn run(&self, request: &LookupRequest) -> ScrapeReport {
        let titles = match self.metadata.resolve_title(&request.imdb_id).await {
            Ok(Some(titles)) => titles,
            Ok(None) => {
                info!(imdb_id = %request.imdb_id, "no metadata, returning no streams");
                return ScrapeReport::new(MetadataOutcome::NotFound);
            }
            Err(e) => {
                warn!(imdb_id = %request.imdb_id, "IMDb scraping failed: {}", e);
                return ScrapeReport::new(MetadataOutcome::Failed {
                    error: e.to_string(),
                });
            }
        };

        let queries = generate_queries(&titles, request.kind, request.episode);
        let mut report = ScrapeReport::new(MetadataOutcome::Resolved {
            titles: titles.clone(),
        });
        report.queries = queries.iter().map(str::to_string).collect();

        for (attempt, query) in queries.iter().enumerate() {
            info!("Attempt {}: '{}'", attempt + 1, query);
            let outcome = self.try_query(query, &titles, &mut report.streams).await;
            report.attempts.push(QueryAttempt {
                query: query.to_string(),
                outcome,
            });
            if !report.streams.is_empty() {
                break;
            }
        }

        info!("Returning {} streams", report.streams.len());
        report
    }

    async fn try_query(&self, query: &str, titles: &TitlePair, found: &mut Vec<Stream>) -> SearchOutcome {
        let ids = match self.host.search(query).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(query, "video search failed: {}", e);
                return SearchOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };
        if ids.is_empty() {
            return SearchOutcome::NoResults;
        }

        let mut videos = Vec::with_capacity(ids.len());
        for id in ids {
            let extraction = match self.host.extract_streams(&id, titles).await {
                Ok(streams) => {
                    let count = streams.len();
                    found.extend(streams);
                    VideoExtraction {
                        id,
                        streams: count,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(video = %id, "loading video details failed: {}", e);
                    VideoExtraction {
                        id,
                        streams: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            videos.push(extraction);
        }
        SearchOutcome::Videos { videos }
    }
}
