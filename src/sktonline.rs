use std::fmt;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use crate::finder::VideoHost;
use crate::metadata::TitlePair;
use crate::utils::{extract_language_flags, format_display_title, format_quality_label};

static VIDEO_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/video/(\d+)/").expect("valid video path regex"));
static URL_WITH_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://[^/]+)(/.*)$").expect("valid url regex"));
static REPEATED_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/{2,}").expect("valid slash regex"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid title selector"));

const DEFAULT_LABEL: &str = "Unknown";
const STREAM_EXTENSION: &str = ".mp4";

/// Numeric id of a video on the host, as found in `/video/{id}/` links.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A directly playable file, shaped the way the addon expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Video page title, brand line and language flags
    pub title: String,
    /// Branded quality label
    pub name: String,
    /// Direct `.mp4` URL
    pub url: String,
}

/// Search and stream extraction against online.sktorrent.eu.
#[derive(Debug, Clone)]
pub struct SkTorrentClient {
    client: Client,
    config: Arc<ScraperConfig>,
    link_selector: Selector,
    source_selector: Selector,
}

impl SkTorrentClient {
    /// Fails only if one of the configured selectors does not parse.
    pub fn new(client: Client, config: Arc<ScraperConfig>) -> Result<Self> {
        let link_selector = parse_selector(&config.search_link_selector)?;
        let source_selector = parse_selector(&config.source_selector)?;
        Ok(Self {
            client,
            config,
            link_selector,
            source_selector,
        })
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search/videos?search_query={}",
            self.config.host_base(),
            urlencoding::encode(query)
        )
    }

    pub fn video_url(&self, id: &VideoId) -> String {
        format!("{}/video/{}", self.config.host_base(), id)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        debug!(url, %status, "host response");
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl VideoHost for SkTorrentClient {
    async fn search(&self, query: &str) -> Result<Vec<VideoId>> {
        let url = self.search_url(query);
        info!("Searching '{}' at {}", query, url);

        let html = self.fetch(&url).await?;
        let ids = parse_search_results(&html, &self.link_selector);
        info!("Found {} videos", ids.len());
        Ok(ids)
    }

    async fn extract_streams(&self, id: &VideoId, titles: &TitlePair) -> Result<Vec<Stream>> {
        let url = self.video_url(id);
        info!("Loading video details: {}", url);

        let html = self.fetch(&url).await?;
        debug!("First 500 chars of HTML: {}", html.chars().take(500).collect::<String>());

        let page_url = Url::parse(&url)
            .map_err(|e| ScrapeError::Config(format!("bad video url '{url}': {e}")))?;
        let streams = parse_video_page(&html, &page_url, &self.source_selector, &titles.title);
        info!("Found {} streams for video {}", streams.len(), id);
        Ok(streams)
    }
}

fn parse_selector(source: &str) -> Result<Selector> {
    Selector::parse(source).map_err(|e| ScrapeError::Selector {
        selector: source.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Video ids linked from a search result page, in document order.
///
/// Duplicates are kept; links without a numeric `/video/{id}/` segment are skipped.
pub fn parse_search_results(html: &str, link_selector: &Selector) -> Vec<VideoId> {
    let document = Html::parse_document(html);
    let ids: Vec<VideoId> = document
        .select(link_selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| VIDEO_PATH.captures(href))
        .map(|caps| VideoId(caps[1].to_string()))
        .collect();
    ids
}

/// Streams offered by a video detail page.
///
/// Language flags come from this page's own `<title>`. When the page has no
/// title, `fallback_title` is displayed instead and no flags are shown.
pub fn parse_video_page(
    html: &str,
    page_url: &Url,
    source_selector: &Selector,
    fallback_title: &str,
) -> Vec<Stream> {
    let document = Html::parse_document(html);

    let page_title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    debug!("Title text from page: \"{}\"", page_title);
    let flags = extract_language_flags(&page_title);
    debug!(
        "Extracted flags: {}",
        flags.iter().map(|f| f.code()).collect::<Vec<_>>().join(", ")
    );

    let display = if page_title.is_empty() {
        fallback_title
    } else {
        page_title.as_str()
    };

    let mut streams = Vec::new();
    for source in document.select(source_selector) {
        let element = source.value();
        let label = element
            .attr("label")
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LABEL);

        // Source sem src não tem o que tocar
        let Some(raw) = element.attr("src").filter(|s| !s.trim().is_empty()) else {
            debug!("Skipped source without src");
            continue;
        };
        debug!("Raw source tag src: \"{}\"", raw);
        let src = normalize_source(raw.trim(), page_url);
        debug!("Processed source tag src: \"{}\"", src);

        if !src.ends_with(STREAM_EXTENSION) {
            debug!("Skipped stream (not {}): {}", STREAM_EXTENSION, src);
            continue;
        }

        info!("Found stream: {} URL: {}", label, src);
        streams.push(Stream {
            title: format_display_title(display, &flags),
            name: format_quality_label(label),
            url: src,
        });
    }
    streams
}

/// Resolves a `src` attribute against the page and collapses duplicate slashes
/// in the path, leaving the scheme's `//` alone.
pub fn normalize_source(src: &str, page_url: &Url) -> String {
    let lower = src.to_ascii_lowercase();
    // Resolve caminhos relativos contra a página do vídeo
    let absolute = if lower.starts_with("http://") || lower.starts_with("https://") {
        src.to_string()
    } else {
        page_url
            .join(src)
            .map(String::from)
            .unwrap_or_else(|_| src.to_string())
    };
    collapse_slashes(&absolute)
}

fn collapse_slashes(url: &str) -> String {
    match URL_WITH_HOST.captures(url) {
        Some(caps) => format!("{}{}", &caps[1], REPEATED_SLASHES.replace_all(&caps[2], "/")),
        None => url.to_string(),
    }
}
