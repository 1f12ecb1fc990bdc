use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use crate::finder::MetadataSource;
use crate::utils::decode_html_entities;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid title selector"));
static LD_JSON_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid ld+json selector")
});

/// Display title plus the alternate ("original") title of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitlePair {
    pub title: String,
    pub original_title: String,
}

/// Resolves IMDb ids to titles by scraping the public title page.
#[derive(Debug, Clone)]
pub struct ImdbClient {
    client: Client,
    config: Arc<ScraperConfig>,
}

impl ImdbClient {
    pub fn new(client: Client, config: Arc<ScraperConfig>) -> Self {
        Self { client, config }
    }

    pub fn title_url(&self, imdb_id: &str) -> String {
        format!("{}/title/{}/", self.config.metadata_base(), imdb_id)
    }
}

#[async_trait]
impl MetadataSource for ImdbClient {
    /// `Ok(None)` when the page does not exist or carries no usable title.
    async fn resolve_title(&self, imdb_id: &str) -> Result<Option<TitlePair>> {
        let url = self.title_url(imdb_id);
        info!("IMDb request: {}", url);

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            warn!(imdb_id, "IMDb page does not exist (404)");
            return Ok(None);
        }
        if status != StatusCode::OK {
            return Err(ScrapeError::Status { url, status });
        }

        let html = resp.text().await?;
        let titles = parse_title_page(&html);
        match &titles {
            Some(t) => info!("IMDb title: {}, original: {}", t.title, t.original_title),
            None => warn!(imdb_id, "IMDb page has no usable <title>"),
        }
        Ok(titles)
    }
}

/// Pulls the titles out of a title page.
///
/// The display title is the `<title>` text up to the first " - ". The original
/// title comes from the JSON-LD `name` when present, else it equals the display
/// title. A broken JSON-LD block is ignored rather than failing the page.
pub fn parse_title_page(html: &str) -> Option<TitlePair> {
    let document = Html::parse_document(html);

    let raw = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>())?;
    // Corta o sufixo " - IMDb"
    let head = raw.split(" - ").next().unwrap_or_default();
    let title = decode_html_entities(head.trim()).trim().to_string();
    if title.is_empty() {
        return None;
    }

    let original_title = document
        .select(&LD_JSON_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>())
        .and_then(|json| serde_json::from_str::<serde_json::Value>(&json).ok())
        .and_then(|value| value.get("name").and_then(|n| n.as_str()).map(str::to_string))
        .map(|name| decode_html_entities(name.trim()))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| title.clone());

    Some(TitlePair {
        title,
        original_title,
    })
}
