use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};

pub const DEFAULT_METADATA_URL: &str = "https://www.imdb.com";
pub const DEFAULT_HOST_URL: &str = "https://online.sktorrent.eu";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/114.0.0.0 Safari/537.36";

/// Scraper settings, built once at start-up and shared read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScraperConfig {
    /// Base URL of the title metadata provider
    pub metadata_base_url: String,
    /// Base URL of the video host (search and detail pages)
    pub host_base_url: String,
    /// Headers sent with every upstream request, in order
    pub headers: Vec<(String, String)>,
    /// Anchors on the search page that point to video detail pages
    pub search_link_selector: String,
    /// Media source elements on a video detail page
    pub source_selector: String,
    /// Per-request timeout; `None` leaves it to the caller's deadline
    pub request_timeout_secs: Option<u64>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            metadata_base_url: DEFAULT_METADATA_URL.to_string(),
            host_base_url: DEFAULT_HOST_URL.to_string(),
            headers: default_headers(DEFAULT_HOST_URL),
            search_link_selector: r#"a[href^="/video/"]"#.to_string(),
            source_selector: "video source".to_string(),
            request_timeout_secs: None,
        }
    }
}

// Browser-like header set; the host tends to refuse bare clients.
fn default_headers(referer_base: &str) -> Vec<(String, String)> {
    [
        ("User-Agent", USER_AGENT.to_string()),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8"
                .to_string(),
        ),
        ("Accept-Language", "en-US,en;q=0.9,sk;q=0.8,cs;q=0.7".to_string()),
        ("Connection", "keep-alive".to_string()),
        ("Upgrade-Insecure-Requests", "1".to_string()),
        ("Referer", format!("{}/", referer_base.trim_end_matches('/'))),
        ("DNT", "1".to_string()),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

impl ScraperConfig {
    /// Loads the configuration: defaults, then the JSON file, then the environment.
    ///
    /// An explicit `path` must exist. Without one, the per-user file under the
    /// config directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file; fields it omits keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Applies `SKT_*` overrides taken from `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SKT_METADATA_URL") {
            self.metadata_base_url = url;
        }
        if let Some(url) = lookup("SKT_HOST_URL") {
            // Keep the Referer in step with the host unless it was customised.
            let default_referer = format!("{}/", self.host_base_url.trim_end_matches('/'));
            for (name, value) in self.headers.iter_mut() {
                if name.eq_ignore_ascii_case("referer") && *value == default_referer {
                    *value = format!("{}/", url.trim_end_matches('/'));
                }
            }
            self.host_base_url = url;
        }
        if let Some(secs) = lookup("SKT_TIMEOUT_SECS") {
            let secs = secs
                .trim()
                .parse::<u64>()
                .map_err(|_| ScrapeError::Config(format!("SKT_TIMEOUT_SECS is not a number: {secs}")))?;
            self.request_timeout_secs = Some(secs);
        }
        Ok(())
    }

    /// Checks that both base URLs are absolute http(s) URLs.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("metadata_base_url", &self.metadata_base_url),
            ("host_base_url", &self.host_base_url),
        ] {
            let parsed = url::Url::parse(value)
                .map_err(|e| ScrapeError::Config(format!("{field} '{value}': {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ScrapeError::Config(format!("{field} must be http(s): {value}")));
            }
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ScrapeError::Config("request_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn metadata_base(&self) -> &str {
        self.metadata_base_url.trim_end_matches('/')
    }

    pub fn host_base(&self) -> &str {
        self.host_base_url.trim_end_matches('/')
    }

    /// Turns the configured header list into a `HeaderMap`.
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ScrapeError::Header { name: name.clone() })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| ScrapeError::Header { name: name.clone() })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    /// Builds the HTTP client shared by every upstream component.
    pub fn http_client(&self) -> Result<Client> {
        let mut builder = Client::builder().default_headers(self.header_map()?);
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(builder.build()?)
    }
}

/// `<config_dir>/skt-scraper/config.json`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("skt-scraper");
    path.push("config.json");
    Some(path)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_point_at_public_endpoints() {
        let config = ScraperConfig::default();
        assert_eq!(config.metadata_base(), "https://www.imdb.com");
        assert_eq!(config.host_base(), "https://online.sktorrent.eu");
        assert!(config.validate().is_ok());

        let headers = config.header_map().unwrap();
        assert_eq!(headers.get("referer").unwrap(), "https://online.sktorrent.eu/");
        assert!(headers.get("user-agent").is_some());
    }

    #[test]
    fn env_overrides_replace_urls_and_follow_referer() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SKT_HOST_URL", "http://127.0.0.1:9000/"),
            ("SKT_METADATA_URL", "http://127.0.0.1:9001"),
            ("SKT_TIMEOUT_SECS", "7"),
        ]);
        let mut config = ScraperConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.host_base(), "http://127.0.0.1:9000");
        assert_eq!(config.metadata_base(), "http://127.0.0.1:9001");
        assert_eq!(config.request_timeout_secs, Some(7));
        let referer = config
            .headers
            .iter()
            .find(|(name, _)| name == "Referer")
            .map(|(_, value)| value.as_str());
        assert_eq!(referer, Some("http://127.0.0.1:9000/"));
    }

    #[test]
    fn bad_timeout_override_is_rejected() {
        let mut config = ScraperConfig::default();
        let err = config
            .apply_env_overrides(|key| (key == "SKT_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = std::env::temp_dir().join(format!("skt-scraper-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, r#"{ "host_base_url": "http://localhost:8080", "source_selector": "div.player source" }"#)
            .unwrap();

        let config = ScraperConfig::from_file(&path).unwrap();
        assert_eq!(config.host_base(), "http://localhost:8080");
        assert_eq!(config.source_selector, "div.player source");
        assert_eq!(config.metadata_base(), DEFAULT_METADATA_URL);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn non_http_urls_fail_validation() {
        let config = ScraperConfig {
            host_base_url: "ftp://example.com".to_string(),
            ..ScraperConfig::default()
        };
        assert!(matches!(config.validate(), Err(ScrapeError::Config(_))));
    }

    #[test]
    fn invalid_header_name_is_reported() {
        let config = ScraperConfig {
            headers: vec![("Bad Header".to_string(), "x".to_string())],
            ..ScraperConfig::default()
        };
        assert!(matches!(config.header_map(), Err(ScrapeError::Header { .. })));
    }
}
