use crate::parser::{ParseError, parse_gdp_page};
use crate::types::{ExtractOptions, GdpTable};

use chrono::Utc;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(ScraperError::Client)?;

        Ok(Self { client })
    }

    /// Fetches `url` once and returns the body. Non-2xx statuses are errors.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        log::info!("Fetching URL: {}", url);

        let fetch_err = |source: reqwest::Error| ScraperError::Fetch {
            url: url.to_string(),
            source,
        };

        let html = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))
            .map_err(fetch_err)?
            .error_for_status()
            .map_err(fetch_err)?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))
            .map_err(fetch_err)?;

        log::info!("Page fetched successfully.");
        Ok(html)
    }

    /// Fetches `url` and extracts the GDP table selected by `options`.
    pub async fn fetch_gdp_table(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<GdpTable, ScraperError> {
        let html = self.fetch_page(url).await?;
        let fetched_at = Utc::now();

        let mut table = parse_gdp_page(&html, options)?;
        table.source_url = Some(url.to_string());
        table.fetched_at = Some(fetched_at);

        Ok(table)
    }
}
