use std::sync::Arc;
use std::time::Instant;

use futures::future;
use reqwest::Client;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, InvalidHeaderValue};
use tokio::sync::{AcquireError, Semaphore};

use crate::config::{ConfigError, FetchConfig};
use crate::parser::parse_raw_page;
use crate::types::{PropertyRecord, RawPage, ScrapeOutcome};

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
    #[error("Request limiter closed: {0}")]
    LimiterClosed(#[from] AcquireError),
}

/// Fetches listing pages with at most `concurrency_limit` requests in flight.
#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    config: FetchConfig,
    semaphore: Arc<Semaphore>,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_config(FetchConfig::default())
    }

    pub fn with_config(config: FetchConfig) -> Result<Self, ScraperError> {
        let config = config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)?,
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(config.concurrency_limit)),
            config,
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Loads one page. The returned URL is the final one after redirects.
    pub async fn fetch_page(&self, url: &str) -> Result<RawPage, ScraperError> {
        log::info!("Fetching listing page: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?;

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        Ok(RawPage::new(final_url, html))
    }

    pub async fn scrape_property(&self, url: &str) -> Result<PropertyRecord, ScraperError> {
        let _permit = self.semaphore.acquire().await?;
        let page = self.fetch_page(url).await?;
        Ok(parse_raw_page(&page, self.config.reference_year))
    }

    /// Scrapes every URL concurrently. Outcomes are in input order; a failed URL
    /// becomes a [`ScrapeOutcome::Failure`] instead of aborting the batch.
    pub async fn scrape_all<S: AsRef<str>>(&self, urls: &[S]) -> Vec<ScrapeOutcome> {
        let started = Instant::now();
        log::info!(
            "Scraping {} listing(s), up to {} at a time...",
            urls.len(),
            self.config.concurrency_limit
        );

        let outcomes = future::join_all(urls.iter().map(|url| async move {
            let url = url.as_ref();
            match self.scrape_property(url).await {
                Ok(record) => ScrapeOutcome::Success(record),
                Err(e) => {
                    log::warn!("Failed to scrape {}: {}", url, e);
                    ScrapeOutcome::Failure {
                        url: url.to_string(),
                        error: e.to_string(),
                    }
                }
            }
        }))
        .await;

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        log::info!(
            "Scraped {} listing(s) ({} failed) in {:.2?}",
            outcomes.len() - failed,
            failed,
            started.elapsed()
        );
        outcomes
    }
}
