//! HTTP scrape adapter for upstream forecast sources.
//!
//! Fetches a region's configured source URL and extracts one structured
//! wind/swell reading from the JSON payload. Transport and parse
//! failures map to [`ServiceError::Scrape`] with region + URL context;
//! there is no retry here, the caller owns that decision.

use async_trait::async_trait;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{ForecastReading, RawForecast};
use crate::ports::ScrapeAdapter;

// ---

pub struct HttpScrapeAdapter {
    client: reqwest::Client,
}

impl HttpScrapeAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn scrape_error(&self, region_id: &str, source_url: &str, message: String) -> ServiceError {
        ServiceError::Scrape {
            region_id: region_id.to_string(),
            source_url: source_url.to_string(),
            message,
        }
    }
}

impl Default for HttpScrapeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScrapeAdapter for HttpScrapeAdapter {
    async fn scrape(&self, source_url: &str, region_id: &str) -> ServiceResult<ForecastReading> {
        // ---
        tracing::debug!("Scraping forecast for region {} from: {}", region_id, source_url);

        let response: serde_json::Value = self
            .client
            .get(source_url)
            .send()
            .await
            .map_err(|e| self.scrape_error(region_id, source_url, e.to_string()))?
            .json()
            .await
            .map_err(|e| self.scrape_error(region_id, source_url, e.to_string()))?;

        tracing::debug!("Region {} raw response: {}", region_id, response);

        // Sources wrap the reading in a "forecast" envelope; tolerate a
        // bare object too.
        let payload = response.get("forecast").unwrap_or(&response);

        let raw = serde_json::from_value::<RawForecast>(payload.clone()).map_err(|e| {
            tracing::debug!(
                "Failed to parse forecast payload for region {}: {} - Raw payload: {}",
                region_id,
                e,
                payload
            );
            self.scrape_error(region_id, source_url, format!("unparseable payload: {e}"))
        })?;

        Ok(raw.into_reading(region_id))
    }
}
