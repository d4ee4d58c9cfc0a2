//! Forecast cache and acquisition protocol.
//!
//! One reading per `(region, UTC date)` lives in storage. A cache hit is
//! returned as-is; a miss (or a forced refresh) goes out to the region's
//! configured source through the scrape adapter and upserts the result.
//! Before any scrape, an hourly per-region counter bounds load on the
//! upstream source; a spent budget is a capacity condition, not a server
//! fault, and is refused before the scrape happens.
//!
//! Scrape failures are logged with region + URL context and propagated
//! unchanged; the route layer owns the HTTP-level fallback.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{ServiceError, ServiceResult};
use crate::models::{truncate_to_midnight, ForecastReading, Region};
use crate::ports::{ForecastStore, LockService, ScrapeAdapter};

// ---

pub struct ForecastService {
    store: Arc<dyn ForecastStore>,
    scraper: Arc<dyn ScrapeAdapter>,
    locks: Arc<dyn LockService>,
    scrapes_per_hour: i64,
}

impl ForecastService {
    pub fn new(
        store: Arc<dyn ForecastStore>,
        scraper: Arc<dyn ScrapeAdapter>,
        locks: Arc<dyn LockService>,
        scrapes_per_hour: i64,
    ) -> Self {
        Self {
            store,
            scraper,
            locks,
            scrapes_per_hour,
        }
    }

    /// Return the region's reading for `date`, scraping on a miss.
    ///
    /// `force_refresh` bypasses the cache read and overwrites the stored
    /// row with a fresh scrape.
    pub async fn get_forecast(
        &self,
        region: &Region,
        date: DateTime<Utc>,
        force_refresh: bool,
    ) -> ServiceResult<ForecastReading> {
        // ---
        let date = truncate_to_midnight(date);

        if !force_refresh {
            if let Some(existing) = self.store.find_one(&region.id, date).await? {
                tracing::debug!("Forecast cache hit for region {} on {}", region.id, date);
                return Ok(existing);
            }
        }

        self.check_rate_limit(&region.id).await?;

        let scraped = match self.scraper.scrape(&region.source_url, &region.id).await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::error!(
                    "Scrape failed for region {} from {}: {}",
                    region.id,
                    region.source_url,
                    e
                );
                return Err(e);
            }
        };

        // The adapter may hand back a timestamp with a time-of-day from
        // the source page; the storage key is the UTC midnight date.
        let mut reading = scraped;
        reading.date = truncate_to_midnight(reading.date);

        let stored = self.store.upsert(&reading).await?;
        tracing::info!("Stored fresh forecast for region {} on {}", region.id, stored.date);
        Ok(stored)
    }

    /// Cache-only lookup: the stored reading for `(region, date)`, or
    /// `None`. Never scrapes, so overview displays spanning many regions
    /// cannot fan out into upstream load.
    pub async fn peek_forecast(
        &self,
        region_id: &str,
        date: DateTime<Utc>,
    ) -> ServiceResult<Option<ForecastReading>> {
        // ---
        self.store
            .find_one(region_id, truncate_to_midnight(date))
            .await
    }

    /// Hourly per-region scrape budget.
    ///
    /// The calendar-hour window sits in the counter key; the first
    /// increment in a window also arms a one-hour expiry so stale
    /// counters clean themselves up.
    async fn check_rate_limit(&self, region_id: &str) -> ServiceResult<()> {
        // ---
        let window = Utc::now().format("%Y-%m-%dT%H");
        let key = format!("scrape-count:{region_id}:{window}");

        let count = self.locks.increment(&key).await?;
        if count == 1 {
            self.locks.expire(&key, 3600).await?;
        }

        if count > self.scrapes_per_hour {
            tracing::warn!(
                "Scrape rate limit hit for region {}: {} attempts this hour",
                region_id,
                count
            );
            return Err(ServiceError::RateLimited {
                region_id: region_id.to_string(),
            });
        }
        Ok(())
    }
}
