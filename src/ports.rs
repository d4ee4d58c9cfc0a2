//! Collaborator contracts consumed by the core services.
//!
//! Everything with I/O sits behind one of these traits so the cache and
//! rating protocols can be exercised against in-memory fakes. Production
//! implementations live in `store`, `locks` and `scrape`; all are
//! injected at startup, never reached through globals.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ServiceResult;
use crate::models::{BeachProfile, ForecastReading, GoodRating, Region};

// ---

/// Daily forecast rows keyed by `(region_id, UTC-midnight date)`.
#[async_trait]
pub trait ForecastStore: Send + Sync {
    /// Exact-match lookup. Callers truncate the date before querying.
    async fn find_one(
        &self,
        region_id: &str,
        date: DateTime<Utc>,
    ) -> ServiceResult<Option<ForecastReading>>;

    /// Update-or-insert keyed by the composite; exactly one row survives
    /// per `(region_id, date)` under concurrent writers.
    async fn upsert(&self, reading: &ForecastReading) -> ServiceResult<ForecastReading>;
}

/// Persisted good-beach ratings.
#[async_trait]
pub trait RatingStore: Send + Sync {
    async fn count(&self, region_id: &str, date: DateTime<Utc>) -> ServiceResult<i64>;

    /// Bulk insert that silently skips rows colliding on `(beach_id, date)`.
    async fn insert_many(&self, ratings: &[GoodRating]) -> ServiceResult<u64>;
}

/// Read-only region/beach catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_region(&self, region_id: &str) -> ServiceResult<Option<Region>>;

    async fn list_regions(&self) -> ServiceResult<Vec<Region>>;

    async fn find_beaches(&self, region_id: &str) -> ServiceResult<Vec<BeachProfile>>;
}

/// Distributed lock and counter service.
///
/// Keys are plain strings; values are opaque markers. A lock set with a
/// TTL self-heals if its holder crashes before releasing.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Set-if-absent. Returns true when this caller now holds the lock.
    async fn set_if_absent(&self, key: &str, value: &str, ttl_secs: i64) -> ServiceResult<bool>;

    /// Release a lock. Only call for keys this caller acquired.
    async fn delete(&self, key: &str) -> ServiceResult<()>;

    /// Increment a counter, returning the post-increment value.
    async fn increment(&self, key: &str) -> ServiceResult<i64>;

    /// Bound a counter's lifetime.
    async fn expire(&self, key: &str, secs: i64) -> ServiceResult<()>;
}

/// Turns a raw upstream source page into a structured forecast reading.
///
/// Retry policy, if any, belongs to the adapter; the cache layer calls
/// once and propagates failures unchanged.
#[async_trait]
pub trait ScrapeAdapter: Send + Sync {
    async fn scrape(&self, source_url: &str, region_id: &str) -> ServiceResult<ForecastReading>;
}
