//! In-memory fakes for the collaborator ports, shared by the protocol
//! tests in `forecast` and `ratings`. Compiled for tests only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{BeachProfile, Band, ForecastReading, GoodRating, Region};
use crate::ports::{Catalog, ForecastStore, LockService, RatingStore, ScrapeAdapter};

// ---

/// Lock service backed by a plain mutex-guarded map, with real TTL
/// bookkeeping so expiry behavior can be tested without a database.
#[derive(Default)]
pub struct MemoryLockService {
    locks: Mutex<HashMap<String, (String, Instant)>>,
    counters: Mutex<HashMap<String, i64>>,
}

#[async_trait]
impl LockService for MemoryLockService {
    async fn set_if_absent(&self, key: &str, value: &str, ttl_secs: i64) -> ServiceResult<bool> {
        // ---
        let mut locks = self.locks.lock().unwrap();
        let now = Instant::now();

        // Expired rows are swept on acquire, like the Postgres service
        locks.retain(|_, (_, expires)| *expires > now);

        if locks.contains_key(key) {
            return Ok(false);
        }
        locks.insert(
            key.to_string(),
            (value.to_string(), now + Duration::from_secs(ttl_secs as u64)),
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> ServiceResult<()> {
        self.locks.lock().unwrap().remove(key);
        Ok(())
    }

    async fn increment(&self, key: &str) -> ServiceResult<i64> {
        let mut counters = self.counters.lock().unwrap();
        let count = counters.entry(key.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn expire(&self, _key: &str, _secs: i64) -> ServiceResult<()> {
        Ok(())
    }
}

impl MemoryLockService {
    pub fn holds(&self, key: &str) -> bool {
        self.locks.lock().unwrap().contains_key(key)
    }
}

// ---

#[derive(Default)]
pub struct MemoryForecastStore {
    rows: Mutex<HashMap<(String, DateTime<Utc>), ForecastReading>>,
}

#[async_trait]
impl ForecastStore for MemoryForecastStore {
    async fn find_one(
        &self,
        region_id: &str,
        date: DateTime<Utc>,
    ) -> ServiceResult<Option<ForecastReading>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&(region_id.to_string(), date)).cloned())
    }

    async fn upsert(&self, reading: &ForecastReading) -> ServiceResult<ForecastReading> {
        let mut rows = self.rows.lock().unwrap();
        rows.insert(
            (reading.region_id.clone(), reading.date),
            reading.clone(),
        );
        Ok(reading.clone())
    }
}

// ---

#[derive(Default)]
pub struct MemoryRatingStore {
    rows: Mutex<HashMap<(String, DateTime<Utc>), GoodRating>>,
    pub insert_calls: AtomicUsize,
    pub fail_inserts: AtomicBool,
}

#[async_trait]
impl RatingStore for MemoryRatingStore {
    async fn count(&self, region_id: &str, date: DateTime<Utc>) -> ServiceResult<i64> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|r| r.region_id == region_id && r.date == date)
            .count() as i64)
    }

    async fn insert_many(&self, ratings: &[GoodRating]) -> ServiceResult<u64> {
        // ---
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(ServiceError::Storage(sqlx::Error::PoolTimedOut));
        }

        let mut rows = self.rows.lock().unwrap();
        let mut inserted = 0;
        for rating in ratings {
            let key = (rating.beach_id.clone(), rating.date);
            if !rows.contains_key(&key) {
                rows.insert(key, rating.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

impl MemoryRatingStore {
    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

// ---

pub struct MemoryCatalog {
    pub regions: Vec<Region>,
    pub beaches: Vec<BeachProfile>,
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn find_region(&self, region_id: &str) -> ServiceResult<Option<Region>> {
        Ok(self.regions.iter().find(|r| r.id == region_id).cloned())
    }

    async fn list_regions(&self) -> ServiceResult<Vec<Region>> {
        Ok(self.regions.clone())
    }

    async fn find_beaches(&self, region_id: &str) -> ServiceResult<Vec<BeachProfile>> {
        Ok(self
            .beaches
            .iter()
            .filter(|b| b.region_id == region_id)
            .cloned()
            .collect())
    }
}

// ---

/// Scrape adapter returning a canned reading and counting invocations.
pub struct CountingScraper {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl Default for CountingScraper {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ScrapeAdapter for CountingScraper {
    async fn scrape(&self, source_url: &str, region_id: &str) -> ServiceResult<ForecastReading> {
        // ---
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Scrape {
                region_id: region_id.to_string(),
                source_url: source_url.to_string(),
                message: "source unreachable".to_string(),
            });
        }
        Ok(offshore_reading(region_id))
    }
}

// ---

pub fn test_region(id: &str) -> Region {
    Region {
        id: id.to_string(),
        name: id.to_string(),
        source_url: format!("http://surf.example/{id}"),
    }
}

pub fn test_beach(id: &str, region_id: &str) -> BeachProfile {
    // ---
    BeachProfile {
        id: id.to_string(),
        region_id: region_id.to_string(),
        optimal_wind_directions: Some(vec!["SE".to_string()]),
        sheltered: false,
        swell_size: Some(Band::new(1.0, 2.0)),
        optimal_swell_directions: Some(Band::new(150.0, 210.0)),
        ideal_swell_period: Some(Band::new(8.0, 14.0)),
    }
}

/// A reading that scores 5.0 against [`test_beach`].
pub fn offshore_reading(region_id: &str) -> ForecastReading {
    // ---
    ForecastReading {
        id: Uuid::new_v4(),
        region_id: region_id.to_string(),
        date: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        wind_speed: 10.0,
        wind_direction: 135.0,
        swell_height: 1.5,
        swell_period: 14.0,
        swell_direction: 180.0,
    }
}

mod tests {
    // ---
    use super::*;

    #[tokio::test]
    async fn test_lock_ttl_self_heals() {
        // ---
        // A live lock refuses the second acquirer
        let locks = MemoryLockService::default();
        assert!(locks.set_if_absent("k", "first", 60).await.unwrap());
        assert!(!locks.set_if_absent("k", "second", 60).await.unwrap());

        // A zero TTL lapses immediately: the next acquirer takes over,
        // so a crashed holder cannot wedge the key
        let locks = MemoryLockService::default();
        assert!(locks.set_if_absent("k", "crashed", 0).await.unwrap());
        assert!(locks.set_if_absent("k", "next", 60).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_locks_are_swept_on_acquire() {
        // ---
        let locks = MemoryLockService::default();
        locks.set_if_absent("stale", "x", 0).await.unwrap();
        locks.set_if_absent("fresh", "x", 60).await.unwrap();

        assert!(!locks.holds("stale"));
        assert!(locks.holds("fresh"));
    }
}
