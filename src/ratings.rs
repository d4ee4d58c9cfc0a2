//! Good-rating deduplication.
//!
//! Good ratings (beaches scoring ≥ 4/5) are computed once per
//! `(region, date)` and persisted, regardless of how many concurrent
//! requests arrive for the same region page. Mutual exclusion comes from
//! a short-lived distributed lock; the skip-duplicates insert is the
//! second line of defense for the case where the lock TTL lapses while a
//! computation is still running.
//!
//! The whole pass is best-effort: it is spawned alongside forecast
//! serving and must never fail the primary request, so every error past
//! lock acquisition is logged and swallowed.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::ServiceResult;
use crate::models::{truncate_to_midnight, ForecastReading, GoodRating};
use crate::ports::{Catalog, LockService, RatingStore};
use crate::scoring;

/// Bounds staleness when a holder crashes mid-computation.
const RATING_LOCK_TTL_SECS: i64 = 60;

// ---

pub struct RatingService {
    catalog: Arc<dyn Catalog>,
    ratings: Arc<dyn RatingStore>,
    locks: Arc<dyn LockService>,
}

impl RatingService {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        ratings: Arc<dyn RatingStore>,
        locks: Arc<dyn LockService>,
    ) -> Self {
        Self {
            catalog,
            ratings,
            locks,
        }
    }

    /// Compute and persist good ratings for `(region, date)` at most once.
    ///
    /// Safe under concurrent invocation: a refused lock acquisition means
    /// another process is already handling this pair, and is a silent
    /// return, not an error.
    pub async fn ensure_good_ratings(
        &self,
        region_id: &str,
        date: DateTime<Utc>,
        reading: &ForecastReading,
    ) {
        // ---
        let date = truncate_to_midnight(date);
        let key = format!("rating-lock:{}:{}", region_id, date.format("%Y-%m-%d"));

        let acquired = match self.locks.set_if_absent(&key, "held", RATING_LOCK_TTL_SECS).await {
            Ok(acquired) => acquired,
            Err(e) => {
                tracing::warn!("Could not attempt rating lock {}: {}", key, e);
                return;
            }
        };

        if !acquired {
            tracing::debug!("Ratings for {} already being computed elsewhere, skipping", key);
            return;
        }

        if let Err(e) = self.compute_and_store(region_id, date, reading).await {
            tracing::warn!(
                "Best-effort rating computation failed for region {} on {}: {}",
                region_id,
                date,
                e
            );
        }

        // Held locks are always released, even after a failed pass. A
        // failed acquisition never reaches this point.
        if let Err(e) = self.locks.delete(&key).await {
            tracing::warn!("Failed to release rating lock {}: {}", key, e);
        }
    }

    async fn compute_and_store(
        &self,
        region_id: &str,
        date: DateTime<Utc>,
        reading: &ForecastReading,
    ) -> ServiceResult<()> {
        // ---
        if self.ratings.count(region_id, date).await? > 0 {
            tracing::debug!("Ratings already stored for region {} on {}", region_id, date);
            return Ok(());
        }

        let beaches = self.catalog.find_beaches(region_id).await?;
        let scores = scoring::score_all(&beaches, reading);

        let rows: Vec<GoodRating> = scores
            .into_iter()
            .filter(|(_, scored)| scored.suitable)
            .map(|(beach_id, scored)| GoodRating {
                beach_id,
                region_id: scored.region_id,
                date,
                score: scored.score,
                conditions: reading.clone(),
            })
            .collect();

        if rows.is_empty() {
            tracing::debug!("No good beaches for region {} on {}", region_id, date);
            return Ok(());
        }

        let inserted = self.ratings.insert_many(&rows).await?;
        tracing::info!(
            "Stored {} good ratings for region {} on {} ({} candidates)",
            inserted,
            region_id,
            date,
            rows.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::testing::{
        offshore_reading, test_beach, test_region, MemoryCatalog, MemoryLockService,
        MemoryRatingStore,
    };
    use std::sync::atomic::Ordering;

    fn fixtures() -> (Arc<MemoryCatalog>, Arc<MemoryRatingStore>, Arc<MemoryLockService>) {
        // ---
        let catalog = Arc::new(MemoryCatalog {
            regions: vec![test_region("gold-coast")],
            beaches: vec![
                test_beach("the-point", "gold-coast"),
                test_beach("the-reef", "gold-coast"),
                // A spot that scores poorly in SE conditions
                {
                    let mut dud = test_beach("closeout-alley", "gold-coast");
                    dud.optimal_wind_directions = Some(vec!["NW".to_string()]);
                    dud.swell_size = None;
                    dud
                },
            ],
        });
        (
            catalog,
            Arc::new(MemoryRatingStore::default()),
            Arc::new(MemoryLockService::default()),
        )
    }

    #[tokio::test]
    async fn test_good_ratings_persisted_once() {
        // ---
        let (catalog, ratings, locks) = fixtures();
        let svc = RatingService::new(catalog, ratings.clone(), locks.clone());
        let reading = offshore_reading("gold-coast");

        svc.ensure_good_ratings("gold-coast", reading.date, &reading).await;

        // Two good beaches, the degenerate one filtered out
        assert_eq!(ratings.row_count(), 2);
        assert_eq!(ratings.insert_calls.load(Ordering::SeqCst), 1);

        // Lock was released at the end
        assert!(!locks.holds("rating-lock:gold-coast:2025-06-01"));

        // A second full pass sees existing rows and recomputes nothing
        svc.ensure_good_ratings("gold-coast", reading.date, &reading).await;
        assert_eq!(ratings.row_count(), 2);
        assert_eq!(ratings.insert_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_compute_once() {
        // ---
        // N concurrent callers: one computation pass, no duplicate rows
        let (catalog, ratings, locks) = fixtures();
        let svc = Arc::new(RatingService::new(catalog, ratings.clone(), locks));
        let reading = offshore_reading("gold-coast");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = svc.clone();
            let reading = reading.clone();
            handles.push(tokio::spawn(async move {
                svc.ensure_good_ratings("gold-coast", reading.date, &reading).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(ratings.row_count(), 2);
        assert_eq!(ratings.insert_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_lock_is_reclaimed() {
        // ---
        // A crashed holder leaves its lock behind; TTL lapse lets the
        // next caller take the key over instead of wedging forever.
        let (catalog, ratings, locks) = fixtures();
        let svc = RatingService::new(catalog, ratings.clone(), locks.clone());
        let reading = offshore_reading("gold-coast");

        // Stale lock whose TTL has already lapsed
        locks
            .set_if_absent("rating-lock:gold-coast:2025-06-01", "crashed", 0)
            .await
            .unwrap();

        svc.ensure_good_ratings("gold-coast", reading.date, &reading).await;

        // The pass ran and the reclaimed lock was released afterwards
        assert_eq!(ratings.row_count(), 2);
        assert_eq!(ratings.insert_calls.load(Ordering::SeqCst), 1);
        assert!(!locks.holds("rating-lock:gold-coast:2025-06-01"));
    }

    #[tokio::test]
    async fn test_contended_lock_is_silent_return() {
        // ---
        let (catalog, ratings, locks) = fixtures();
        let svc = RatingService::new(catalog, ratings.clone(), locks.clone());
        let reading = offshore_reading("gold-coast");

        // Someone else holds the lock
        locks
            .set_if_absent("rating-lock:gold-coast:2025-06-01", "other", 60)
            .await
            .unwrap();

        svc.ensure_good_ratings("gold-coast", reading.date, &reading).await;

        assert_eq!(ratings.row_count(), 0);
        assert_eq!(ratings.insert_calls.load(Ordering::SeqCst), 0);

        // The foreign lock must not be released by the refused caller
        assert!(locks.holds("rating-lock:gold-coast:2025-06-01"));
    }

    #[tokio::test]
    async fn test_storage_failure_is_swallowed_and_lock_released() {
        // ---
        let (catalog, ratings, locks) = fixtures();
        ratings.fail_inserts.store(true, Ordering::SeqCst);
        let svc = RatingService::new(catalog, ratings.clone(), locks.clone());
        let reading = offshore_reading("gold-coast");

        // Must not panic or propagate
        svc.ensure_good_ratings("gold-coast", reading.date, &reading).await;

        assert_eq!(ratings.row_count(), 0);
        assert!(!locks.holds("rating-lock:gold-coast:2025-06-01"));
    }

    #[tokio::test]
    async fn test_no_rows_written_when_nothing_qualifies() {
        // ---
        let (catalog, ratings, locks) = fixtures();
        let svc = RatingService::new(catalog, ratings.clone(), locks);

        // Onshore gale: nothing scores 4+
        let mut reading = offshore_reading("gold-coast");
        reading.wind_direction = 315.0;
        reading.wind_speed = 40.0;
        reading.swell_height = 4.0;

        svc.ensure_good_ratings("gold-coast", reading.date, &reading).await;

        assert_eq!(ratings.row_count(), 0);
        assert_eq!(ratings.insert_calls.load(Ordering::SeqCst), 0);
    }
}
