//! Postgres implementations of the storage ports.
//!
//! Repositories hold no business logic: parameterized queries in, domain
//! records out. Catalog rows are parsed into strict [`BeachProfile`]
//! shapes here, at the storage boundary, so the scorer never sees a
//! half-null pair of band columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::ServiceResult;
use crate::models::{Band, BeachProfile, ForecastReading, GoodRating, Region};
use crate::ports::{Catalog, ForecastStore, RatingStore};

// ---

#[derive(Clone)]
pub struct PgForecastStore {
    pool: PgPool,
}

impl PgForecastStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ForecastStore for PgForecastStore {
    async fn find_one(
        &self,
        region_id: &str,
        date: DateTime<Utc>,
    ) -> ServiceResult<Option<ForecastReading>> {
        // ---
        let reading = sqlx::query_as::<_, ForecastReading>(
            r#"
            SELECT id, region_id, date, wind_speed, wind_direction,
                   swell_height, swell_period, swell_direction
            FROM forecasts
            WHERE region_id = $1 AND date = $2
            "#,
        )
        .bind(region_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reading)
    }

    async fn upsert(&self, reading: &ForecastReading) -> ServiceResult<ForecastReading> {
        // ---
        // Keyed by (region_id, date); a racing writer's row is simply
        // overwritten, exactly one survives per composite key.
        let stored = sqlx::query_as::<_, ForecastReading>(
            r#"
            INSERT INTO forecasts (
                id, region_id, date, wind_speed, wind_direction,
                swell_height, swell_period, swell_direction
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (region_id, date) DO UPDATE SET
                wind_speed      = EXCLUDED.wind_speed,
                wind_direction  = EXCLUDED.wind_direction,
                swell_height    = EXCLUDED.swell_height,
                swell_period    = EXCLUDED.swell_period,
                swell_direction = EXCLUDED.swell_direction
            RETURNING id, region_id, date, wind_speed, wind_direction,
                      swell_height, swell_period, swell_direction
            "#,
        )
        .bind(reading.id)
        .bind(&reading.region_id)
        .bind(reading.date)
        .bind(reading.wind_speed)
        .bind(reading.wind_direction)
        .bind(reading.swell_height)
        .bind(reading.swell_period)
        .bind(reading.swell_direction)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }
}

// ---

#[derive(Clone)]
pub struct PgRatingStore {
    pool: PgPool,
}

impl PgRatingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RatingStore for PgRatingStore {
    async fn count(&self, region_id: &str, date: DateTime<Utc>) -> ServiceResult<i64> {
        // ---
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM good_ratings WHERE region_id = $1 AND date = $2")
                .bind(region_id)
                .bind(date)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn insert_many(&self, ratings: &[GoodRating]) -> ServiceResult<u64> {
        // ---
        // ON CONFLICT DO NOTHING gives skip-duplicates semantics: a row
        // written by a competing pass (lock TTL lapsed mid-computation)
        // is left alone.
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for rating in ratings {
            let conditions =
                serde_json::to_value(&rating.conditions).unwrap_or(serde_json::Value::Null);
            let result = sqlx::query(
                r#"
                INSERT INTO good_ratings (beach_id, region_id, date, score, conditions)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (beach_id, date) DO NOTHING
                "#,
            )
            .bind(&rating.beach_id)
            .bind(&rating.region_id)
            .bind(rating.date)
            .bind(rating.score)
            .bind(conditions)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }
}

// ---

/// Raw beach catalog row; band columns come in nullable halves.
#[derive(sqlx::FromRow)]
struct BeachRow {
    id: String,
    region_id: String,
    optimal_wind_directions: Option<Vec<String>>,
    sheltered: bool,
    swell_min: Option<f64>,
    swell_max: Option<f64>,
    swell_dir_min: Option<f64>,
    swell_dir_max: Option<f64>,
    period_min: Option<f64>,
    period_max: Option<f64>,
}

impl BeachRow {
    fn into_profile(self) -> BeachProfile {
        // ---
        BeachProfile {
            id: self.id,
            region_id: self.region_id,
            optimal_wind_directions: self.optimal_wind_directions,
            sheltered: self.sheltered,
            swell_size: band(self.swell_min, self.swell_max),
            optimal_swell_directions: band(self.swell_dir_min, self.swell_dir_max),
            ideal_swell_period: band(self.period_min, self.period_max),
        }
    }
}

/// A band needs both halves; anything else maps to `None` and the
/// profile scores zero downstream.
fn band(min: Option<f64>, max: Option<f64>) -> Option<Band> {
    match (min, max) {
        (Some(min), Some(max)) => Some(Band::new(min, max)),
        _ => None,
    }
}

#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn find_region(&self, region_id: &str) -> ServiceResult<Option<Region>> {
        // ---
        let region = sqlx::query_as::<_, Region>(
            "SELECT id, name, source_url FROM regions WHERE id = $1",
        )
        .bind(region_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(region)
    }

    async fn list_regions(&self) -> ServiceResult<Vec<Region>> {
        // ---
        let regions =
            sqlx::query_as::<_, Region>("SELECT id, name, source_url FROM regions ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(regions)
    }

    async fn find_beaches(&self, region_id: &str) -> ServiceResult<Vec<BeachProfile>> {
        // ---
        let rows = sqlx::query_as::<_, BeachRow>(
            r#"
            SELECT id, region_id, optimal_wind_directions, sheltered,
                   swell_min, swell_max, swell_dir_min, swell_dir_max,
                   period_min, period_max
            FROM beaches
            WHERE region_id = $1
            ORDER BY id
            "#,
        )
        .bind(region_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BeachRow::into_profile).collect())
    }
}
