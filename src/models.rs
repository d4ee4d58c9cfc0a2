//! Domain records for the surf forecast pipeline.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---

/// A numeric band with inclusive bounds.
///
/// Used for acceptable swell height (meters), swell direction (degrees)
/// and swell period (seconds). `min > max` is not rejected; the scorer
/// treats such a band as never matched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Distance from `value` to the nearest band edge.
    pub fn edge_distance(&self, value: f64) -> f64 {
        (value - self.min).abs().min((value - self.max).abs())
    }
}

/// Static wave-preference profile of one surf spot.
///
/// Loaded from the read-only catalog. The four preference fields are
/// optional because catalog rows can be incomplete; the scorer returns a
/// zero result for any profile missing one of them rather than guessing.
#[derive(Debug, Clone, Serialize)]
pub struct BeachProfile {
    // ---
    pub id: String,
    pub region_id: String,
    /// Cardinal names considered offshore for this spot, e.g. `["SE", "S"]`.
    pub optimal_wind_directions: Option<Vec<String>>,
    /// Sheltered spots skip the wind-strength penalty entirely.
    pub sheltered: bool,
    /// Acceptable significant wave height, meters.
    pub swell_size: Option<Band>,
    /// Acceptable swell bearing, degrees.
    pub optimal_swell_directions: Option<Band>,
    /// Ideal swell period, seconds.
    pub ideal_swell_period: Option<Band>,
}

/// A region grouping beaches, with its configured upstream source page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub source_url: String,
}

/// One wind/swell reading per region per calendar day, UTC midnight-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ForecastReading {
    // ---
    pub id: Uuid,
    pub region_id: String,
    pub date: DateTime<Utc>,
    /// Knots.
    pub wind_speed: f64,
    /// Degrees, 0–360.
    pub wind_direction: f64,
    /// Meters.
    pub swell_height: f64,
    /// Seconds.
    pub swell_period: f64,
    /// Degrees, 0–360.
    pub swell_direction: f64,
}

impl ForecastReading {
    /// True when every numeric field is usable by the scorer.
    pub fn is_well_formed(&self) -> bool {
        // ---
        self.wind_speed.is_finite()
            && self.wind_direction.is_finite()
            && self.swell_height.is_finite()
            && self.swell_period.is_finite()
            && self.swell_direction.is_finite()
    }
}

/// Raw reading as produced by a scrape adapter, before validation.
///
/// The timestamp may carry a time-of-day from the source page; the cache
/// layer truncates it to UTC midnight before storing.
#[derive(Debug, Deserialize)]
pub struct RawForecast {
    // ---
    pub date: DateTime<Utc>,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub swell_height: f64,
    pub swell_period: f64,
    pub swell_direction: f64,
}

impl RawForecast {
    /// Validate and pin a raw scrape result to `(region, UTC midnight)`.
    pub fn into_reading(self, region_id: &str) -> ForecastReading {
        // ---
        ForecastReading {
            id: Uuid::new_v4(),
            region_id: region_id.to_string(),
            date: truncate_to_midnight(self.date),
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            swell_height: self.swell_height,
            swell_period: self.swell_period,
            swell_direction: self.swell_direction,
        }
    }
}

/// Drop the time-of-day from a timestamp, keeping the UTC date.
///
/// Forecast rows are keyed by `(region_id, date)` with exact equality, so
/// every writer and reader must truncate before touching storage.
pub fn truncate_to_midnight(ts: DateTime<Utc>) -> DateTime<Utc> {
    // ---
    ts.with_hour(0)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Outcome of scoring one beach against one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SuitabilityResult {
    /// 0–5, halved from the internal 0–10 raw scale.
    pub score: f64,
    /// `score >= 4`.
    pub suitable: bool,
}

impl SuitabilityResult {
    /// The zero result used whenever scoring cannot proceed.
    pub fn unsuitable() -> Self {
        Self {
            score: 0.0,
            suitable: false,
        }
    }
}

/// Persisted record that a beach scored ≥ 4/5 on a given day.
///
/// Written once per `(beach, date)` by the rating deduplicator, never
/// mutated, superseded naturally by the next day's rows.
#[derive(Debug, Clone, Serialize)]
pub struct GoodRating {
    // ---
    pub beach_id: String,
    pub region_id: String,
    pub date: DateTime<Utc>,
    pub score: f64,
    /// Snapshot of the reading the score was derived from.
    pub conditions: ForecastReading,
}
