//! Beach suitability scoring engine.
//!
//! Maps a beach's static wave-preference profile plus one forecast reading
//! to a 0–5 suitability score. Scoring is deterministic, does no I/O, and
//! never panics: incomplete profiles and malformed readings both degrade
//! to a zero result so one bad catalog row cannot break a batch.
//!
//! Internally the score runs on a 0–10 scale, with penalties applied in a
//! fixed order and the running total clamped back into [0, 10] after each
//! step. Penalties compound sequentially, so the order of terms matters
//! for parity with historical scores.
//!
//! NOTE: the swell-direction term measures plain numeric distance to the
//! band edges, while the wind term uses true circular distance. Bands that
//! straddle 0°/360° are therefore scored too harshly. Known quirk, kept
//! for score parity with the historical data set.

use std::collections::HashMap;

use crate::compass;
use crate::models::{BeachProfile, ForecastReading, SuitabilityResult};

/// Scores at or above this value (on the 0–5 scale) count as "good".
pub const GOOD_SCORE_THRESHOLD: f64 = 4.0;

// ---

/// Score one beach against one forecast reading.
///
/// A profile missing any preference field scores zero outright. A
/// present-but-empty optimal-wind set is different: it is a valid
/// profile that no wind can ever match, so the reading takes the full
/// wind-direction penalty instead of short-circuiting.
pub fn score(beach: &BeachProfile, reading: &ForecastReading) -> SuitabilityResult {
    // ---
    let (Some(wind_dirs), Some(swell_size), Some(swell_dirs), Some(period)) = (
        beach.optimal_wind_directions.as_ref(),
        beach.swell_size,
        beach.optimal_swell_directions,
        beach.ideal_swell_period,
    ) else {
        return SuitabilityResult::unsuitable();
    };

    if !reading.is_well_formed() {
        return SuitabilityResult::unsuitable();
    }

    let mut raw: f64 = 10.0;

    // Wind direction: exact cardinal match is free, a neighboring
    // direction (within 45° of any optimal one) costs 2, anything else 4.
    // An empty or all-unknown set leaves the fold at infinity and eats
    // the distant-direction penalty.
    let wind_cardinal = compass::degrees_to_cardinal(reading.wind_direction);
    if !wind_dirs.iter().any(|d| d == wind_cardinal) {
        let nearest = wind_dirs
            .iter()
            .filter_map(|d| compass::cardinal_to_degrees(d))
            .map(|deg| compass::angular_distance(reading.wind_direction, deg))
            .fold(f64::INFINITY, f64::min);
        raw -= if nearest <= 45.0 { 2.0 } else { 4.0 };
        raw = raw.max(0.0);
    }

    // Wind strength, skipped entirely for sheltered spots. Knots.
    if !beach.sheltered {
        let penalty = if reading.wind_speed > 35.0 {
            4.0
        } else if reading.wind_speed > 25.0 {
            3.0
        } else if reading.wind_speed > 15.0 {
            2.0
        } else {
            0.0
        };
        raw = (raw - penalty).max(0.0);
    }

    // Swell height against the acceptable band, meters.
    if !swell_size.contains(reading.swell_height) {
        let diff = swell_size.edge_distance(reading.swell_height);
        let penalty = if diff <= 0.5 {
            4.0
        } else if diff <= 1.0 {
            6.0
        } else {
            8.0
        };
        raw = (raw - penalty).max(0.0);
    }

    // Swell direction: linear distance to the band edges (see module note).
    if !swell_dirs.contains(reading.swell_direction) {
        let diff = swell_dirs.edge_distance(reading.swell_direction);
        let penalty = if diff <= 10.0 {
            2.0
        } else if diff <= 20.0 {
            4.0
        } else if diff <= 30.0 {
            6.0
        } else {
            8.0
        };
        raw = (raw - penalty).max(0.0);
    }

    // Swell period: in-band readings above the midpoint earn a bonus that
    // scales to +2 at the top of the band; out-of-band readings are
    // penalized by how far off they are, seconds.
    if period.contains(reading.swell_period) {
        let midpoint = (period.min + period.max) / 2.0;
        if reading.swell_period > midpoint {
            let bonus =
                ((reading.swell_period - midpoint) / (period.max - midpoint) * 2.0).clamp(0.0, 2.0);
            raw = (raw + bonus).min(10.0);
        }
    } else {
        let diff = period.edge_distance(reading.swell_period);
        let penalty = if diff <= 2.0 {
            2.0
        } else if diff <= 4.0 {
            4.0
        } else {
            6.0
        };
        raw = (raw - penalty).max(0.0);
    }

    let final_score = (raw / 2.0).clamp(0.0, 5.0);
    SuitabilityResult {
        score: final_score,
        suitable: final_score >= GOOD_SCORE_THRESHOLD,
    }
}

// ---

/// A scored beach as returned by [`score_all`], keeping the region around
/// for per-region tallies.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScoredBeach {
    pub region_id: String,
    pub score: f64,
    pub suitable: bool,
}

/// "N good spots today" badge data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct GoodCount {
    pub count: usize,
    pub should_display: bool,
}

/// Score every beach independently against one reading.
pub fn score_all(
    beaches: &[BeachProfile],
    reading: &ForecastReading,
) -> HashMap<String, ScoredBeach> {
    // ---
    beaches
        .iter()
        .map(|beach| {
            let result = score(beach, reading);
            (
                beach.id.clone(),
                ScoredBeach {
                    region_id: beach.region_id.clone(),
                    score: result.score,
                    suitable: result.suitable,
                },
            )
        })
        .collect()
}

/// Count beaches scoring good-or-better for one reading.
pub fn count_good(beaches: &[BeachProfile], reading: &ForecastReading) -> GoodCount {
    // ---
    let count = beaches
        .iter()
        .filter(|beach| score(beach, reading).suitable)
        .count();
    GoodCount {
        count,
        should_display: count > 0,
    }
}

/// Tally suitable beaches per region, for multi-region overviews.
pub fn region_counts(scores: &HashMap<String, ScoredBeach>) -> HashMap<String, usize> {
    // ---
    let mut counts: HashMap<String, usize> = HashMap::new();
    for scored in scores.values() {
        if scored.suitable {
            *counts.entry(scored.region_id.clone()).or_default() += 1;
        }
    }
    counts
}
