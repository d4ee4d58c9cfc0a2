//! Compass direction math for the scoring engine.
//!
//! Pure, stateless helpers shared by the suitability scorer: degree ↔
//! 16-point cardinal conversion and shortest-arc angular distance.
//! Upstream forecast data can be missing or garbage, so conversions
//! degrade to a sentinel instead of panicking.

/// Sentinel cardinal returned for non-finite degree input.
pub const UNKNOWN_CARDINAL: &str = "N/A";

/// The 16 compass points, clockwise from north, one per 22.5° sector.
const CARDINALS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

// ---

/// Convert a bearing in degrees to its nearest 16-point cardinal name.
///
/// Input is normalized modulo 360 first, so negative bearings and values
/// above 360° are fine. Non-finite input yields [`UNKNOWN_CARDINAL`].
pub fn degrees_to_cardinal(degrees: f64) -> &'static str {
    // ---
    if !degrees.is_finite() {
        return UNKNOWN_CARDINAL;
    }

    let normalized = degrees.rem_euclid(360.0);
    let sector = (normalized / 22.5).round() as usize % 16;
    CARDINALS[sector]
}

/// Look up the degree value of a 16-point cardinal name (N = 0, step 22.5).
///
/// Returns `None` for anything that is not one of the 16 names.
pub fn cardinal_to_degrees(cardinal: &str) -> Option<f64> {
    // ---
    CARDINALS
        .iter()
        .position(|c| *c == cardinal)
        .map(|i| i as f64 * 22.5)
}

/// Shortest-arc distance between two bearings, in `[0, 180]`.
///
/// `350°` and `10°` are 20° apart, not 340° — plain subtraction would
/// punish directions that straddle north.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    // ---
    let diff = (a - b).abs() % 360.0;
    diff.min(360.0 - diff)
}
