//! Forecast endpoint: serve the cached or freshly acquired reading for a
//! region and kick off best-effort rating precomputation on the side.

use axum::{
    extract::Path, extract::Query, extract::State, http::StatusCode, response::IntoResponse,
    routing::get, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{status_for, AppState};
use crate::compass;
use crate::models::ForecastReading;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/regions/{region_id}/forecast", get(handler))
}

#[derive(Debug, Deserialize)]
struct ForecastQuery {
    /// Bypass the daily cache and overwrite with a fresh scrape.
    refresh: Option<bool>,
}

/// Reading plus cardinal convenience fields for display; the scorer
/// itself works on raw degrees.
#[derive(Serialize)]
struct ForecastResponse {
    #[serde(flatten)]
    reading: ForecastReading,
    wind_cardinal: &'static str,
    swell_cardinal: &'static str,
}

async fn handler(
    Path(region_id): Path<String>,
    Query(params): Query<ForecastQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /regions/{}/forecast", region_id);

    let region = match state.catalog.find_region(&region_id).await {
        Ok(Some(region)) => region,
        Ok(None) => {
            debug!("Unknown region requested: {}", region_id);
            return (StatusCode::NOT_FOUND, Json("Unknown region")).into_response();
        }
        Err(e) => {
            error!("Catalog lookup failed for region {}: {}", region_id, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, Json("Catalog unavailable"))
                .into_response();
        }
    };

    let force_refresh = params.refresh.unwrap_or(false);
    let reading = match state
        .forecasts
        .get_forecast(&region, Utc::now(), force_refresh)
        .await
    {
        Ok(reading) => reading,
        Err(e) => {
            error!("Forecast unavailable for region {}: {}", region_id, e);
            return (status_for(&e), Json("Forecast unavailable")).into_response();
        }
    };

    // Detached best-effort side effect: its failure must never affect
    // this response.
    {
        let ratings = state.ratings.clone();
        let reading = reading.clone();
        tokio::spawn(async move {
            ratings
                .ensure_good_ratings(&reading.region_id, reading.date, &reading)
                .await;
        });
    }

    let response = ForecastResponse {
        wind_cardinal: compass::degrees_to_cardinal(reading.wind_direction),
        swell_cardinal: compass::degrees_to_cardinal(reading.swell_direction),
        reading,
    };
    (StatusCode::OK, Json(response)).into_response()
}
