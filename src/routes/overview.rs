//! Multi-region overview: per-region counts of good beaches today.
//!
//! Serves the landing-page region list. Only already-cached forecasts
//! are consulted (no scraping from this endpoint), and regions without
//! one simply show a zero count.

use std::collections::HashMap;

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use super::AppState;
use crate::scoring::{self, ScoredBeach};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/regions", get(handler))
}

#[derive(Serialize)]
struct RegionOverview {
    id: String,
    name: String,
    good_count: usize,
}

async fn handler(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    info!("GET /regions");

    let regions = match state.catalog.list_regions().await {
        Ok(regions) => regions,
        Err(e) => {
            error!("Region catalog failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, Json("Catalog unavailable"))
                .into_response();
        }
    };

    // Score each region's beaches against its cached reading, then tally
    // suitable beaches per region in one pass. Beach ids are globally
    // unique, so the maps merge without collisions.
    let mut all_scores: HashMap<String, ScoredBeach> = HashMap::new();
    for region in &regions {
        let reading = match state.forecasts.peek_forecast(&region.id, Utc::now()).await {
            Ok(Some(reading)) => reading,
            Ok(None) => continue,
            Err(e) => {
                error!("Forecast lookup failed for region {}: {}", region.id, e);
                continue;
            }
        };
        match state.catalog.find_beaches(&region.id).await {
            Ok(beaches) => all_scores.extend(scoring::score_all(&beaches, &reading)),
            Err(e) => error!("Beach catalog failed for region {}: {}", region.id, e),
        }
    }
    let counts = scoring::region_counts(&all_scores);

    let overview: Vec<RegionOverview> = regions
        .into_iter()
        .map(|region| RegionOverview {
            good_count: counts.get(&region.id).copied().unwrap_or(0),
            id: region.id,
            name: region.name,
        })
        .collect();

    (StatusCode::OK, Json(overview)).into_response()
}
