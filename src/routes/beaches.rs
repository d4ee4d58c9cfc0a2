//! Scored-beaches endpoint: the region's catalog with today's
//! suitability scores and the "N good spots today" badge data.
//!
//! Score enrichment degrades gracefully: if today's forecast cannot be
//! obtained, the catalog is still served with `scores: null` rather than
//! failing the page.

use std::collections::HashMap;

use axum::{
    extract::Path, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use super::AppState;
use crate::models::BeachProfile;
use crate::scoring::{self, GoodCount, ScoredBeach};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/regions/{region_id}/beaches", get(handler))
}

#[derive(Serialize)]
struct ScoredBeachesResponse {
    beaches: Vec<BeachProfile>,
    /// Per-beach suitability for today's reading; absent when no
    /// forecast was available.
    scores: Option<HashMap<String, ScoredBeach>>,
    good: GoodCount,
}

async fn handler(
    Path(region_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /regions/{}/beaches", region_id);

    let region = match state.catalog.find_region(&region_id).await {
        Ok(Some(region)) => region,
        Ok(None) => return (StatusCode::NOT_FOUND, Json("Unknown region")).into_response(),
        Err(e) => {
            error!("Catalog lookup failed for region {}: {}", region_id, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, Json("Catalog unavailable"))
                .into_response();
        }
    };

    let beaches = match state.catalog.find_beaches(&region_id).await {
        Ok(beaches) => beaches,
        Err(e) => {
            error!("Beach catalog failed for region {}: {}", region_id, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, Json("Catalog unavailable"))
                .into_response();
        }
    };

    // Best-effort enrichment: a page without scores beats no page.
    let (scores, good) = match state.forecasts.get_forecast(&region, Utc::now(), false).await {
        Ok(reading) => {
            let scores = scoring::score_all(&beaches, &reading);
            let good = scoring::count_good(&beaches, &reading);
            (Some(scores), good)
        }
        Err(e) => {
            warn!("No forecast for region {}, serving unscored catalog: {}", region_id, e);
            (
                None,
                GoodCount {
                    count: 0,
                    should_display: false,
                },
            )
        }
    };

    let response = ScoredBeachesResponse {
        beaches,
        scores,
        good,
    };
    (StatusCode::OK, Json(response)).into_response()
}
