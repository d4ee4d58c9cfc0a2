use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;

use crate::error::ServiceError;
use crate::forecast::ForecastService;
use crate::ports::Catalog;
use crate::ratings::RatingService;

mod beaches;
mod forecast;
mod health;
mod overview;

// ---

/// Injected collaborators shared by all routes.
#[derive(Clone)]
pub struct AppState {
    pub forecasts: Arc<ForecastService>,
    pub ratings: Arc<RatingService>,
    pub catalog: Arc<dyn Catalog>,
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(forecast::router())
        .merge(beaches::router())
        .merge(overview::router())
        .merge(health::router())
        .with_state(state)
}

/// Map service errors onto HTTP statuses.
///
/// A spent scrape budget is a throttling response, not a server error;
/// an upstream scrape failure is a bad gateway, not our fault either.
fn status_for(err: &ServiceError) -> StatusCode {
    // ---
    match err {
        ServiceError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        ServiceError::Scrape { .. } => StatusCode::BAD_GATEWAY,
        ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
