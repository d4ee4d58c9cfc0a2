//! Application entry point for the `surfcast` backend service.
//!
//! This binary orchestrates the full startup sequence for the surf
//! conditions API, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool
//! - Creating the database schema and seeding the beach catalog
//! - Wiring the storage, lock and scrape collaborators into the
//!   forecast and rating services
//! - Mounting all API routes via the `routes` gateway
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `SURF_SOURCE_URL` (**required**) – upstream forecast source URL
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `SCRAPES_PER_HOUR` (optional) – per-region hourly scrape budget (default: 30)
//! - `SURFCAST_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `SURFCAST_SPAN_EVENTS` (optional) – span event mode for tracing

use std::{env, io::IsTerminal, net::SocketAddr, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

mod compass;
mod config;
mod error;
mod forecast;
mod locks;
mod models;
mod ports;
mod ratings;
mod routes;
mod schema;
mod scoring;
mod scrape;
mod store;
#[cfg(test)]
mod testing;

use forecast::ForecastService;
use locks::PgLockService;
use ratings::RatingService;
use routes::AppState;
use scrape::HttpScrapeAdapter;
use store::{PgCatalog, PgForecastStore, PgRatingStore};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Attempting to connect to database: {}", cfg.db_url);

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database '{}': {}", cfg.db_url, e))?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool).await?;
    schema::seed_catalog(&pool, &cfg.source_url).await?;

    // Process-scoped collaborators, injected into the services rather
    // than reached through globals.
    let catalog = Arc::new(PgCatalog::new(pool.clone()));
    let lock_service = Arc::new(PgLockService::new(pool.clone()));
    let forecasts = Arc::new(ForecastService::new(
        Arc::new(PgForecastStore::new(pool.clone())),
        Arc::new(HttpScrapeAdapter::new()),
        lock_service.clone(),
        cfg.scrapes_per_hour as i64,
    ));
    let ratings = Arc::new(RatingService::new(
        catalog.clone(),
        Arc::new(PgRatingStore::new(pool.clone())),
        lock_service,
    ));

    let app: Router = routes::router(AppState {
        forecasts,
        ratings,
        catalog,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `SURFCAST_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `SURFCAST_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked. It installs the subscriber globally
/// for the lifetime of the process.
fn init_tracing() {
    // ---
    let span_events = match env::var("SURFCAST_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to SURFCAST_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("SURFCAST_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
