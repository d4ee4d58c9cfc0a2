//! Service error taxonomy.
//!
//! Routes map these variants onto HTTP statuses; the variants exist so a
//! throttled scrape (capacity) is distinguishable from a broken upstream
//! or a storage failure.

use thiserror::Error;

// ---

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Hourly scrape budget for the region is spent. Capacity condition,
    /// not a server fault.
    #[error("scrape rate limit exceeded for region {region_id}")]
    RateLimited { region_id: String },

    /// The upstream source page could not be fetched or parsed.
    /// Propagated unchanged from the scrape adapter.
    #[error("scrape failed for region {region_id} from {source_url}: {message}")]
    Scrape {
        region_id: String,
        source_url: String,
        message: String,
    },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
