//! Database schema management for `surfcast`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs`. The beach/region catalog is
//! seeded with a starter data set when empty so a fresh deployment has
//! something to score.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Safe to call on every startup; no-op if objects already exist.
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Static catalog: regions with their upstream source pages
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS regions (
            id         TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            source_url TEXT NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Static catalog: beach wave-preference profiles. Band columns are
    // nullable pairs; a half-null pair is treated as a missing band.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS beaches (
            id                      TEXT PRIMARY KEY,
            region_id               TEXT NOT NULL REFERENCES regions (id),
            optimal_wind_directions TEXT[],
            sheltered               BOOLEAN NOT NULL DEFAULT FALSE,
            swell_min               DOUBLE PRECISION,
            swell_max               DOUBLE PRECISION,
            swell_dir_min           DOUBLE PRECISION,
            swell_dir_max           DOUBLE PRECISION,
            period_min              DOUBLE PRECISION,
            period_max              DOUBLE PRECISION
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // One reading per region per UTC calendar day
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS forecasts (
            id              UUID PRIMARY KEY,
            region_id       TEXT NOT NULL,
            date            TIMESTAMPTZ NOT NULL,
            wind_speed      DOUBLE PRECISION NOT NULL,
            wind_direction  DOUBLE PRECISION NOT NULL,
            swell_height    DOUBLE PRECISION NOT NULL,
            swell_period    DOUBLE PRECISION NOT NULL,
            swell_direction DOUBLE PRECISION NOT NULL,
            UNIQUE (region_id, date)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Good-beach ratings; the composite primary key backs the
    // skip-duplicates insert
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS good_ratings (
            beach_id   TEXT NOT NULL,
            region_id  TEXT NOT NULL,
            date       TIMESTAMPTZ NOT NULL,
            score      DOUBLE PRECISION NOT NULL,
            conditions JSONB NOT NULL,
            PRIMARY KEY (beach_id, date)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Distributed locks and TTL-bounded counters
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS locks (
            key        TEXT PRIMARY KEY,
            holder     TEXT NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS counters (
            key        TEXT PRIMARY KEY,
            count      BIGINT NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Basic indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_beaches_region_id
            ON beaches (region_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_good_ratings_region_date
            ON good_ratings (region_id, date);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Seed the catalog with a starter region and beaches when empty.
///
/// `source_url` comes from `SURF_SOURCE_URL` and points the default
/// region at its upstream forecast page. Existing rows are never touched.
pub async fn seed_catalog(pool: &PgPool, source_url: &str) -> Result<()> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO regions (id, name, source_url)
        VALUES ('gold-coast', 'Gold Coast', $1)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(source_url)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO beaches (
            id, region_id, optimal_wind_directions, sheltered,
            swell_min, swell_max, swell_dir_min, swell_dir_max,
            period_min, period_max
        ) VALUES
            ('the-point',    'gold-coast', ARRAY['SE','S'],  FALSE, 1.0, 2.5, 150.0, 210.0, 8.0, 14.0),
            ('the-alley',    'gold-coast', ARRAY['SW','W'],  TRUE,  0.8, 2.0, 120.0, 190.0, 7.0, 13.0),
            ('main-beach',   'gold-coast', ARRAY['W','NW'],  FALSE, 0.5, 1.8,  45.0, 135.0, 6.0, 12.0)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
