//! Postgres-backed distributed lock and counter service.
//!
//! The lock contract is set-if-absent with a TTL: a single upsert either
//! inserts the key or steals it when the previous holder's TTL has
//! lapsed, so a crashed holder can never wedge a key forever. Counters
//! follow the same shape (atomic upsert, TTL-bounded) and back the
//! per-region hourly scrape budget.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::ServiceResult;
use crate::ports::LockService;

// ---

#[derive(Clone)]
pub struct PgLockService {
    pool: PgPool,
}

impl PgLockService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LockService for PgLockService {
    async fn set_if_absent(&self, key: &str, value: &str, ttl_secs: i64) -> ServiceResult<bool> {
        // ---
        // Opportunistic sweep: rows from crashed holders must not pile up
        sqlx::query("DELETE FROM locks WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;

        // One statement: insert, or take over a row whose TTL lapsed
        // between the sweep and here. rows_affected == 0 means a live
        // holder exists.
        let result = sqlx::query(
            r#"
            INSERT INTO locks (key, holder, expires_at)
            VALUES ($1, $2, now() + make_interval(secs => $3))
            ON CONFLICT (key) DO UPDATE SET
                holder     = EXCLUDED.holder,
                expires_at = EXCLUDED.expires_at
            WHERE locks.expires_at <= now()
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(ttl_secs as f64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, key: &str) -> ServiceResult<()> {
        // ---
        sqlx::query("DELETE FROM locks WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment(&self, key: &str) -> ServiceResult<i64> {
        // ---
        // Opportunistic sweep: one counter row per window accumulates
        // otherwise
        sqlx::query("DELETE FROM counters WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;

        // An expired counter restarts at 1; a fresh one has no deadline
        // until `expire` is called, mirroring INCR-then-EXPIRE usage.
        // The expired branches below cover a row lapsing after the sweep.
        let count: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO counters (key, count, expires_at)
            VALUES ($1, 1, 'infinity')
            ON CONFLICT (key) DO UPDATE SET
                count = CASE
                    WHEN counters.expires_at <= now() THEN 1
                    ELSE counters.count + 1
                END,
                expires_at = CASE
                    WHEN counters.expires_at <= now() THEN 'infinity'
                    ELSE counters.expires_at
                END
            RETURNING count
            "#,
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn expire(&self, key: &str, secs: i64) -> ServiceResult<()> {
        // ---
        sqlx::query(
            "UPDATE counters SET expires_at = now() + make_interval(secs => $2) WHERE key = $1",
        )
        .bind(key)
        .bind(secs as f64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
