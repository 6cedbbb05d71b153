//! Response cache storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::HttpResponse,
    storage::CacheStorage,
};
use bytes::Bytes;
use sqlx::{sqlite::SqlitePool, Row};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use crate::settings::open_pool;

/// SQLite-backed implementation of [`CacheStorage`].
///
/// Generations live in `cache_generations`; entries in `cache_entries` keyed by
/// `(generation, key)`. Headers are stored as a JSON object.
pub struct SqliteCacheStorage {
    pool: SqlitePool,
}

fn storage_error(action: &str, e: impl std::fmt::Display) -> BridgeError {
    BridgeError::Storage(format!("Failed to {}: {}", action, e))
}

impl SqliteCacheStorage {
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        debug!(path = ?db_path, "Initializing cache storage");
        let pool = open_pool(Some(db_path)).await?;
        Self::with_pool(pool).await
    }

    /// Create an in-memory cache storage (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = open_pool(None).await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_generations (
                name TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| storage_error("create generations table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                generation TEXT NOT NULL,
                key TEXT NOT NULL,
                status INTEGER NOT NULL,
                status_text TEXT NOT NULL,
                headers TEXT NOT NULL,
                body BLOB NOT NULL,
                PRIMARY KEY (generation, key)
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| storage_error("create entries table", e))?;

        Ok(Self { pool })
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default()
    }
}

#[async_trait]
impl CacheStorage for SqliteCacheStorage {
    async fn generations(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM cache_generations ORDER BY created_at, name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("list generations", e))?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    async fn open(&self, generation: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO cache_generations (name, created_at) VALUES (?, ?)")
            .bind(generation)
            .bind(Self::now())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("open generation", e))?;
        Ok(())
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("begin transaction", e))?;

        sqlx::query("DELETE FROM cache_entries WHERE generation = ?")
            .bind(generation)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("delete entries", e))?;

        let removed = sqlx::query("DELETE FROM cache_generations WHERE name = ?")
            .bind(generation)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("delete generation", e))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| storage_error("commit", e))?;

        debug!(generation = generation, removed = removed > 0, "Deleted cache generation");
        Ok(removed > 0)
    }

    async fn lookup(&self, generation: &str, key: &str) -> Result<Option<HttpResponse>> {
        let row = sqlx::query(
            "SELECT status, status_text, headers, body FROM cache_entries WHERE generation = ? AND key = ?",
        )
        .bind(generation)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("look up entry", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status: i64 = row.get(0);
        let status_text: String = row.get(1);
        let headers_json: String = row.get(2);
        let body: Vec<u8> = row.get(3);

        let headers: HashMap<String, String> = serde_json::from_str(&headers_json)
            .map_err(|e| storage_error("decode headers", e))?;

        Ok(Some(HttpResponse {
            status: u16::try_from(status).map_err(|e| storage_error("decode status", e))?,
            status_text,
            headers,
            body: Bytes::from(body),
        }))
    }

    async fn store(&self, generation: &str, key: &str, response: HttpResponse) -> Result<()> {
        self.open(generation).await?;

        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| storage_error("encode headers", e))?;

        sqlx::query(
            r#"
            INSERT INTO cache_entries (generation, key, status, status_text, headers, body)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(generation, key) DO UPDATE SET
                status = excluded.status,
                status_text = excluded.status_text,
                headers = excluded.headers,
                body = excluded.body
            "#,
        )
        .bind(generation)
        .bind(key)
        .bind(i64::from(response.status))
        .bind(&response.status_text)
        .bind(headers_json)
        .bind(response.body.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("store entry", e))?;

        debug!(generation = generation, bytes = response.body.len(), "Stored cache entry");
        Ok(())
    }
}
