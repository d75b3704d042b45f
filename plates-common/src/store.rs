//! Plate record store
//!
//! Persists plate/photo associations and answers lookups by exact key.
//! Every `save` is an independent write; a batch of saves is not a
//! transaction, and records already written stay written when a later
//! save in the same batch fails.

use crate::db::{PlateRecord, TableInfo};
use crate::plate::PlateKey;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// Aggregate counts for status reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total_records: i64,
    pub unique_plates: i64,
}

/// Connection check result
#[derive(Debug, Clone, Serialize)]
pub struct StoreDiagnostics {
    /// Storage namespace (database name)
    pub database: String,
    pub size_bytes: i64,
    pub tables: Vec<TableInfo>,
    pub record_count: i64,
}

/// Store contract used by the conversation handler
#[async_trait]
pub trait PlateStore: Send + Sync {
    /// Insert one new record with `created_at = now`. Never deduplicates.
    async fn save(&self, plate: &PlateKey, photo: &[u8]) -> Result<Uuid>;

    /// All records stored under exactly this key, in insertion order
    async fn search_records(&self, plate: &PlateKey) -> Result<Vec<PlateRecord>>;

    /// Every distinct stored key once, ascending
    async fn list_distinct_keys(&self) -> Result<Vec<PlateKey>>;

    async fn count_records(&self) -> Result<i64>;

    async fn count_distinct_keys(&self) -> Result<i64>;

    /// Connection check with storage details
    async fn diagnostics(&self) -> Result<StoreDiagnostics>;

    /// Photos stored under exactly this key, in insertion order.
    /// Empty when nothing matches.
    async fn search(&self, plate: &PlateKey) -> Result<Vec<Vec<u8>>> {
        let records = self.search_records(plate).await?;
        Ok(records.into_iter().map(|record| record.photo).collect())
    }

    async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            total_records: self.count_records().await?,
            unique_plates: self.count_distinct_keys().await?,
        })
    }
}

/// SQLite-backed store over the `plate_records` table
#[derive(Clone)]
pub struct SqlitePlateStore {
    pool: SqlitePool,
    database: String,
}

impl SqlitePlateStore {
    /// Wrap an initialized pool (see [`crate::db::init_database`])
    pub fn new(pool: SqlitePool, database: impl Into<String>) -> Self {
        Self {
            pool,
            database: database.into(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PlateStore for SqlitePlateStore {
    async fn save(&self, plate: &PlateKey, photo: &[u8]) -> Result<Uuid> {
        let guid = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO plate_records (guid, plate_key, photo, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(guid.to_string())
        .bind(plate.as_str())
        .bind(photo)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        debug!(
            "Saved record {} for plate '{}' ({} bytes)",
            guid,
            plate,
            photo.len()
        );
        Ok(guid)
    }

    async fn search_records(&self, plate: &PlateKey) -> Result<Vec<PlateRecord>> {
        let rows = sqlx::query_as::<_, (String, String, Vec<u8>, DateTime<Utc>)>(
            r#"
            SELECT guid, plate_key, photo, created_at
            FROM plate_records
            WHERE plate_key = ?
            ORDER BY rowid ASC
            "#,
        )
        .bind(plate.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(guid, plate_key, photo, created_at)| -> Result<PlateRecord> {
                let guid = Uuid::parse_str(&guid).map_err(|e| {
                    Error::Internal(format!("Corrupt record guid {:?}: {}", guid, e))
                })?;
                Ok(PlateRecord {
                    guid,
                    plate_key: PlateKey::from_stored(plate_key),
                    photo,
                    created_at,
                })
            })
            .collect()
    }

    async fn list_distinct_keys(&self) -> Result<Vec<PlateKey>> {
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT plate_key FROM plate_records ORDER BY plate_key ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(keys.into_iter().map(PlateKey::from_stored).collect())
    }

    async fn count_records(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plate_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_distinct_keys(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT plate_key) FROM plate_records")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn diagnostics(&self) -> Result<StoreDiagnostics> {
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await?;
        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreDiagnostics {
            database: self.database.clone(),
            size_bytes: page_count * page_size,
            tables: list_tables(&self.pool).await?,
            record_count: self.count_records().await?,
        })
    }
}

/// List all tables with row counts, alphabetically, excluding SQLite internals
async fn list_tables(pool: &SqlitePool) -> Result<Vec<TableInfo>> {
    let tables = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT name
        FROM sqlite_master
        WHERE type = 'table'
          AND name NOT LIKE 'sqlite_%'
        ORDER BY name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut table_infos = Vec::new();

    for (table_name,) in tables {
        // Names come from sqlite_master, quoted as identifiers
        let query = format!(
            "SELECT COUNT(*) FROM \"{}\"",
            table_name.replace('"', "\"\"")
        );
        let row_count: i64 = sqlx::query_scalar(&query).fetch_one(pool).await?;

        table_infos.push(TableInfo {
            name: table_name,
            row_count,
        });
    }

    Ok(table_infos)
}
