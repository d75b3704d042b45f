//! Tests for database initialization
//!
//! - Database file and parent directory created on first run
//! - Reopening an existing database keeps its records
//! - Schema version recorded once

use plates_common::db::init::{init_database, SCHEMA_VERSION};
use plates_common::plate::PlateKey;
use plates_common::{PlateStore, SqlitePlateStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("plates_bot_db.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_plate_records_table_created() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("test.db")).await.unwrap();

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'plate_records'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);

    let index: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM sqlite_master
        WHERE type = 'index' AND name = 'idx_plate_records_plate_key'
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(index, 1, "plate_key index missing");
}

#[tokio::test]
async fn test_database_opens_existing_and_keeps_records() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("existing.db");
    let plate = PlateKey::parse("12 AB 345").unwrap();

    {
        let pool = init_database(&db_path).await.unwrap();
        let store = SqlitePlateStore::new(pool.clone(), "existing");
        store.save(&plate, b"photo-1").await.unwrap();
        pool.close().await;
    }

    let pool = init_database(&db_path).await.unwrap();
    let store = SqlitePlateStore::new(pool, "existing");
    assert_eq!(store.search(&plate).await.unwrap(), vec![b"photo-1".to_vec()]);

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_version")
        .fetch_all(store.pool())
        .await
        .unwrap();
    assert_eq!(versions, vec![SCHEMA_VERSION]);
}
