//! Integration tests for the database infrastructure
//!
//! These tests verify that a file-backed SQLite database is created on
//! first use, receives the schema and keeps its rows across pools.

use common::database::{DatabaseConfig, health_check, init_pool, init_schema};
use sqlx::Row;
use tempfile::TempDir;

/// Test that a fresh database file is created, migrated and reopened
#[tokio::test]
async fn test_database_file_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("db.sqlite");
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}", db_path.display()),
        max_connections: 2,
    };

    // Initialize SQLite connection pool
    let pool = init_pool(&config).await?;
    assert!(db_path.exists(), "Database file was not created");
    assert!(health_check(&pool).await?, "Database health check failed");

    init_schema(&pool).await?;

    sqlx::query("INSERT INTO works (title, description, url, media_type) VALUES (?, ?, ?, ?)")
        .bind("Logo")
        .bind("Brand mark")
        .bind("/uploads/1.png")
        .bind("image/png")
        .execute(&pool)
        .await?;
    pool.close().await;

    // Reopen and check the row survived
    let pool = init_pool(&config).await?;
    init_schema(&pool).await?;

    let row = sqlx::query("SELECT id, title, media_type FROM works")
        .fetch_one(&pool)
        .await?;

    let id: i64 = row.get("id");
    let title: String = row.get("title");
    let media_type: String = row.get("media_type");
    assert_eq!(id, 1);
    assert_eq!(title, "Logo");
    assert_eq!(media_type, "image/png");

    Ok(())
}
