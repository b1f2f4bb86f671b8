//! Work repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::SqlitePool;

use crate::models::work::{NewWork, Work, WorkSummary};

/// Work repository for database operations
#[derive(Clone)]
pub struct WorkRepository {
    pool: SqlitePool,
}

impl WorkRepository {
    /// Create a new work repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get every work, newest first
    pub async fn list_all(&self) -> DatabaseResult<Vec<Work>> {
        sqlx::query_as::<_, Work>(
            r#"
            SELECT id, title, description, url, media_type
            FROM works
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    /// Get id and title of every work, newest first
    pub async fn list_summaries(&self) -> DatabaseResult<Vec<WorkSummary>> {
        sqlx::query_as::<_, WorkSummary>(
            r#"
            SELECT id, title
            FROM works
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    /// Insert a work and return its id
    pub async fn insert(&self, work: &NewWork) -> DatabaseResult<i64> {
        sqlx::query_scalar(
            r#"
            INSERT INTO works (title, description, url, media_type)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&work.title)
        .bind(&work.description)
        .bind(&work.url)
        .bind(&work.media_type)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    /// Delete a work, returning the media URL it referenced
    ///
    /// Deleting an unknown id is not an error and returns `None`.
    pub async fn delete(&self, id: i64) -> DatabaseResult<Option<String>> {
        sqlx::query_scalar(
            r#"
            DELETE FROM works
            WHERE id = ?
            RETURNING url
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }
}
