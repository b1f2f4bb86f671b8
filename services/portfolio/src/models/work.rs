//! Work models for the portfolio service

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A portfolio item as served by the public list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Work {
    pub id: i64,
    pub title: String,
    #[serde(rename = "desc")]
    pub description: String,
    /// Path under the upload prefix, e.g. `/uploads/1700000000000.png`
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: String,
}

/// Lightweight entry for the admin management list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkSummary {
    pub id: i64,
    pub title: String,
}

/// Row data for a newly uploaded work
#[derive(Debug, Clone)]
pub struct NewWork {
    pub title: String,
    pub description: String,
    pub url: String,
    pub media_type: String,
}

/// Request for deleting a work
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteWorkRequest {
    pub id: i64,
}
