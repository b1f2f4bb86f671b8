//! API models for request and response payloads

use serde::Deserialize;

pub mod work;

/// Request for admin login
///
/// Missing fields are empty and simply fail verification.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
}
