//! Portfolio gallery service
//!
//! A public gallery of media works with a session-guarded admin interface
//! for uploading and deleting them. Uploaded files are kept in a media
//! directory next to a single SQLite table, and the built client bundle is
//! served from the site root.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod storage;

pub use config::AppConfig;
pub use routes::create_router;
pub use state::AppState;
