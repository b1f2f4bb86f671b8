//! Common library for the portfolio application
//!
//! This crate provides shared functionality used by the portfolio service,
//! namely SQLite connectivity, the schema bootstrap and database error
//! handling.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool, init_schema};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     init_schema(&pool).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
