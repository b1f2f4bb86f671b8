//! Repositories for database operations

pub mod work;

pub use work::WorkRepository;
