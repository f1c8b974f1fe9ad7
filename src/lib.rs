//! Shared PostgreSQL connection pool for the HRMS backend.
//!
//! See [`database`] for how the pool is configured and supervised.

pub mod database;
pub mod utils;
