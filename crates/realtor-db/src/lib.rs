//! Realtor Service Database Layer
//!
//! This crate provides PostgreSQL database access and repository implementations
//! for the realtor service. It includes:
//!
//! - Connection pool management with sqlx
//! - Embedded schema migrations
//! - Repository implementations for profiles, coupons, ledger rows and service requests
//! - Transactions with row locks for every balance and coupon mutation

pub mod pool;
pub mod repositories;

pub use pool::{create_pool, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use realtor_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
