//! Repository implementations
//!
//! This module contains concrete implementations of the repository traits
//! defined in realtor-core, using sqlx for PostgreSQL access.

pub mod coupon_repo;
pub mod credit_repo;
pub mod service_request_repo;
pub mod user_repo;

pub use coupon_repo::PgCouponRepository;
pub use credit_repo::PgCreditRecordRepository;
pub use service_request_repo::PgServiceRequestRepository;
pub use user_repo::PgUserProfileRepository;

/// Whether a sqlx error is a unique constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}
