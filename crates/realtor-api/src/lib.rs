//! API layer for the realtor service
//!
//! HTTP handlers for registration, credits, top-ups, coupons, service
//! requests and the admin dashboard.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

pub mod dto;
pub mod handlers;

// Re-export DTOs (common types)
pub use dto::{ApiResponse, PaginationParams};

pub use handlers::{
    configure_auth, configure_coupons, configure_credit_records, configure_dashboard,
    configure_payment, configure_pricing, configure_services, configure_user,
};

use actix_web::web;

/// Mount every API route on `cfg`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth)
        .configure(configure_user)
        .configure(configure_credit_records)
        .configure(configure_payment)
        .configure(configure_coupons)
        .configure(configure_dashboard)
        .configure(configure_services)
        .configure(configure_pricing);
}
