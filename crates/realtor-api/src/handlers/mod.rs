//! HTTP request handlers

pub mod auth;
pub mod coupon;
pub mod credit;
pub mod dashboard;
pub mod payment;
pub mod pricing;
pub mod service;
pub mod user;

pub use auth::configure as configure_auth;
pub use coupon::configure as configure_coupons;
pub use credit::configure as configure_credit_records;
pub use dashboard::configure as configure_dashboard;
pub use payment::configure as configure_payment;
pub use pricing::configure as configure_pricing;
pub use service::configure as configure_services;
pub use user::configure as configure_user;
