//! Data Transfer Objects (DTOs) for API requests and responses

pub mod auth;
pub mod common;
pub mod coupon;
pub mod credit;
pub mod dashboard;
pub mod payment;
pub mod service;
pub mod user;

pub use auth::*;
pub use common::*;
pub use coupon::*;
pub use credit::*;
pub use dashboard::*;
pub use payment::*;
pub use service::*;
pub use user::*;
