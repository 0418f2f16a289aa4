//! Domain models for the realtor service
//!
//! This module contains all the core domain models used throughout the application.

pub mod coupon;
pub mod credit;
pub mod service_request;
pub mod user;

pub use coupon::{Coupon, CouponDraft, CouponScope, CouponUsage, UserCoupon};
pub use credit::{
    ChargeOutcome, CreditRecord, CreditStatus, CreditType, NewCharge, TopupOutcome,
};
pub use service_request::{
    NewServiceRequest, ServiceDetails, ServiceKind, ServiceRequest, ServiceStatus, StatusChange,
};
pub use user::{NewUserProfile, UserProfile, UserRole};
