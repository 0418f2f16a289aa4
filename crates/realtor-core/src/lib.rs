//! Realtor Service Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the realtor service backend. It includes:
//!
//! - Domain models (UserProfile, CreditRecord, Coupon, ServiceRequest)
//! - Pricing calculators for staging, cleaning, video and social media
//! - Repository and external service traits
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod pricing;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
