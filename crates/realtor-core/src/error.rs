//! Unified error handling for the realtor service
//!
//! Every failure in the workspace ends up as an `AppError`, which maps itself
//! onto an HTTP status and a stable error code.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // ==================== Authentication Errors ====================
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    #[error("Account pending approval: {0}")]
    ApprovalRequired(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    // ==================== Ledger Errors ====================
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Insufficient credits: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    // ==================== Coupon Errors ====================
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    #[error("Coupon expired: {0}")]
    CouponExpired(String),

    #[error("Coupon usage limit reached: {0}")]
    CouponLimitReached(String),

    #[error("Coupon already used: {0}")]
    CouponAlreadyUsed(String),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // ==================== External Service Errors ====================
    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    #[error("Mail delivery failed: {0}")]
    Mail(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_)
            | AppError::InvalidInput(_)
            | AppError::MissingField(_)
            | AppError::CouponExpired(_)
            | AppError::CouponLimitReached(_)
            | AppError::CouponAlreadyUsed(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::InvalidCredentials
            | AppError::InvalidToken(_)
            | AppError::TokenExpired
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            // 402 Payment Required
            AppError::InsufficientBalance { .. } | AppError::PaymentFailed(_) => {
                StatusCode::PAYMENT_REQUIRED
            }

            // 403 Forbidden
            AppError::Forbidden | AppError::ApprovalRequired(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::UserNotFound(_) | AppError::CouponNotFound(_) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }

            // 409 Conflict
            AppError::Conflict(_) | AppError::AlreadyExists(_) => StatusCode::CONFLICT,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::TokenExpired => "token_expired",
            AppError::InvalidToken(_) => "invalid_token",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::ApprovalRequired(_) => "approval_required",
            AppError::PasswordHash(_) => "password_error",
            AppError::UserNotFound(_) => "user_not_found",
            AppError::InsufficientBalance { .. } => "insufficient_credits",
            AppError::PaymentFailed(_) => "payment_failed",
            AppError::CouponNotFound(_) => "coupon_not_found",
            AppError::CouponExpired(_) => "coupon_expired",
            AppError::CouponLimitReached(_) => "coupon_limit_reached",
            AppError::CouponAlreadyUsed(_) => "coupon_already_used",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::MissingField(_) => "missing_field",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
            AppError::PaymentGateway(_) => "payment_gateway_error",
            AppError::Mail(_) => "mail_error",
        }
    }

    /// Whether the error originates from a user mistake rather than the system
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
