//! User DTOs
//!
//! Data Transfer Objects for registration, profile, coupon and approval endpoints.

use realtor_core::models::{Coupon, NewUserProfile, UserProfile};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Realtor sign-up
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 100))]
    pub first_name: Option<String>,

    #[validate(length(max = 100))]
    pub last_name: Option<String>,

    #[validate(length(max = 30))]
    pub phone: Option<String>,

    #[validate(length(max = 200))]
    pub brokerage: Option<String>,

    #[validate(length(max = 50))]
    pub reco_number: Option<String>,
}

impl RegisterRequest {
    /// Profile fields with the email lower-cased and blanks dropped
    pub fn into_profile(self, password_hash: String) -> NewUserProfile {
        NewUserProfile {
            email: self.email.trim().to_lowercase(),
            password_hash,
            first_name: non_blank(self.first_name),
            last_name: non_blank(self.last_name),
            phone: non_blank(self.phone),
            brokerage: non_blank(self.brokerage),
            reco_number: non_blank(self.reco_number),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Registration result
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,

    /// Credits granted by welcome coupons
    pub welcome_credits: i64,
}

/// Coupon code entered by a realtor
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RedeemCouponRequest {
    #[validate(length(min = 1, max = 64, message = "Coupon code is required"))]
    pub code: String,
}

/// Redeemed coupon and the credits it is worth
#[derive(Debug, Clone, Serialize)]
pub struct RedeemCouponResponse {
    pub coupon: Coupon,
    pub credits: i64,
}

/// Admin approval toggle
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalRequest {
    pub user_id: Uuid,
    pub realtor_approved: bool,
}
