//! Authentication DTOs
//!
//! Request and response types for authentication endpoints.

use realtor_core::models::UserProfile;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account email
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Access token (JWT)
    pub access_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Token expiration time in seconds
    pub expires_in: i64,

    /// Profile of the signed-in user
    pub user: UserProfile,
}

impl LoginResponse {
    /// Create a new login response
    pub fn new(access_token: String, expires_in: i64, user: UserProfile) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let ok = LoginRequest {
            email: "agent@example.com".to_string(),
            password: "secret".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = LoginRequest {
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let no_password = LoginRequest {
            email: "agent@example.com".to_string(),
            password: String::new(),
        };
        assert!(no_password.validate().is_err());
    }

    #[test]
    fn test_login_response_hides_password_hash() {
        let user = UserProfile {
            email: "agent@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            ..UserProfile::default()
        };
        let response = LoginResponse::new("token".to_string(), 3600, user);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["expires_in"], 3600);
        assert!(json["user"].get("password_hash").is_none());
    }
}
