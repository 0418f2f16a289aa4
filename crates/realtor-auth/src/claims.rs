//! JWT Claims structure
//!
//! Defines the claims structure used in JWT tokens for authentication.

use chrono::{Duration, Utc};
use realtor_core::error::AppError;
use realtor_core::models::{UserProfile, UserRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user profile id)
    pub sub: String,

    /// Login email
    pub email: String,

    /// User role
    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims for a user id; expiration is set by `JwtService`
    ///
    /// # Examples
    ///
    /// ```
    /// use realtor_auth::Claims;
    /// use realtor_core::models::UserRole;
    /// use uuid::Uuid;
    ///
    /// let id = Uuid::new_v4();
    /// let claims = Claims::new(id, "agent@example.com", UserRole::Realtor);
    /// assert_eq!(claims.user_id().unwrap(), id);
    /// ```
    pub fn new(user_id: Uuid, email: &str, role: UserRole) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            iat: Utc::now().timestamp(),
            exp: 0,
        }
    }

    /// Create claims for a stored profile
    pub fn for_user(user: &UserProfile) -> Self {
        Self::new(user.id, &user.email, user.role)
    }

    /// Create new claims with custom expiration duration
    pub fn with_expiration(
        user_id: Uuid,
        email: &str,
        role: UserRole,
        expires_in_secs: i64,
    ) -> Self {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in_secs);

        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }

    /// Parse the subject as a user id
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::InvalidToken("subject is not a user id".to_string()))
    }

    /// Check if user has admin privileges
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let id = Uuid::new_v4();
        let claims = Claims::new(id, "agent@example.com", UserRole::Realtor);
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email, "agent@example.com");
        assert_eq!(claims.exp, 0);
        assert!(claims.iat > 0);
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_claims_with_expiration() {
        let claims =
            Claims::with_expiration(Uuid::new_v4(), "admin@example.com", UserRole::Admin, 3600);
        assert!(!claims.is_expired());
        assert!(claims.is_admin());

        let now = Utc::now().timestamp();
        assert!(claims.exp > now);
        assert!(claims.exp <= now + 3600);
    }

    #[test]
    fn test_expired_claims() {
        let mut claims = Claims::new(Uuid::new_v4(), "a@b.c", UserRole::Realtor);
        claims.exp = (Utc::now() - Duration::hours(1)).timestamp();
        assert!(claims.is_expired());
    }

    #[test]
    fn test_for_user() {
        let user = UserProfile {
            email: "jane@example.com".to_string(),
            role: UserRole::Admin,
            ..Default::default()
        };
        let claims = Claims::for_user(&user);
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[test]
    fn test_malformed_subject() {
        let mut claims = Claims::new(Uuid::new_v4(), "a@b.c", UserRole::Realtor);
        claims.sub = "admin".to_string();
        assert!(matches!(claims.user_id(), Err(AppError::InvalidToken(_))));
    }
}
