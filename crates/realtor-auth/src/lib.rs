//! Authentication and authorization for the realtor service
//!
//! JWT bearer tokens, Argon2 password hashing and Actix-web extractors
//! for realtor/admin access control.
//!
//! # Examples
//!
//! ```no_run
//! use realtor_auth::{Claims, JwtService, PasswordService};
//! use realtor_core::models::UserRole;
//! use uuid::Uuid;
//!
//! let jwt_service = JwtService::new("your-secret-key", 3600);
//! let claims = Claims::new(Uuid::new_v4(), "agent@example.com", UserRole::Realtor);
//! let token = jwt_service.create_token(&claims)?;
//!
//! let password_service = PasswordService::new();
//! let hash = password_service.hash_password("secure_password")?;
//! password_service.verify_login("secure_password", &hash)?;
//! # Ok::<(), realtor_core::error::AppError>(())
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::{AdminUser, AuthenticatedUser, RealtorUser};
pub use password::PasswordService;

#[cfg(test)]
mod tests {
    use super::*;
    use realtor_core::models::{UserProfile, UserRole};

    #[test]
    fn test_login_flow_issues_token_for_profile() {
        let password_service = PasswordService::new();
        let jwt_service = JwtService::new("test-secret-key-12345", 3600);

        let user = UserProfile {
            email: "agent@example.com".to_string(),
            password_hash: password_service.hash_password("open-house-42").unwrap(),
            role: UserRole::Realtor,
            ..Default::default()
        };

        password_service
            .verify_login("open-house-42", &user.password_hash)
            .unwrap();

        let token = jwt_service.create_token_for_user(&user).unwrap();
        let claims = jwt_service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.role, UserRole::Realtor);
    }
}
