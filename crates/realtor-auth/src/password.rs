//! Password hashing and verification using Argon2id

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use realtor_core::error::AppError;
use tracing::{debug, error};

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Password hashing service using Argon2
#[derive(Debug, Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    /// Create a new password service with default Argon2 parameters
    ///
    /// # Examples
    ///
    /// ```
    /// use realtor_auth::PasswordService;
    ///
    /// let password_service = PasswordService::new();
    /// ```
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Reject passwords that are too short to register with
    pub fn validate_strength(&self, password: &str) -> Result<(), AppError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }

    /// Hash a password into PHC string format
    ///
    /// # Errors
    ///
    /// Returns `AppError::PasswordHash` if hashing fails
    ///
    /// # Examples
    ///
    /// ```
    /// use realtor_auth::PasswordService;
    ///
    /// let password_service = PasswordService::new();
    /// let hash = password_service.hash_password("my_secure_password")?;
    /// # Ok::<(), realtor_core::error::AppError>(())
    /// ```
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        debug!("Hashing password");

        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "Failed to hash password");
                AppError::PasswordHash(format!("Password hashing failed: {}", e))
            })?;

        Ok(password_hash.to_string())
    }

    /// Verify a password against a hash
    ///
    /// Returns `Ok(false)` on mismatch; errors only on a malformed hash.
    ///
    /// # Examples
    ///
    /// ```
    /// use realtor_auth::PasswordService;
    ///
    /// let password_service = PasswordService::new();
    /// let hash = password_service.hash_password("my_password")?;
    ///
    /// assert!(password_service.verify_password("my_password", &hash)?);
    /// assert!(!password_service.verify_password("wrong_password", &hash)?);
    /// # Ok::<(), realtor_core::error::AppError>(())
    /// ```
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        debug!("Verifying password");

        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "Failed to parse password hash");
            AppError::PasswordHash(format!("Invalid password hash format: {}", e))
        })?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification failed: incorrect password");
                Ok(false)
            }
            Err(e) => {
                error!(error = %e, "Password verification error");
                Err(AppError::PasswordHash(format!(
                    "Password verification failed: {}",
                    e
                )))
            }
        }
    }

    /// Login check: any mismatch is reported as invalid credentials
    pub fn verify_login(&self, password: &str, hash: &str) -> Result<(), AppError> {
        if self.verify_password(password, hash)? {
            Ok(())
        } else {
            Err(AppError::InvalidCredentials)
        }
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new()
    }
}
