//! User profile repository implementation

use super::is_unique_violation;
use chrono::{DateTime, Utc};
use realtor_core::{
    models::{NewUserProfile, UserProfile, UserRole},
    traits::UserProfileRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

const PROFILE_COLUMNS: &str = r#"
    id, email, password_hash, first_name, last_name, phone, brokerage,
    reco_number, role, realtor_approved, credits, created_at, updated_at
"#;

/// PostgreSQL implementation of UserProfileRepository
pub struct PgUserProfileRepository {
    pool: PgPool,
}

impl PgUserProfileRepository {
    /// Create a new user profile repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserProfileRepository for PgUserProfileRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserProfile>> {
        debug!("Finding user profile by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, UserProfileRow>(&format!(
            "SELECT {} FROM user_profiles WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding user profile {}: {}", id, e);
            AppError::Database(format!("Failed to find user profile: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserProfile>> {
        debug!("Finding user profile by email: {}", email);

        let row = sqlx::query_as::<sqlx::Postgres, UserProfileRow>(&format!(
            "SELECT {} FROM user_profiles WHERE LOWER(email) = LOWER($1)",
            PROFILE_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding user profile by email: {}", e);
            AppError::Database(format!("Failed to find user profile: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, profile), fields(email = %profile.email))]
    async fn create(&self, profile: &NewUserProfile) -> AppResult<UserProfile> {
        debug!("Creating user profile");

        let row = sqlx::query_as::<sqlx::Postgres, UserProfileRow>(&format!(
            r#"
            INSERT INTO user_profiles (
                email, password_hash, first_name, last_name, phone, brokerage, reco_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(profile.email.trim().to_lowercase())
        .bind(&profile.password_hash)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(&profile.brokerage)
        .bind(&profile.reco_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyExists(format!("User {} already exists", profile.email))
            } else {
                error!("Database error creating user profile: {}", e);
                AppError::Database(format!("Failed to create user profile: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn list(&self, limit: i64, offset: i64) -> AppResult<(Vec<UserProfile>, i64)> {
        debug!("Listing user profiles: limit={}, offset={}", limit, offset);

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_profiles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting user profiles: {}", e);
                AppError::Database(format!("Failed to count user profiles: {}", e))
            })?;

        let rows = sqlx::query_as::<sqlx::Postgres, UserProfileRow>(&format!(
            "SELECT {} FROM user_profiles ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            PROFILE_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing user profiles: {}", e);
            AppError::Database(format!("Failed to list user profiles: {}", e))
        })?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }

    #[instrument(skip(self))]
    async fn set_approval(&self, id: Uuid, approved: bool) -> AppResult<UserProfile> {
        debug!("Setting realtor approval for {} to {}", id, approved);

        let row = sqlx::query_as::<sqlx::Postgres, UserProfileRow>(&format!(
            r#"
            UPDATE user_profiles
            SET realtor_approved = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating approval for {}: {}", id, e);
            AppError::Database(format!("Failed to update user profile: {}", e))
        })?
        .ok_or_else(|| AppError::UserNotFound(id.to_string()))?;

        Ok(row.into())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserProfileRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    brokerage: Option<String>,
    reco_number: Option<String>,
    role: String,
    realtor_approved: bool,
    credits: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            brokerage: row.brokerage,
            reco_number: row.reco_number,
            role: UserRole::from_str(&row.role).unwrap_or_default(),
            realtor_approved: row.realtor_approved,
            credits: row.credits,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
