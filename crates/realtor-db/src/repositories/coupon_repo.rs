//! Coupon repository implementation
//!
//! Provides PostgreSQL-backed storage for coupons and their per-user usages.
//! Claims run in a single transaction: a conflict-free usage insert followed
//! by a conditional `used_count` increment.

use super::is_unique_violation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use realtor_core::{
    models::{Coupon, CouponScope, CouponUsage, UserCoupon},
    traits::{CouponClaim, CouponRepository, Repository},
    AppError, AppResult,
};
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const COUPON_COLUMNS: &str = r#"
    id, name, credits, tp, active, description, usage_limit, used_count,
    expires_at, created_at, updated_at
"#;

/// PostgreSQL implementation of CouponRepository
pub struct PgCouponRepository {
    pool: PgPool,
}

impl PgCouponRepository {
    /// Create a new coupon repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_write_error(e: sqlx::Error, name: &str) -> AppError {
        if is_unique_violation(&e) {
            AppError::AlreadyExists(format!("Coupon {} already exists", name))
        } else {
            error!("Database error writing coupon {}: {}", name, e);
            AppError::Database(format!("Failed to write coupon: {}", e))
        }
    }
}

#[async_trait]
impl Repository<Coupon, Uuid> for PgCouponRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Coupon>> {
        debug!("Finding coupon by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, CouponRow>(&format!(
            "SELECT {} FROM coupons WHERE id = $1",
            COUPON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding coupon {}: {}", id, e);
            AppError::Database(format!("Failed to find coupon: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Coupon>> {
        let rows = sqlx::query_as::<sqlx::Postgres, CouponRow>(&format!(
            "SELECT {} FROM coupons ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            COUPON_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing coupons: {}", e);
            AppError::Database(format!("Failed to fetch coupons: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM coupons")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting coupons: {}", e);
                AppError::Database(format!("Failed to count coupons: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity), fields(name = %entity.name))]
    async fn create(&self, entity: &Coupon) -> AppResult<Coupon> {
        let name = Coupon::normalize_code(&entity.name);
        debug!("Creating coupon {}", name);

        let row = sqlx::query_as::<sqlx::Postgres, CouponRow>(&format!(
            r#"
            INSERT INTO coupons (
                name, credits, tp, active, description, usage_limit, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            COUPON_COLUMNS
        ))
        .bind(&name)
        .bind(entity.credits)
        .bind(entity.tp.to_string())
        .bind(entity.active)
        .bind(&entity.description)
        .bind(entity.usage_limit)
        .bind(entity.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &name))?;

        info!("Created coupon {} ({} credits)", name, entity.credits);
        Ok(row.into())
    }

    #[instrument(skip(self, entity), fields(id = %entity.id))]
    async fn update(&self, entity: &Coupon) -> AppResult<Coupon> {
        let name = Coupon::normalize_code(&entity.name);
        debug!("Updating coupon {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, CouponRow>(&format!(
            r#"
            UPDATE coupons
            SET name = $2,
                credits = $3,
                tp = $4,
                active = $5,
                description = $6,
                usage_limit = $7,
                expires_at = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COUPON_COLUMNS
        ))
        .bind(entity.id)
        .bind(&name)
        .bind(entity.credits)
        .bind(entity.tp.to_string())
        .bind(entity.active)
        .bind(&entity.description)
        .bind(entity.usage_limit)
        .bind(entity.expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &name))?
        .ok_or_else(|| AppError::CouponNotFound(entity.id.to_string()))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        debug!("Deleting coupon: {}", id);

        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting coupon {}: {}", id, e);
                AppError::Database(format!("Failed to delete coupon: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CouponRepository for PgCouponRepository {
    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Coupon>> {
        let normalized = Coupon::normalize_code(name);
        debug!("Finding coupon by name: {}", normalized);

        let row = sqlx::query_as::<sqlx::Postgres, CouponRow>(&format!(
            "SELECT {} FROM coupons WHERE name = $1",
            COUPON_COLUMNS
        ))
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding coupon {}: {}", normalized, e);
            AppError::Database(format!("Failed to find coupon: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list_active(&self) -> AppResult<Vec<Coupon>> {
        let rows = sqlx::query_as::<sqlx::Postgres, CouponRow>(&format!(
            r#"
            SELECT {} FROM coupons
            WHERE active
              AND (expires_at IS NULL OR expires_at > NOW())
            ORDER BY created_at
            "#,
            COUPON_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing active coupons: {}", e);
            AppError::Database(format!("Failed to fetch coupons: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn find_usage(&self, coupon_id: Uuid, user_id: Uuid) -> AppResult<Option<CouponUsage>> {
        let row = sqlx::query_as::<sqlx::Postgres, CouponUsageRow>(
            r#"
            SELECT id, coupon_id, user_id, redeemed_at, created_at
            FROM coupon_usages
            WHERE coupon_id = $1 AND user_id = $2
            "#,
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding coupon usage: {}", e);
            AppError::Database(format!("Failed to find coupon usage: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn claim(&self, coupon_id: Uuid, user_id: Uuid) -> AppResult<CouponClaim> {
        debug!("Claiming coupon {} for user {}", coupon_id, user_id);

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        let usage = sqlx::query_as::<sqlx::Postgres, CouponUsageRow>(
            r#"
            INSERT INTO coupon_usages (coupon_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (coupon_id, user_id) DO NOTHING
            RETURNING id, coupon_id, user_id, redeemed_at, created_at
            "#,
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to insert coupon usage: {}", e);
            AppError::Database(format!("Failed to insert coupon usage: {}", e))
        })?;

        let Some(usage) = usage else {
            debug!("User {} already holds coupon {}", user_id, coupon_id);
            return Ok(CouponClaim::AlreadyClaimed);
        };

        // The row lock taken here serializes competing claims on the last slot
        let bumped = sqlx::query(
            r#"
            UPDATE coupons
            SET used_count = used_count + 1,
                updated_at = NOW()
            WHERE id = $1
              AND active
              AND (expires_at IS NULL OR expires_at > NOW())
              AND (usage_limit IS NULL OR usage_limit <= 0 OR used_count < usage_limit)
            "#,
        )
        .bind(coupon_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to increment coupon usage count: {}", e);
            AppError::Database(format!("Failed to update coupon: {}", e))
        })?;

        if bumped.rows_affected() == 0 {
            debug!("Coupon {} no longer available", coupon_id);
            return Ok(CouponClaim::Unavailable);
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        info!("Coupon {} claimed by user {}", coupon_id, user_id);
        Ok(CouponClaim::Claimed(usage.into()))
    }

    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<UserCoupon>> {
        let rows = sqlx::query_as::<sqlx::Postgres, UserCouponRow>(
            r#"
            SELECT
                c.id, c.name, c.credits, c.tp, c.active, c.description,
                c.usage_limit, c.used_count, c.expires_at, c.created_at, c.updated_at,
                u.created_at AS granted_at, u.redeemed_at
            FROM coupon_usages u
            JOIN coupons c ON c.id = u.coupon_id
            WHERE u.user_id = $1
            ORDER BY u.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing coupons for user {}: {}", user_id, e);
            AppError::Database(format!("Failed to fetch user coupons: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: Uuid,
    name: String,
    credits: i64,
    tp: String,
    active: bool,
    description: Option<String>,
    usage_limit: Option<i32>,
    used_count: i32,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            credits: row.credits,
            tp: CouponScope::from_str(&row.tp).unwrap_or_default(),
            active: row.active,
            description: row.description,
            usage_limit: row.usage_limit,
            used_count: row.used_count,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CouponUsageRow {
    id: Uuid,
    coupon_id: Uuid,
    user_id: Uuid,
    redeemed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<CouponUsageRow> for CouponUsage {
    fn from(row: CouponUsageRow) -> Self {
        Self {
            id: row.id,
            coupon_id: row.coupon_id,
            user_id: row.user_id,
            redeemed_at: row.redeemed_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserCouponRow {
    #[sqlx(flatten)]
    coupon: CouponRow,
    granted_at: DateTime<Utc>,
    redeemed_at: Option<DateTime<Utc>>,
}

impl From<UserCouponRow> for UserCoupon {
    fn from(row: UserCouponRow) -> Self {
        Self {
            coupon: row.coupon.into(),
            granted_at: row.granted_at,
            redeemed_at: row.redeemed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support;

    async fn coupon(repo: &PgCouponRepository, usage_limit: Option<i32>) -> Coupon {
        repo.create(&Coupon {
            name: format!("TEST-{}", Uuid::new_v4().simple()),
            credits: 50,
            usage_limit,
            ..Default::default()
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_same_user_claims_once() {
        let pool = test_support::pool().await;
        let repo = PgCouponRepository::new(pool.clone());
        let coupon = coupon(&repo, None).await;
        let user = test_support::user(&pool).await;

        let (first, second) = tokio::join!(
            repo.claim(coupon.id, user),
            repo.claim(coupon.id, user)
        );
        let claimed = [first.unwrap(), second.unwrap()]
            .iter()
            .filter(|c| matches!(c, CouponClaim::Claimed(_)))
            .count();
        assert_eq!(claimed, 1);

        assert!(matches!(
            repo.claim(coupon.id, user).await.unwrap(),
            CouponClaim::AlreadyClaimed
        ));
        let stored = repo.find_by_id(coupon.id).await.unwrap().unwrap();
        assert_eq!(stored.used_count, 1);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_usage_limit_rejects_next_user() {
        let pool = test_support::pool().await;
        let repo = PgCouponRepository::new(pool.clone());
        let coupon = coupon(&repo, Some(2)).await;

        for _ in 0..2 {
            let user = test_support::user(&pool).await;
            assert!(matches!(
                repo.claim(coupon.id, user).await.unwrap(),
                CouponClaim::Claimed(_)
            ));
        }

        let late = test_support::user(&pool).await;
        assert!(matches!(
            repo.claim(coupon.id, late).await.unwrap(),
            CouponClaim::Unavailable
        ));
        // Usage insert rolled back with the rejected increment
        assert!(repo.find_usage(coupon.id, late).await.unwrap().is_none());
        let stored = repo.find_by_id(coupon.id).await.unwrap().unwrap();
        assert_eq!(stored.used_count, 2);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_inactive_coupon_unavailable() {
        let pool = test_support::pool().await;
        let repo = PgCouponRepository::new(pool.clone());
        let mut coupon = coupon(&repo, None).await;
        coupon.active = false;
        repo.update(&coupon).await.unwrap();
        let user = test_support::user(&pool).await;

        assert!(matches!(
            repo.claim(coupon.id, user).await.unwrap(),
            CouponClaim::Unavailable
        ));
        assert!(repo.list_for_user(user).await.unwrap().is_empty());
    }
}
