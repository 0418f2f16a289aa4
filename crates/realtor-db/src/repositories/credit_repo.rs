//! Credit ledger repository implementation
//!
//! Ledger rows and the denormalized `user_profiles.credits` balance are only
//! ever changed together, inside one transaction, with the profile row locked
//! or incremented atomically. A charge that pays for a service request moves
//! the request to `paid` in that same transaction.

use super::is_unique_violation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use realtor_core::{
    models::{ChargeOutcome, CreditRecord, CreditStatus, CreditType, NewCharge, TopupOutcome},
    traits::CreditRecordRepository,
    AppError, AppResult,
};
use sqlx::{types::Json, PgPool};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

const RECORD_COLUMNS: &str = r#"
    id, user_id, amount, tp, tp_id, status, stripe_client_secret,
    coupon_id, notes, created_at, updated_at
"#;

/// PostgreSQL implementation of CreditRecordRepository
pub struct PgCreditRecordRepository {
    pool: PgPool,
}

impl PgCreditRecordRepository {
    /// Create a new credit record repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreditRecordRepository for PgCreditRecordRepository {
    #[instrument(skip(self))]
    async fn find_pending_topup(&self, user_id: Uuid) -> AppResult<Option<CreditRecord>> {
        debug!("Finding pending top-up for user {}", user_id);

        let row = sqlx::query_as::<sqlx::Postgres, CreditRecordRow>(&format!(
            r#"
            SELECT {} FROM credit_records
            WHERE user_id = $1 AND tp = 'topup' AND status = 'pending'
            "#,
            RECORD_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding pending top-up: {}", e);
            AppError::Database(format!("Failed to find pending top-up: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, client_secret))]
    async fn create_pending_topup(
        &self,
        user_id: Uuid,
        amount: i64,
        client_secret: &str,
    ) -> AppResult<CreditRecord> {
        debug!("Creating pending top-up of {} for user {}", amount, user_id);

        let row = sqlx::query_as::<sqlx::Postgres, CreditRecordRow>(&format!(
            r#"
            INSERT INTO credit_records (user_id, amount, tp, status, stripe_client_secret)
            VALUES ($1, $2, 'topup', 'pending', $3)
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(user_id)
        .bind(amount)
        .bind(client_secret)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("User {} already has a pending top-up", user_id))
            } else {
                error!("Database error creating pending top-up: {}", e);
                AppError::Database(format!("Failed to create top-up: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn update_pending_amount(&self, record_id: Uuid, amount: i64) -> AppResult<CreditRecord> {
        debug!("Updating pending top-up {} to {}", record_id, amount);

        let row = sqlx::query_as::<sqlx::Postgres, CreditRecordRow>(&format!(
            r#"
            UPDATE credit_records
            SET amount = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(record_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating top-up {}: {}", record_id, e);
            AppError::Database(format!("Failed to update top-up: {}", e))
        })?
        .ok_or_else(|| AppError::NotFound(format!("Pending top-up {}", record_id)))?;

        Ok(row.into())
    }

    #[instrument(skip(self, notes))]
    async fn settle_topup(
        &self,
        record_id: Uuid,
        credited: i64,
        notes: Option<String>,
    ) -> AppResult<Option<TopupOutcome>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        // Guarded on status so a repeated confirmation credits once
        let record = sqlx::query_as::<sqlx::Postgres, CreditRecordRow>(&format!(
            r#"
            UPDATE credit_records
            SET status = 'done',
                amount = $2,
                notes = $3,
                updated_at = NOW()
            WHERE id = $1 AND tp = 'topup' AND status = 'pending'
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(record_id)
        .bind(credited)
        .bind(&notes)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to settle top-up {}: {}", record_id, e);
            AppError::Database(format!("Failed to settle top-up: {}", e))
        })?;

        let Some(record) = record else {
            warn!("Top-up {} is no longer pending", record_id);
            return Ok(None);
        };
        let record: CreditRecord = record.into();

        let balance: (i64,) = sqlx::query_as(
            r#"
            UPDATE user_profiles
            SET credits = credits + $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING credits
            "#,
        )
        .bind(record.user_id)
        .bind(credited)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to credit balance for user {}: {}", record.user_id, e);
            AppError::Database(format!("Failed to update balance: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        info!(
            "Top-up {} settled: user {} credited {}, balance {}",
            record.id, record.user_id, credited, balance.0
        );

        Ok(Some(TopupOutcome {
            record,
            credited,
            balance: balance.0,
        }))
    }

    #[instrument(skip(self, charge), fields(user_id = %charge.user_id, tp = %charge.tp, total = charge.total))]
    async fn settle_charge(&self, charge: &NewCharge) -> AppResult<ChargeOutcome> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        // Lock profile row
        let (available,): (i64,) = sqlx::query_as(
            r#"
            SELECT credits FROM user_profiles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(charge.user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to lock user profile: {}", e);
            AppError::Database(format!("Failed to lock user profile: {}", e))
        })?
        .ok_or_else(|| AppError::UserNotFound(charge.user_id.to_string()))?;

        if let Some(change) = &charge.request_change {
            let request_id = charge
                .tp_id
                .ok_or_else(|| AppError::MissingField("tp_id".to_string()))?;

            // Guarded on status so a request is paid once
            let moved = sqlx::query(
                r#"
                UPDATE service_requests
                SET status = $3,
                    history = history || $4::JSONB,
                    updated_at = NOW()
                WHERE id = $1 AND user_id = $2 AND status = $5
                "#,
            )
            .bind(request_id)
            .bind(charge.user_id)
            .bind(change.to.to_string())
            .bind(Json(vec![change]))
            .bind(change.from.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to move service request {}: {}", request_id, e);
                AppError::Database(format!("Failed to update service request: {}", e))
            })?;

            if moved.rows_affected() == 0 {
                warn!(
                    "Service request {} is no longer {}, charge rejected",
                    request_id, change.from
                );
                return Err(AppError::Conflict(format!(
                    "Request {} is no longer {}",
                    request_id, change.from
                )));
            }
        }

        if available < charge.total {
            warn!(
                "Insufficient credits for user {}: required {}, available {}",
                charge.user_id, charge.total, available
            );
            return Err(AppError::InsufficientBalance {
                required: charge.total,
                available,
            });
        }

        if let Some(coupon_id) = charge.coupon_id {
            let spent = sqlx::query(
                r#"
                UPDATE coupon_usages
                SET redeemed_at = NOW()
                WHERE coupon_id = $1 AND user_id = $2 AND redeemed_at IS NULL
                "#,
            )
            .bind(coupon_id)
            .bind(charge.user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to spend coupon usage: {}", e);
                AppError::Database(format!("Failed to update coupon usage: {}", e))
            })?;

            if spent.rows_affected() == 0 {
                return Err(AppError::CouponAlreadyUsed(coupon_id.to_string()));
            }
        }

        let record = sqlx::query_as::<sqlx::Postgres, CreditRecordRow>(&format!(
            r#"
            INSERT INTO credit_records (user_id, amount, tp, tp_id, status, coupon_id)
            VALUES ($1, $2, $3, $4, 'done', $5)
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(charge.user_id)
        .bind(-charge.total)
        .bind(charge.tp.to_string())
        .bind(charge.tp_id)
        .bind(charge.coupon_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to insert charge record: {}", e);
            AppError::Database(format!("Failed to insert charge: {}", e))
        })?;

        let balance: (i64,) = sqlx::query_as(
            r#"
            UPDATE user_profiles
            SET credits = credits - $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING credits
            "#,
        )
        .bind(charge.user_id)
        .bind(charge.total)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to debit balance: {}", e);
            AppError::Database(format!("Failed to update balance: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        info!(
            "Charged user {} {} credits for {}, balance {}",
            charge.user_id, charge.total, charge.tp, balance.0
        );

        Ok(ChargeOutcome {
            record: record.into(),
            balance: balance.0,
        })
    }

    #[instrument(skip(self))]
    async fn sum_done(&self, user_id: Uuid) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount), 0)::BIGINT
            FROM credit_records
            WHERE user_id = $1 AND status = 'done'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error summing ledger for {}: {}", user_id, e);
            AppError::Database(format!("Failed to sum ledger: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn sum_spent(&self, user_id: Uuid) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(-SUM(amount), 0)::BIGINT
            FROM credit_records
            WHERE user_id = $1 AND status = 'done' AND amount < 0
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error summing spent credits for {}: {}", user_id, e);
            AppError::Database(format!("Failed to sum ledger: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<CreditRecord>> {
        let rows = sqlx::query_as::<sqlx::Postgres, CreditRecordRow>(&format!(
            r#"
            SELECT {} FROM credit_records
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            RECORD_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing ledger for {}: {}", user_id, e);
            AppError::Database(format!("Failed to fetch ledger: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct CreditRecordRow {
    id: Uuid,
    user_id: Uuid,
    amount: i64,
    tp: String,
    tp_id: Option<Uuid>,
    status: String,
    stripe_client_secret: Option<String>,
    coupon_id: Option<Uuid>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CreditRecordRow> for CreditRecord {
    fn from(row: CreditRecordRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            tp: CreditType::from_str(&row.tp).unwrap_or(CreditType::General),
            tp_id: row.tp_id,
            status: CreditStatus::from_str(&row.status).unwrap_or_default(),
            stripe_client_secret: row.stripe_client_secret,
            coupon_id: row.coupon_id,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
