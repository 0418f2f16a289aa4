//! Service request repository implementation
//!
//! Kind-specific details and the status history are stored as JSONB.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use realtor_core::{
    models::{
        NewServiceRequest, ServiceDetails, ServiceKind, ServiceRequest, ServiceStatus,
        StatusChange,
    },
    traits::{ServiceCounts, ServiceRequestRepository},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const REQUEST_COLUMNS: &str = r#"
    id, user_id, kind, status, details, estimate_price, quotation_price,
    notes, history, is_admin_unread, is_user_unread, created_at, updated_at
"#;

/// PostgreSQL implementation of ServiceRequestRepository
pub struct PgServiceRequestRepository {
    pool: PgPool,
}

impl PgServiceRequestRepository {
    /// Create a new service request repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRequestRepository for PgServiceRequestRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ServiceRequest>> {
        debug!("Finding service request by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, ServiceRequestRow>(&format!(
            "SELECT {} FROM service_requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding service request {}: {}", id, e);
            AppError::Database(format!("Failed to find service request: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        kind: ServiceKind,
        user_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<ServiceRequest>, i64)> {
        debug!(
            "Listing {} requests: user={:?}, limit={}, offset={}",
            kind, user_id, limit, offset
        );

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM service_requests
            WHERE kind = $1 AND ($2::UUID IS NULL OR user_id = $2)
            "#,
        )
        .bind(kind.to_string())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting service requests: {}", e);
            AppError::Database(format!("Failed to count service requests: {}", e))
        })?;

        let rows = sqlx::query_as::<sqlx::Postgres, ServiceRequestRow>(&format!(
            r#"
            SELECT {} FROM service_requests
            WHERE kind = $1 AND ($2::UUID IS NULL OR user_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            REQUEST_COLUMNS
        ))
        .bind(kind.to_string())
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing service requests: {}", e);
            AppError::Database(format!("Failed to fetch service requests: {}", e))
        })?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    async fn create(&self, request: &NewServiceRequest) -> AppResult<ServiceRequest> {
        let kind = request.details.kind();
        debug!("Creating {} request", kind);

        let row = sqlx::query_as::<sqlx::Postgres, ServiceRequestRow>(&format!(
            r#"
            INSERT INTO service_requests (
                user_id, kind, status, details, estimate_price, notes,
                is_admin_unread, is_user_unread
            )
            VALUES ($1, $2, 'submitted', $3, $4, $5, TRUE, FALSE)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(request.user_id)
        .bind(kind.to_string())
        .bind(Json(&request.details))
        .bind(request.estimate_price)
        .bind(&request.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating service request: {}", e);
            AppError::Database(format!("Failed to create service request: {}", e))
        })?;

        info!("Created {} request {}", kind, row.id);
        Ok(row.into())
    }

    #[instrument(skip(self, change), fields(from = %change.from, to = %change.to))]
    async fn transition(
        &self,
        id: Uuid,
        change: &StatusChange,
        quotation_price: Option<Decimal>,
        notify_user: bool,
    ) -> AppResult<Option<ServiceRequest>> {
        let row = sqlx::query_as::<sqlx::Postgres, ServiceRequestRow>(&format!(
            r#"
            UPDATE service_requests
            SET status = $2,
                quotation_price = COALESCE($3, quotation_price),
                history = history || $4::JSONB,
                is_user_unread = is_user_unread OR $5,
                updated_at = NOW()
            WHERE id = $1 AND status = $6
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(id)
        .bind(change.to.to_string())
        .bind(quotation_price)
        .bind(Json(vec![change]))
        .bind(notify_user)
        .bind(change.from.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating service request {}: {}", id, e);
            AppError::Database(format!("Failed to update service request: {}", e))
        })?;

        if row.is_some() {
            info!("Service request {} moved {} -> {}", id, change.from, change.to);
        }

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, id: Uuid, by_admin: bool) -> AppResult<()> {
        let query = if by_admin {
            "UPDATE service_requests SET is_admin_unread = FALSE WHERE id = $1"
        } else {
            "UPDATE service_requests SET is_user_unread = FALSE WHERE id = $1"
        };

        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error marking request {} read: {}", id, e);
                AppError::Database(format!("Failed to update service request: {}", e))
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_in_status(&self, id: Uuid, statuses: &[ServiceStatus]) -> AppResult<bool> {
        let statuses: Vec<String> = statuses.iter().map(ToString::to_string).collect();

        let result = sqlx::query("DELETE FROM service_requests WHERE id = $1 AND status = ANY($2)")
            .bind(id)
            .bind(&statuses)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting service request {}: {}", id, e);
                AppError::Database(format!("Failed to delete service request: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn counts(&self, user_id: Option<Uuid>) -> AppResult<HashMap<ServiceKind, ServiceCounts>> {
        let rows: Vec<(String, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                kind,
                COUNT(*)::BIGINT,
                COUNT(*) FILTER (WHERE is_user_unread)::BIGINT,
                COUNT(*) FILTER (WHERE is_admin_unread)::BIGINT
            FROM service_requests
            WHERE $1::UUID IS NULL OR user_id = $1
            GROUP BY kind
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting service requests: {}", e);
            AppError::Database(format!("Failed to count service requests: {}", e))
        })?;

        let mut counts: HashMap<ServiceKind, ServiceCounts> = ServiceKind::all()
            .into_iter()
            .map(|kind| (kind, ServiceCounts::default()))
            .collect();

        for (kind, total, user_unread, admin_unread) in rows {
            if let Some(kind) = ServiceKind::from_str(&kind) {
                counts.insert(
                    kind,
                    ServiceCounts {
                        total,
                        user_unread,
                        admin_unread,
                    },
                );
            }
        }

        Ok(counts)
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct ServiceRequestRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    status: String,
    details: Json<ServiceDetails>,
    estimate_price: Option<Decimal>,
    quotation_price: Option<Decimal>,
    notes: Option<String>,
    history: Json<Vec<StatusChange>>,
    is_admin_unread: bool,
    is_user_unread: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ServiceRequestRow> for ServiceRequest {
    fn from(row: ServiceRequestRow) -> Self {
        let details = row.details.0;
        Self {
            id: row.id,
            user_id: row.user_id,
            kind: ServiceKind::from_str(&row.kind).unwrap_or_else(|| details.kind()),
            status: ServiceStatus::from_str(&row.status).unwrap_or_default(),
            details,
            estimate_price: row.estimate_price,
            quotation_price: row.quotation_price,
            notes: row.notes,
            history: row.history.0,
            is_admin_unread: row.is_admin_unread,
            is_user_unread: row.is_user_unread,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
