//! Credit ledger handlers
//!
//! Service charges, the pending top-up, and ledger history.

use crate::dto::credit::{
    ChargeRequest, CreditsResponse, HistoryQuery, HistoryResponse, PendingTopupResponse,
};
use crate::dto::ApiResponse;
use actix_web::{web, HttpResponse};
use realtor_auth::{AuthenticatedUser, RealtorUser};
use realtor_core::models::{ServiceKind, ServiceRequest, ServiceStatus};
use realtor_core::traits::ServiceRequestRepository;
use realtor_core::AppError;
use realtor_db::{PgCouponRepository, PgCreditRecordRepository, PgServiceRequestRepository};
use realtor_services::CreditLedger;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

fn ledger(pool: &PgPool) -> CreditLedger<PgCreditRecordRepository, PgCouponRepository> {
    CreditLedger::new(
        Arc::new(PgCreditRecordRepository::new(pool.clone())),
        Arc::new(PgCouponRepository::new(pool.clone())),
    )
}

/// Service request a charge pays for, checked against the caller and amount
///
/// The confirmed status is checked again when the charge settles.
async fn payable_request(
    repo: &PgServiceRequestRepository,
    kind: ServiceKind,
    tp_id: Option<Uuid>,
    user_id: Uuid,
    amount: i64,
) -> Result<ServiceRequest, AppError> {
    let id = tp_id.ok_or_else(|| AppError::MissingField("tp_id".to_string()))?;

    let request = repo
        .find_by_id(id)
        .await?
        .filter(|r| r.user_id == user_id && r.kind == kind)
        .ok_or_else(|| AppError::NotFound(format!("{} request {} not found", kind, id)))?;

    if request.status != ServiceStatus::Confirmed {
        return Err(AppError::Conflict(format!(
            "Request {} is {}, only confirmed requests can be paid",
            id, request.status
        )));
    }

    let payable = request.payable_credits()?;
    if payable != amount {
        warn!(
            request_id = %id,
            payable, amount, "Charge amount does not match request price"
        );
        return Err(AppError::Validation(format!(
            "Amount must be {} credits for request {}",
            payable, id
        )));
    }

    Ok(request)
}

/// Charge the caller for a service
///
/// POST /api/credit-record
#[instrument(skip(pool, user, req), fields(user_id = %user.user_id))]
pub async fn charge(
    pool: web::Data<PgPool>,
    user: RealtorUser,
    req: web::Json<ChargeRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Charge validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(tp = %req.tp, amount = req.amount, "Processing charge");

    let requests = PgServiceRequestRepository::new(pool.get_ref().clone());
    let kind = ServiceKind::all()
        .into_iter()
        .find(|k| k.credit_type() == req.tp);

    let ledger = ledger(pool.get_ref());
    let outcome = match kind {
        Some(kind) => {
            let request =
                payable_request(&requests, kind, req.tp_id, user.user_id, req.amount).await?;
            let outcome = ledger
                .pay_for_request(user.user_id, req.tp, request.id, req.amount, req.coupon_id)
                .await?;
            info!(request_id = %request.id, "Request marked paid");
            outcome
        }
        None => {
            ledger
                .charge_for_service(user.user_id, req.tp, req.tp_id, req.amount, req.coupon_id)
                .await?
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(CreditsResponse {
        credits: outcome.balance,
    })))
}

/// The caller's pending top-up
///
/// GET /api/credit-record
#[instrument(skip(pool, user), fields(user_id = %user.user_id))]
pub async fn pending_topup(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let pending_topup = ledger(pool.get_ref()).pending_topup(user.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(PendingTopupResponse { pending_topup })))
}

/// Ledger rows, newest first
///
/// GET /api/credit-record/history
#[instrument(skip(pool, user, query), fields(user_id = %user.user_id))]
pub async fn history(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("History query validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let ledger = ledger(pool.get_ref());
    let records = ledger
        .history(user.user_id, query.limit, query.offset)
        .await?;
    let total_credits = ledger.total_credits(user.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(HistoryResponse {
        records,
        total_credits,
    })))
}

/// Configure credit ledger routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/credit-record")
            .route("", web::post().to(charge))
            .route("", web::get().to(pending_topup))
            .route("/history", web::get().to(history)),
    );
}
