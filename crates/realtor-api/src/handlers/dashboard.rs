//! Dashboard handlers
//!
//! Per-user summary and the admin view of realtor accounts.

use crate::dto::dashboard::DashboardResponse;
use crate::dto::user::ApprovalRequest;
use crate::dto::{ApiResponse, PaginationParams};
use actix_web::{web, HttpResponse};
use realtor_auth::{AdminUser, AuthenticatedUser};
use realtor_core::config::MailConfig;
use realtor_core::traits::{
    CreditRecordRepository, Mailer, ServiceRequestRepository, UserProfileRepository,
};
use realtor_core::AppError;
use realtor_db::{PgCreditRecordRepository, PgServiceRequestRepository, PgUserProfileRepository};
use realtor_services::{mailer, spawn_send};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Service counters and credit totals
///
/// GET /api/dashboard
///
/// Admins see counters across all realtors.
#[instrument(skip(pool, user), fields(user_id = %user.user_id))]
pub async fn get_dashboard(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    debug!("Fetching dashboard");

    let profile = PgUserProfileRepository::new(pool.get_ref().clone())
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(user.user_id.to_string()))?;

    let owner = if user.is_admin() {
        None
    } else {
        Some(user.user_id)
    };
    let counts = PgServiceRequestRepository::new(pool.get_ref().clone())
        .counts(owner)
        .await?;

    let credits_used = PgCreditRecordRepository::new(pool.get_ref().clone())
        .sum_spent(user.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(DashboardResponse::new(
        counts,
        profile.credits,
        credits_used,
    ))))
}

/// List user profiles
///
/// GET /api/dashboard/users
#[instrument(skip(pool, _admin))]
pub async fn list_users(
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let (users, total) = PgUserProfileRepository::new(pool.get_ref().clone())
        .list(query.limit(), query.offset())
        .await?;

    Ok(HttpResponse::Ok().json(query.paginate(users, total)))
}

/// Approve or revoke a realtor
///
/// PUT /api/dashboard/users
#[instrument(skip(pool, mailer_service, mail_config, admin, req))]
pub async fn set_approval(
    pool: web::Data<PgPool>,
    mailer_service: web::Data<Arc<dyn Mailer>>,
    mail_config: web::Data<MailConfig>,
    admin: AdminUser,
    req: web::Json<ApprovalRequest>,
) -> Result<HttpResponse, AppError> {
    let repo = PgUserProfileRepository::new(pool.get_ref().clone());
    let before = repo
        .find_by_id(req.user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(req.user_id.to_string()))?;

    let updated = repo.set_approval(req.user_id, req.realtor_approved).await?;

    info!(
        admin = %admin.email,
        user_id = %updated.id,
        approved = updated.realtor_approved,
        "Realtor approval changed"
    );

    if updated.realtor_approved && !before.realtor_approved {
        spawn_send(
            mailer_service.get_ref().clone(),
            mailer::realtor_approved(&updated.email, &mail_config.app_url, &updated.full_name()),
        );
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

/// Configure dashboard routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dashboard")
            .route("", web::get().to(get_dashboard))
            .route("/users", web::get().to(list_users))
            .route("/users", web::put().to(set_approval)),
    );
}
