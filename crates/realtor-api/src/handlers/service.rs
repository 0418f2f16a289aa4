//! Service request handlers
//!
//! Realtors submit and withdraw requests; admins move them through the
//! status lifecycle. Every route is nested under the service kind.

use crate::dto::service::{CreateServiceRequest, StatusUpdateRequest};
use crate::dto::{ApiResponse, PaginationParams};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use realtor_auth::{AdminUser, AuthenticatedUser, RealtorUser};
use realtor_core::config::MailConfig;
use realtor_core::models::{
    NewServiceRequest, ServiceKind, ServiceRequest, ServiceStatus, StatusChange,
};
use realtor_core::traits::{Mailer, ServiceRequestRepository, UserProfileRepository};
use realtor_core::AppError;
use realtor_db::{PgServiceRequestRepository, PgUserProfileRepository};
use realtor_services::{mailer, spawn_send};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

const WITHDRAWABLE: [ServiceStatus; 2] = [ServiceStatus::Draft, ServiceStatus::Submitted];

/// Load a request of `kind` the caller may see
///
/// Requests owned by someone else read as missing unless the caller is an admin.
async fn visible_request(
    repo: &PgServiceRequestRepository,
    kind: ServiceKind,
    id: Uuid,
    user: &AuthenticatedUser,
) -> Result<ServiceRequest, AppError> {
    repo.find_by_id(id)
        .await?
        .filter(|r| r.kind == kind && (user.is_admin() || r.user_id == user.user_id))
        .ok_or_else(|| AppError::NotFound(format!("{} request {} not found", kind, id)))
}

/// List requests of one kind
///
/// GET /api/services/{kind}
#[instrument(skip(pool, user), fields(user_id = %user.user_id))]
pub async fn list_requests(
    pool: web::Data<PgPool>,
    path: web::Path<ServiceKind>,
    query: web::Query<PaginationParams>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let kind = path.into_inner();
    let owner = if user.is_admin() {
        None
    } else {
        Some(user.user_id)
    };

    let (requests, total) = PgServiceRequestRepository::new(pool.get_ref().clone())
        .list(kind, owner, query.limit(), query.offset())
        .await?;

    Ok(HttpResponse::Ok().json(query.paginate(requests, total)))
}

/// Submit a request
///
/// POST /api/services/{kind}
#[instrument(skip(pool, mailer_service, mail_config, user, req), fields(user_id = %user.user_id))]
pub async fn create_request(
    pool: web::Data<PgPool>,
    mailer_service: web::Data<Arc<dyn Mailer>>,
    mail_config: web::Data<MailConfig>,
    path: web::Path<ServiceKind>,
    user: RealtorUser,
    req: web::Json<CreateServiceRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Service request validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let kind = path.into_inner();
    let req = req.into_inner();
    if req.details.kind() != kind {
        return Err(AppError::InvalidInput(format!(
            "Details are for {}, not {}",
            req.details.kind(),
            kind
        )));
    }

    let profile = PgUserProfileRepository::new(pool.get_ref().clone())
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(user.user_id.to_string()))?;

    if !profile.can_order_services() {
        warn!("Unapproved realtor tried to submit a {} request", kind);
        return Err(AppError::ApprovalRequired(
            "Your realtor account is awaiting approval".to_string(),
        ));
    }

    let quote = req.details.quote()?;
    let estimate_price = if quote.requires_quote {
        None
    } else {
        Some(quote.total)
    };
    debug!(?estimate_price, "Priced {} request", kind);

    let request = PgServiceRequestRepository::new(pool.get_ref().clone())
        .create(&NewServiceRequest {
            user_id: user.user_id,
            details: req.details,
            estimate_price,
            notes: req.notes.filter(|n| !n.trim().is_empty()),
        })
        .await?;

    spawn_send(
        mailer_service.get_ref().clone(),
        mailer::project_submitted(&profile.email, &mail_config.app_url, kind, request.id),
    );

    Ok(HttpResponse::Created().json(ApiResponse::success(request)))
}

/// Get one request and clear the caller's unread flag
///
/// GET /api/services/{kind}/{id}
#[instrument(skip(pool, user), fields(user_id = %user.user_id))]
pub async fn get_request(
    pool: web::Data<PgPool>,
    path: web::Path<(ServiceKind, Uuid)>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (kind, id) = path.into_inner();
    let repo = PgServiceRequestRepository::new(pool.get_ref().clone());
    let mut request = visible_request(&repo, kind, id, &user).await?;

    if user.is_admin() {
        if request.is_admin_unread {
            repo.mark_read(id, true).await?;
            request.is_admin_unread = false;
        }
    } else if request.is_user_unread {
        repo.mark_read(id, false).await?;
        request.is_user_unread = false;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(request)))
}

/// Move a request forward
///
/// PUT /api/services/{kind}/{id}/status
#[instrument(skip(pool, mailer_service, mail_config, admin, req))]
pub async fn update_status(
    pool: web::Data<PgPool>,
    mailer_service: web::Data<Arc<dyn Mailer>>,
    mail_config: web::Data<MailConfig>,
    path: web::Path<(ServiceKind, Uuid)>,
    admin: AdminUser,
    req: web::Json<StatusUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Status update validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;
    req.check_price()?;

    let (kind, id) = path.into_inner();
    let repo = PgServiceRequestRepository::new(pool.get_ref().clone());
    let request = visible_request(&repo, kind, id, &admin).await?;

    if !request.status.admin_can_move_to(req.status) {
        return Err(AppError::Conflict(format!(
            "Cannot move request from {} to {}",
            request.status, req.status
        )));
    }

    let quotation_price = req.quotation_price.filter(|p| !p.is_zero());
    if req.status == ServiceStatus::Confirmed
        && quotation_price.is_none()
        && request.price().is_none()
    {
        return Err(AppError::MissingField("quotation_price".to_string()));
    }

    let change = StatusChange {
        from: request.status,
        to: req.status,
        note: req.note.clone().filter(|n| !n.trim().is_empty()),
        changed_by: admin.user_id,
        changed_at: Utc::now(),
    };

    let updated = repo
        .transition(id, &change, quotation_price, true)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("Request {} changed status concurrently", id))
        })?;

    info!(
        admin = %admin.email,
        request_id = %id,
        from = %change.from,
        to = %change.to,
        "Request status changed"
    );

    match PgUserProfileRepository::new(pool.get_ref().clone())
        .find_by_id(updated.user_id)
        .await
    {
        Ok(Some(owner)) => spawn_send(
            mailer_service.get_ref().clone(),
            mailer::project_status_changed(
                &owner.email,
                &mail_config.app_url,
                kind,
                id,
                change.from,
                change.to,
            ),
        ),
        Ok(None) => warn!(request_id = %id, "Request owner not found, no notification sent"),
        Err(e) => warn!(request_id = %id, "Owner lookup failed, no notification sent: {}", e),
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

/// Withdraw a request that has not been confirmed
///
/// DELETE /api/services/{kind}/{id}
#[instrument(skip(pool, user), fields(user_id = %user.user_id))]
pub async fn delete_request(
    pool: web::Data<PgPool>,
    path: web::Path<(ServiceKind, Uuid)>,
    user: RealtorUser,
) -> Result<HttpResponse, AppError> {
    let (kind, id) = path.into_inner();
    let repo = PgServiceRequestRepository::new(pool.get_ref().clone());
    let request = visible_request(&repo, kind, id, &user).await?;

    if !request.status.is_withdrawable() {
        return Err(AppError::Conflict(format!(
            "Request is {} and can no longer be withdrawn",
            request.status
        )));
    }

    if !repo.delete_in_status(id, &WITHDRAWABLE).await? {
        return Err(AppError::Conflict(format!(
            "Request {} changed status concurrently",
            id
        )));
    }

    info!(request_id = %id, "Request withdrawn");
    Ok(HttpResponse::NoContent().finish())
}

/// Configure service request routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/services/{kind}")
            .route("", web::get().to(list_requests))
            .route("", web::post().to(create_request))
            .route("/{id}", web::get().to(get_request))
            .route("/{id}", web::delete().to(delete_request))
            .route("/{id}/status", web::put().to(update_status)),
    );
}
