//! Coupon administration handlers

use crate::dto::coupon::CouponRequest;
use crate::dto::{ApiResponse, PaginationParams};
use actix_web::{web, HttpResponse};
use realtor_auth::AdminUser;
use realtor_core::AppError;
use realtor_db::PgCouponRepository;
use realtor_services::CouponEngine;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

fn engine(pool: &PgPool) -> CouponEngine<PgCouponRepository> {
    CouponEngine::new(Arc::new(PgCouponRepository::new(pool.clone())))
}

fn validated(req: web::Json<CouponRequest>) -> Result<CouponRequest, AppError> {
    req.validate().map_err(|e| {
        warn!("Coupon validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;
    Ok(req.into_inner())
}

/// List coupons
///
/// GET /api/coupons
#[instrument(skip(pool, _admin))]
pub async fn list_coupons(
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(page = query.page, per_page = query.per_page, "Listing coupons");

    let (coupons, total) = engine(pool.get_ref())
        .list(query.limit(), query.offset())
        .await?;

    Ok(HttpResponse::Ok().json(query.paginate(coupons, total)))
}

/// Create a coupon
///
/// POST /api/coupons
#[instrument(skip(pool, admin, req))]
pub async fn create_coupon(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    req: web::Json<CouponRequest>,
) -> Result<HttpResponse, AppError> {
    let draft = validated(req)?.into_draft()?;
    let coupon = engine(pool.get_ref()).create(draft).await?;

    info!(admin = %admin.email, coupon = %coupon.name, "Coupon created");
    Ok(HttpResponse::Created().json(ApiResponse::success(coupon)))
}

/// Get one coupon
///
/// GET /api/coupons/{id}
#[instrument(skip(pool, _admin))]
pub async fn get_coupon(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let coupon = engine(pool.get_ref()).get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(coupon)))
}

/// Replace a coupon's fields
///
/// PUT /api/coupons/{id}
#[instrument(skip(pool, admin, req))]
pub async fn update_coupon(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    admin: AdminUser,
    req: web::Json<CouponRequest>,
) -> Result<HttpResponse, AppError> {
    let draft = validated(req)?.into_draft()?;
    let coupon = engine(pool.get_ref())
        .update(path.into_inner(), draft)
        .await?;

    info!(admin = %admin.email, coupon = %coupon.name, "Coupon updated");
    Ok(HttpResponse::Ok().json(ApiResponse::success(coupon)))
}

/// Delete a coupon
///
/// DELETE /api/coupons/{id}
#[instrument(skip(pool, admin))]
pub async fn delete_coupon(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    engine(pool.get_ref()).delete(id).await?;

    info!(admin = %admin.email, coupon_id = %id, "Coupon deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Configure coupon administration routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/coupons")
            .route("", web::get().to(list_coupons))
            .route("", web::post().to(create_coupon))
            .route("/{id}", web::get().to(get_coupon))
            .route("/{id}", web::put().to(update_coupon))
            .route("/{id}", web::delete().to(delete_coupon)),
    );
}
