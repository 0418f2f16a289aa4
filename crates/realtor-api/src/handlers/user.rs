//! User handlers
//!
//! Registration, own profile, and coupon redemption.

use crate::dto::user::{
    RedeemCouponRequest, RedeemCouponResponse, RegisterRequest, RegisterResponse,
};
use crate::dto::ApiResponse;
use actix_web::{web, HttpResponse};
use realtor_auth::{AuthenticatedUser, JwtService, PasswordService, RealtorUser};
use realtor_core::traits::UserProfileRepository;
use realtor_core::AppError;
use realtor_db::{PgCouponRepository, PgUserProfileRepository};
use realtor_services::CouponEngine;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

fn coupon_engine(pool: &PgPool) -> CouponEngine<PgCouponRepository> {
    CouponEngine::new(Arc::new(PgCouponRepository::new(pool.clone())))
}

/// Register a new realtor
///
/// POST /api/user
///
/// The account starts unapproved. Welcome coupons are granted on a best
/// effort basis and their total is returned.
#[instrument(skip(pool, jwt_service, password_service, req))]
pub async fn register(
    pool: web::Data<PgPool>,
    jwt_service: web::Data<Arc<JwtService>>,
    password_service: web::Data<Arc<PasswordService>>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Register validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;
    password_service.validate_strength(&req.password)?;

    let req = req.into_inner();
    debug!(email = %req.email, "Processing registration request");

    let repo = PgUserProfileRepository::new(pool.get_ref().clone());
    if repo.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "Registration failed: email already registered");
        return Err(AppError::AlreadyExists(format!(
            "User {} already exists",
            req.email
        )));
    }

    let password_hash = password_service.hash_password(&req.password)?;
    let user = repo.create(&req.into_profile(password_hash)).await?;

    let welcome_credits = match coupon_engine(pool.get_ref())
        .auto_apply_welcome(user.id)
        .await
    {
        Ok(grant) => grant.total_credits,
        Err(e) => {
            warn!(user_id = %user.id, "Welcome coupons not applied: {}", e);
            0
        }
    };

    let access_token = jwt_service.create_token_for_user(&user)?;
    info!(user_id = %user.id, welcome_credits, "Realtor registered");

    let response = RegisterResponse {
        user,
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_service.expiration_secs(),
        welcome_credits,
    };

    Ok(HttpResponse::Created().json(ApiResponse::success(response)))
}

/// Own profile
///
/// GET /api/user
#[instrument(skip(pool, user), fields(user_id = %user.user_id))]
pub async fn me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let repo = PgUserProfileRepository::new(pool.get_ref().clone());
    let profile = repo
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(user.user_id.to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(profile)))
}

/// Coupons granted to the caller
///
/// GET /api/user/coupons
#[instrument(skip(pool, user), fields(user_id = %user.user_id))]
pub async fn list_coupons(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let coupons = coupon_engine(pool.get_ref())
        .user_coupons(user.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(coupons)))
}

/// Redeem a coupon code
///
/// POST /api/user/coupons
#[instrument(skip(pool, user, req), fields(user_id = %user.user_id))]
pub async fn redeem_coupon(
    pool: web::Data<PgPool>,
    user: RealtorUser,
    req: web::Json<RedeemCouponRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Coupon redemption validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let redemption = coupon_engine(pool.get_ref())
        .redeem(&req.code, user.user_id)
        .await?;

    let response = RedeemCouponResponse {
        credits: redemption.credits,
        coupon: redemption.coupon,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        response,
        "Coupon redeemed",
    )))
}

/// Configure user routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .route("", web::post().to(register))
            .route("", web::get().to(me))
            .route("/coupons", web::get().to(list_coupons))
            .route("/coupons", web::post().to(redeem_coupon)),
    );
}
