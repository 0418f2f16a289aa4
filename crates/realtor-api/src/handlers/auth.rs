//! Authentication handlers
//!
//! HTTP handlers for authentication endpoints.

use crate::dto::auth::{LoginRequest, LoginResponse};
use crate::dto::ApiResponse;
use actix_web::{web, HttpResponse};
use realtor_auth::{JwtService, PasswordService};
use realtor_core::traits::UserProfileRepository;
use realtor_core::AppError;
use realtor_db::PgUserProfileRepository;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Login endpoint
///
/// POST /api/auth/login
#[instrument(skip(pool, jwt_service, password_service, req))]
pub async fn login(
    pool: web::Data<PgPool>,
    jwt_service: web::Data<Arc<JwtService>>,
    password_service: web::Data<Arc<PasswordService>>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Login validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let email = req.email.trim().to_lowercase();
    debug!(email = %email, "Processing login request");

    let repo = PgUserProfileRepository::new(pool.get_ref().clone());
    let user = repo.find_by_email(&email).await?.ok_or_else(|| {
        info!(email = %email, "Login failed: user not found");
        AppError::InvalidCredentials
    })?;

    password_service
        .verify_login(&req.password, &user.password_hash)
        .map_err(|e| {
            info!(email = %email, "Login failed: {}", e);
            e
        })?;

    let token = jwt_service.create_token_for_user(&user)?;
    let expires_in = jwt_service.expiration_secs();

    info!(user_id = %user.id, role = %user.role, "Login successful");

    let response = LoginResponse::new(token, expires_in, user);
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// Configure authentication routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").route("/login", web::post().to(login)));
}
