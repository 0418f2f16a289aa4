//! Top-up handler

use crate::dto::payment::{PaymentRequest, PaymentResponse};
use actix_web::{web, HttpResponse};
use realtor_auth::AuthenticatedUser;
use realtor_core::config::BillingConfig;
use realtor_core::traits::PaymentGateway;
use realtor_core::AppError;
use realtor_db::PgCreditRecordRepository;
use realtor_services::{PaymentBridge, TopupPolicy};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Create, re-price, or confirm a credit top-up
///
/// POST /api/payment
#[instrument(skip(pool, gateway, billing, user, req), fields(user_id = %user.user_id))]
pub async fn topup(
    pool: web::Data<PgPool>,
    gateway: web::Data<Arc<dyn PaymentGateway>>,
    billing: web::Data<BillingConfig>,
    user: AuthenticatedUser,
    req: web::Json<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Payment validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let bridge = PaymentBridge::new(
        Arc::new(PgCreditRecordRepository::new(pool.get_ref().clone())),
        gateway.get_ref().clone(),
        TopupPolicy::from(billing.get_ref()),
    );

    let step = bridge
        .process(user.user_id, req.amount, req.client_secret(), req.is_paid)
        .await?;

    let response = PaymentResponse::from(step);
    if let PaymentResponse::Confirmed { credited, credits, .. } = &response {
        info!(credited, credits, "Top-up confirmed");
    }

    Ok(HttpResponse::Ok().json(response))
}

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/payment", web::post().to(topup));
}
