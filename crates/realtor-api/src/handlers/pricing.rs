//! Price quotes without persisting anything

use crate::dto::ApiResponse;
use actix_web::{web, HttpResponse};
use realtor_core::models::ServiceDetails;
use realtor_core::AppError;
use tracing::{debug, instrument};

/// Quote a service
///
/// POST /api/pricing/quote
#[instrument(skip(details))]
pub async fn quote(details: web::Json<ServiceDetails>) -> Result<HttpResponse, AppError> {
    let quote = details.quote()?;
    debug!(kind = %details.kind(), total = %quote.total, "Quoted");

    Ok(HttpResponse::Ok().json(ApiResponse::success(quote)))
}

/// Configure pricing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/pricing").route("/quote", web::post().to(quote)));
}
