//! Service request DTOs

use realtor_core::models::{ServiceDetails, ServiceStatus};
use realtor_core::AppError;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

/// Submit a service request
///
/// `details` is tagged by `kind` and must match the kind in the path.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateServiceRequest {
    pub details: ServiceDetails,

    #[validate(length(max = 4000))]
    pub notes: Option<String>,
}

/// Admin status move
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StatusUpdateRequest {
    pub status: ServiceStatus,

    /// Price override, in credits
    pub quotation_price: Option<Decimal>,

    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

impl StatusUpdateRequest {
    /// Reject negative quotations
    pub fn check_price(&self) -> Result<(), AppError> {
        match self.quotation_price {
            Some(price) if price.is_sign_negative() => Err(AppError::Validation(
                "quotation_price must not be negative".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
