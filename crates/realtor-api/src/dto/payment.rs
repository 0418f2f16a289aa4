//! Top-up DTOs

use realtor_services::TopupStep;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Top-up request
///
/// Without `is_paid` this creates or re-prices a payment intent; with it,
/// the pending top-up behind `stripe_client_secret` is confirmed.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentRequest {
    /// Top-up amount in dollars, one credit per dollar
    #[validate(range(min = 1, message = "Invalid amount"))]
    pub amount: i64,

    /// Client secret of the intent returned by an earlier call
    #[serde(default, alias = "stripeClientSecret")]
    pub stripe_client_secret: Option<String>,

    /// Set once the processor reports the card payment complete
    #[serde(default, alias = "isPaid")]
    pub is_paid: bool,
}

impl PaymentRequest {
    /// Supplied client secret, ignoring blanks
    pub fn client_secret(&self) -> Option<&str> {
        self.stripe_client_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Top-up response
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PaymentResponse {
    /// Intent ready for the card form
    Pending { client_secret: String },

    /// Credits added
    Confirmed {
        msg: String,
        credited: i64,
        credits: i64,
    },
}

impl From<TopupStep> for PaymentResponse {
    fn from(step: TopupStep) -> Self {
        match step {
            TopupStep::Created { client_secret, .. } | TopupStep::Updated { client_secret, .. } => {
                PaymentResponse::Pending { client_secret }
            }
            TopupStep::Confirmed(outcome) => PaymentResponse::Confirmed {
                msg: "Credits updated".to_string(),
                credited: outcome.credited,
                credits: outcome.balance,
            },
        }
    }
}
