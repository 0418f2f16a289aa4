//! Credit ledger DTOs

use realtor_core::models::{CreditRecord, CreditType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Charge for a service out of the credit balance
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChargeRequest {
    /// Ledger category of the charge
    pub tp: CreditType,

    /// Service request being paid for
    #[serde(default)]
    pub tp_id: Option<Uuid>,

    /// Credits before any coupon discount
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64,

    /// Redeemed coupon to spend on this charge
    #[serde(default)]
    pub coupon_id: Option<Uuid>,
}

/// Balance after an operation
#[derive(Debug, Clone, Serialize)]
pub struct CreditsResponse {
    pub credits: i64,
}

/// The caller's pending top-up
#[derive(Debug, Clone, Serialize)]
pub struct PendingTopupResponse {
    pub pending_topup: Option<CreditRecord>,
}

/// History query parameters
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<i64>,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub offset: i64,
}

/// Ledger rows, newest first, with the running total
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub records: Vec<CreditRecord>,
    pub total_credits: i64,
}
