//! Credit ledger model
//!
//! Every balance-affecting event is a `CreditRecord`. Top-ups are positive,
//! service charges negative. Only `done` rows count toward the balance.

use super::service_request::StatusChange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Ledger entry category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditType {
    Topup,
    Staging,
    Cleaning,
    Video,
    Social,
    Listing,
    Openhouse,
    General,
}

impl fmt::Display for CreditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CreditType::Topup => "topup",
            CreditType::Staging => "staging",
            CreditType::Cleaning => "cleaning",
            CreditType::Video => "video",
            CreditType::Social => "social",
            CreditType::Listing => "listing",
            CreditType::Openhouse => "openhouse",
            CreditType::General => "general",
        };
        write!(f, "{}", s)
    }
}

impl CreditType {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "topup" => Some(CreditType::Topup),
            "staging" => Some(CreditType::Staging),
            "cleaning" => Some(CreditType::Cleaning),
            "video" => Some(CreditType::Video),
            "social" => Some(CreditType::Social),
            "listing" => Some(CreditType::Listing),
            "openhouse" => Some(CreditType::Openhouse),
            "general" => Some(CreditType::General),
            _ => None,
        }
    }

    /// Whether rows of this type spend credits
    pub fn is_charge(&self) -> bool {
        !matches!(self, CreditType::Topup)
    }
}

/// Ledger entry settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CreditStatus {
    /// Awaiting payment confirmation (top-ups only)
    #[default]
    Pending,
    /// Settled and reflected in the balance
    Done,
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditStatus::Pending => write!(f, "pending"),
            CreditStatus::Done => write!(f, "done"),
        }
    }
}

impl CreditStatus {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(CreditStatus::Pending),
            "done" => Some(CreditStatus::Done),
            _ => None,
        }
    }
}

/// Ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditRecord {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Signed credit amount
    pub amount: i64,

    pub tp: CreditType,

    /// Service request the entry pays for
    pub tp_id: Option<Uuid>,

    pub status: CreditStatus,

    /// Payment processor client secret (top-ups only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_client_secret: Option<String>,

    /// Coupon applied to a charge
    pub coupon_id: Option<Uuid>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditRecord {
    #[inline]
    pub fn is_pending_topup(&self) -> bool {
        self.tp == CreditType::Topup && self.status == CreditStatus::Pending
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.status == CreditStatus::Done
    }
}

/// A settled charge against the balance, written in one transaction
#[derive(Debug, Clone)]
pub struct NewCharge {
    pub user_id: Uuid,
    pub tp: CreditType,
    pub tp_id: Option<Uuid>,
    /// Credits to deduct, already net of any coupon
    pub total: i64,
    pub coupon_id: Option<Uuid>,

    /// Status move applied to the service request `tp_id` in the same
    /// transaction; the charge fails with `Conflict` when the request is no
    /// longer in `change.from`
    pub request_change: Option<StatusChange>,
}

/// Result of settling a charge
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub record: CreditRecord,
    pub balance: i64,
}

/// Result of settling a top-up
#[derive(Debug, Clone)]
pub struct TopupOutcome {
    pub record: CreditRecord,
    pub credited: i64,
    pub balance: i64,
}
