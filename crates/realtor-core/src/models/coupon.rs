//! Coupon model
//!
//! A coupon grants a fixed number of credits once per user. The grant is
//! recorded as a `CouponUsage`; the credits are spent later by a charge
//! that names the coupon.

use super::credit::CreditType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Service category a coupon may discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CouponScope {
    /// Applies to any service charge
    #[default]
    General,
    Staging,
    Cleaning,
    Video,
    Social,
    Listing,
    Openhouse,
}

impl fmt::Display for CouponScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CouponScope::General => "general",
            CouponScope::Staging => "staging",
            CouponScope::Cleaning => "cleaning",
            CouponScope::Video => "video",
            CouponScope::Social => "social",
            CouponScope::Listing => "listing",
            CouponScope::Openhouse => "openhouse",
        };
        write!(f, "{}", s)
    }
}

impl CouponScope {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "general" => Some(CouponScope::General),
            "staging" => Some(CouponScope::Staging),
            "cleaning" => Some(CouponScope::Cleaning),
            "video" => Some(CouponScope::Video),
            "social" => Some(CouponScope::Social),
            "listing" => Some(CouponScope::Listing),
            "openhouse" => Some(CouponScope::Openhouse),
            _ => None,
        }
    }

    /// Whether a charge of the given category may use this coupon
    pub fn covers(&self, tp: CreditType) -> bool {
        match (self, tp) {
            (_, CreditType::Topup) => false,
            (CouponScope::General, _) => true,
            (CouponScope::Staging, CreditType::Staging)
            | (CouponScope::Cleaning, CreditType::Cleaning)
            | (CouponScope::Video, CreditType::Video)
            | (CouponScope::Social, CreditType::Social)
            | (CouponScope::Listing, CreditType::Listing)
            | (CouponScope::Openhouse, CreditType::Openhouse) => true,
            _ => false,
        }
    }
}

/// Promotional credit grant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Uuid,

    /// Redemption code, stored upper-cased
    pub name: String,

    /// Credits granted
    pub credits: i64,

    pub tp: CouponScope,
    pub active: bool,
    pub description: Option<String>,

    /// Maximum number of distinct users; `None` or `0` means unlimited
    pub usage_limit: Option<i32>,

    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// Canonical form of a user supplied code
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    /// Check whether the coupon expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// Effective usage limit, `None` when unlimited
    pub fn effective_limit(&self) -> Option<i32> {
        self.usage_limit.filter(|limit| *limit > 0)
    }

    /// Check whether every allowed redemption is taken
    pub fn is_exhausted(&self) -> bool {
        self.effective_limit()
            .map(|limit| self.used_count >= limit)
            .unwrap_or(false)
    }

    /// Check whether a new redemption may be attempted at `now`
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_expired_at(now) && !self.is_exhausted()
    }
}

impl Default for Coupon {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            credits: 0,
            tp: CouponScope::General,
            active: true,
            description: None,
            usage_limit: None,
            used_count: 0,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Admin supplied coupon fields
#[derive(Debug, Clone)]
pub struct CouponDraft {
    pub name: String,
    pub credits: i64,
    pub tp: CouponScope,
    pub active: bool,
    pub description: Option<String>,
    pub usage_limit: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Record of a coupon granted to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponUsage {
    pub id: Uuid,
    pub coupon_id: Uuid,
    pub user_id: Uuid,

    /// Set once the credits were spent against a charge
    pub redeemed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl CouponUsage {
    #[inline]
    pub fn is_spent(&self) -> bool {
        self.redeemed_at.is_some()
    }
}

/// Coupon granted to a user together with its usage state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCoupon {
    #[serde(flatten)]
    pub coupon: Coupon,
    pub granted_at: DateTime<Utc>,
    pub redeemed_at: Option<DateTime<Utc>>,
}
