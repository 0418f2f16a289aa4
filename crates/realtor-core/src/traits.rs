//! Common traits for repositories and external services
//!
//! Defines abstractions for database access, the payment processor and the
//! mail provider. Services depend on these traits only.

use crate::error::AppError;
use crate::models::{
    ChargeOutcome, Coupon, CouponUsage, CreditRecord, NewCharge, NewServiceRequest,
    NewUserProfile, ServiceKind, ServiceRequest, ServiceStatus, StatusChange, TopupOutcome,
    UserCoupon, UserProfile,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Generic repository trait for CRUD operations
#[async_trait]
pub trait Repository<T, ID>: Send + Sync {
    /// Find entity by ID
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, AppError>;

    /// Find all entities with pagination
    async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<T>, AppError>;

    /// Count total entities
    async fn count(&self) -> Result<i64, AppError>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<T, AppError>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> Result<T, AppError>;

    /// Delete entity by ID
    async fn delete(&self, id: ID) -> Result<bool, AppError>;
}

/// User profile repository
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError>;

    /// Insert a new unapproved realtor
    async fn create(&self, profile: &NewUserProfile) -> Result<UserProfile, AppError>;

    /// List profiles, newest first, with the total count
    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<UserProfile>, i64), AppError>;

    /// Set the approval flag
    async fn set_approval(&self, id: Uuid, approved: bool) -> Result<UserProfile, AppError>;
}

/// Outcome of a conditional coupon claim
#[derive(Debug, Clone)]
pub enum CouponClaim {
    /// Usage inserted and `used_count` incremented
    Claimed(CouponUsage),
    /// The user already holds a usage for this coupon
    AlreadyClaimed,
    /// Inactive, expired, or usage limit reached at claim time
    Unavailable,
}

/// Coupon repository
#[async_trait]
pub trait CouponRepository: Repository<Coupon, Uuid> {
    /// Find a coupon by its normalized code
    async fn find_by_name(&self, name: &str) -> Result<Option<Coupon>, AppError>;

    /// Active coupons that have not expired
    async fn list_active(&self) -> Result<Vec<Coupon>, AppError>;

    /// The user's usage of a coupon, if any
    async fn find_usage(
        &self,
        coupon_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CouponUsage>, AppError>;

    /// Atomically record a usage and bump `used_count`
    ///
    /// Either both happen or neither does.
    async fn claim(&self, coupon_id: Uuid, user_id: Uuid) -> Result<CouponClaim, AppError>;

    /// Coupons granted to a user with their usage state
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UserCoupon>, AppError>;
}

/// Credit ledger repository
#[async_trait]
pub trait CreditRecordRepository: Send + Sync {
    /// The user's pending top-up, at most one exists
    async fn find_pending_topup(&self, user_id: Uuid) -> Result<Option<CreditRecord>, AppError>;

    /// Insert a pending top-up carrying the processor client secret
    async fn create_pending_topup(
        &self,
        user_id: Uuid,
        amount: i64,
        client_secret: &str,
    ) -> Result<CreditRecord, AppError>;

    /// Overwrite the amount of a pending top-up
    async fn update_pending_amount(
        &self,
        record_id: Uuid,
        amount: i64,
    ) -> Result<CreditRecord, AppError>;

    /// Mark a pending top-up done and credit the balance in one transaction
    ///
    /// Returns `None` when the record is no longer pending.
    async fn settle_topup(
        &self,
        record_id: Uuid,
        credited: i64,
        notes: Option<String>,
    ) -> Result<Option<TopupOutcome>, AppError>;

    /// Write a done charge, spend the coupon usage and debit the balance in one transaction
    ///
    /// Fails with `InsufficientBalance` when the locked balance is short.
    async fn settle_charge(&self, charge: &NewCharge) -> Result<ChargeOutcome, AppError>;

    /// Sum of the user's done rows
    async fn sum_done(&self, user_id: Uuid) -> Result<i64, AppError>;

    /// Credits spent on services (positive number)
    async fn sum_spent(&self, user_id: Uuid) -> Result<i64, AppError>;

    /// Ledger rows, newest first
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CreditRecord>, AppError>;
}

/// Per-kind counters shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceCounts {
    pub total: i64,
    pub user_unread: i64,
    pub admin_unread: i64,
}

/// Service request repository
#[async_trait]
pub trait ServiceRequestRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ServiceRequest>, AppError>;

    /// List requests of one kind, optionally restricted to an owner
    async fn list(
        &self,
        kind: ServiceKind,
        user_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ServiceRequest>, i64), AppError>;

    /// Insert a submitted request
    async fn create(&self, request: &NewServiceRequest) -> Result<ServiceRequest, AppError>;

    /// Move a request from `change.from` to `change.to`
    ///
    /// Guarded on the current status; returns `None` when it no longer
    /// matches `change.from`.
    async fn transition(
        &self,
        id: Uuid,
        change: &StatusChange,
        quotation_price: Option<Decimal>,
        notify_user: bool,
    ) -> Result<Option<ServiceRequest>, AppError>;

    /// Clear the unread flag of one side
    async fn mark_read(&self, id: Uuid, by_admin: bool) -> Result<(), AppError>;

    /// Delete a request still in one of the given statuses
    async fn delete_in_status(
        &self,
        id: Uuid,
        statuses: &[ServiceStatus],
    ) -> Result<bool, AppError>;

    /// Counters per kind, optionally restricted to an owner
    async fn counts(
        &self,
        user_id: Option<Uuid>,
    ) -> Result<HashMap<ServiceKind, ServiceCounts>, AppError>;
}

/// Payment intent status as reported by the processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

impl IntentStatus {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, IntentStatus::Succeeded)
    }
}

/// Payment intent as seen by the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,

    /// Amount in the smallest currency unit
    pub amount: i64,

    pub currency: String,
    pub status: IntentStatus,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    /// Intent id embedded in a client secret (`pi_123_secret_abc` -> `pi_123`)
    pub fn id_from_client_secret(client_secret: &str) -> &str {
        client_secret
            .split("_secret_")
            .next()
            .unwrap_or(client_secret)
    }
}

/// External payment processor
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an intent for `amount_cents`
    async fn create_intent(
        &self,
        amount_cents: i64,
        user_id: Uuid,
    ) -> Result<PaymentIntent, AppError>;

    /// Change the amount of an unconfirmed intent
    async fn update_intent(
        &self,
        intent_id: &str,
        amount_cents: i64,
    ) -> Result<PaymentIntent, AppError>;

    /// Fetch the intent's current state
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, AppError>;
}

/// Outgoing notification email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Transactional mail provider
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), AppError>;
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta() {
        assert_eq!(PaginationMeta::new(95, 1, 10).total_pages, 10);
        assert_eq!(PaginationMeta::new(100, 1, 10).total_pages, 10);
        assert_eq!(PaginationMeta::new(0, 1, 10).total_pages, 0);
    }

    #[test]
    fn test_intent_id_from_client_secret() {
        assert_eq!(
            PaymentIntent::id_from_client_secret("pi_3Nx9_secret_QwErTy"),
            "pi_3Nx9"
        );
        assert_eq!(PaymentIntent::id_from_client_secret("pi_plain"), "pi_plain");
    }

    #[test]
    fn test_unknown_intent_status() {
        let status: IntentStatus = serde_json::from_str("\"brand_new_state\"").unwrap();
        assert_eq!(status, IntentStatus::Unknown);
        let status: IntentStatus = serde_json::from_str("\"succeeded\"").unwrap();
        assert!(status.is_succeeded());
    }
}
