//! Business logic services for the realtor service
//!
//! Services are generic over the repository traits in `realtor_core::traits`
//! and own `Arc`s to their dependencies, so handlers can build them per
//! request from a pool and tests can run them against an in-memory store.
//!
//! # Services
//!
//! - `CouponEngine` - redemption, welcome grants and admin CRUD
//! - `CreditLedger` - service charges and balance queries
//! - `PaymentBridge` - top-up state machine over a `PaymentGateway`
//! - `StripeGateway` - payment intents over the Stripe REST API
//! - `ResendMailer` / `LogMailer` - transactional notifications

pub mod coupons;
pub mod ledger;
pub mod mailer;
pub mod payment;
pub mod stripe;

#[cfg(test)]
mod testing;

pub use coupons::{CouponEngine, Redemption, WelcomeGrant};
pub use ledger::CreditLedger;
pub use mailer::{mailer_from_config, spawn_send, LogMailer, ResendMailer};
pub use payment::{PaymentBridge, TopupPolicy, TopupStep};
pub use stripe::StripeGateway;

/// Business logic constants
pub mod constants {
    /// Payment processor amounts are in cents; one credit is one currency unit
    pub const CENTS_PER_CREDIT: i64 = 100;

    /// Metadata tag put on top-up payment intents
    pub const TOPUP_INTENT_TYPE: &str = "credit_topup";

    /// Rows returned by a ledger history query when no limit is given
    pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

    /// Upper bound for one ledger history page
    pub const MAX_HISTORY_LIMIT: i64 = 500;
}
