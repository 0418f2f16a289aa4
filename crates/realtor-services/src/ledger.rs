//! Credit ledger service
//!
//! Charges debit the balance in the same transaction that writes the ledger
//! row, so `user_profiles.credits` always equals the sum of done rows.

use crate::constants::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
use chrono::Utc;
use realtor_core::{
    models::{ChargeOutcome, CreditRecord, CreditType, NewCharge, ServiceStatus, StatusChange},
    traits::{CouponRepository, CreditRecordRepository},
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Balance-affecting operations other than top-ups
pub struct CreditLedger<R: CreditRecordRepository, C: CouponRepository> {
    records: Arc<R>,
    coupons: Arc<C>,
}

impl<R: CreditRecordRepository, C: CouponRepository> CreditLedger<R, C> {
    /// Create a new credit ledger
    pub fn new(records: Arc<R>, coupons: Arc<C>) -> Self {
        Self { records, coupons }
    }

    /// Charge a user for a service, optionally spending a redeemed coupon
    ///
    /// The coupon's credits come off `amount`; the charge never goes below
    /// zero. Fails with `InsufficientBalance` when the locked balance cannot
    /// cover the rest.
    #[instrument(skip(self))]
    pub async fn charge_for_service(
        &self,
        user_id: Uuid,
        tp: CreditType,
        tp_id: Option<Uuid>,
        amount: i64,
        coupon_id: Option<Uuid>,
    ) -> AppResult<ChargeOutcome> {
        self.settle(user_id, tp, tp_id, amount, coupon_id, false)
            .await
    }

    /// Pay for a confirmed service request and mark it paid
    ///
    /// The request moves `confirmed -> paid` in the charge transaction, so a
    /// request is charged at most once. Fails with `Conflict` when it is no
    /// longer confirmed.
    #[instrument(skip(self))]
    pub async fn pay_for_request(
        &self,
        user_id: Uuid,
        tp: CreditType,
        request_id: Uuid,
        amount: i64,
        coupon_id: Option<Uuid>,
    ) -> AppResult<ChargeOutcome> {
        self.settle(user_id, tp, Some(request_id), amount, coupon_id, true)
            .await
    }

    async fn settle(
        &self,
        user_id: Uuid,
        tp: CreditType,
        tp_id: Option<Uuid>,
        amount: i64,
        coupon_id: Option<Uuid>,
        marks_paid: bool,
    ) -> AppResult<ChargeOutcome> {
        if amount <= 0 {
            return Err(AppError::Validation(
                "Charge amount must be positive".to_string(),
            ));
        }
        if !tp.is_charge() {
            return Err(AppError::InvalidInput(
                "Top-ups go through the payment flow".to_string(),
            ));
        }

        let discount = match coupon_id {
            Some(id) => self.coupon_discount(user_id, id, tp).await?,
            None => 0,
        };
        let total = (amount - discount).max(0);

        debug!(
            "Charging user {}: amount {}, coupon discount {}, total {}",
            user_id, amount, discount, total
        );

        let request_change = marks_paid.then(|| StatusChange {
            from: ServiceStatus::Confirmed,
            to: ServiceStatus::Paid,
            note: Some(format!("Paid {} credits", total)),
            changed_by: user_id,
            changed_at: Utc::now(),
        });

        let outcome = self
            .records
            .settle_charge(&NewCharge {
                user_id,
                tp,
                tp_id,
                total,
                coupon_id,
                request_change,
            })
            .await?;

        info!(
            "User {} charged {} for {} (record {}), balance {}",
            user_id, total, tp, outcome.record.id, outcome.balance
        );

        Ok(outcome)
    }

    /// Credits an unspent coupon usage takes off a charge of `tp`
    async fn coupon_discount(&self, user_id: Uuid, coupon_id: Uuid, tp: CreditType) -> AppResult<i64> {
        let coupon = self
            .coupons
            .find_by_id(coupon_id)
            .await?
            .ok_or_else(|| AppError::CouponNotFound(coupon_id.to_string()))?;

        if !coupon.tp.covers(tp) {
            warn!("Coupon {} ({}) does not cover {}", coupon.name, coupon.tp, tp);
            return Err(AppError::InvalidInput(format!(
                "Coupon {} only applies to {} services",
                coupon.name, coupon.tp
            )));
        }

        let usage = self
            .coupons
            .find_usage(coupon_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("Coupon {} has not been redeemed", coupon.name))
            })?;

        if usage.is_spent() {
            return Err(AppError::CouponAlreadyUsed(coupon.name));
        }

        Ok(coupon.credits)
    }

    /// Sum of the user's done ledger rows
    pub async fn total_credits(&self, user_id: Uuid) -> AppResult<i64> {
        self.records.sum_done(user_id).await
    }

    /// Credits spent on services, as a positive number
    pub async fn spent_credits(&self, user_id: Uuid) -> AppResult<i64> {
        self.records.sum_spent(user_id).await
    }

    /// The user's pending top-up, if any
    pub async fn pending_topup(&self, user_id: Uuid) -> AppResult<Option<CreditRecord>> {
        self.records.find_pending_topup(user_id).await
    }

    /// Ledger rows, newest first
    pub async fn history(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
        offset: i64,
    ) -> AppResult<Vec<CreditRecord>> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        self.records
            .list_by_user(user_id, limit, offset.max(0))
            .await
    }
}
