//! Payment bridge: credit top-ups through an external payment processor
//!
//! A top-up moves through three steps keyed by the processor's client
//! secret. The intent is created with a pending ledger row, its amount may
//! be changed while unpaid, and it is confirmed only after the processor
//! itself reports `succeeded`.

use crate::constants::CENTS_PER_CREDIT;
use realtor_core::{
    config::BillingConfig,
    models::{CreditRecord, TopupOutcome},
    traits::{CreditRecordRepository, PaymentGateway, PaymentIntent},
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Top-up amount rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopupPolicy {
    pub min_topup: i64,
    pub bonus_threshold: i64,
    pub bonus_credits: i64,
}

impl TopupPolicy {
    /// Credits granted for a paid amount and the note explaining any bonus
    ///
    /// # Examples
    ///
    /// ```
    /// use realtor_services::TopupPolicy;
    ///
    /// let policy = TopupPolicy::default();
    /// assert_eq!(policy.credited_for(500).0, 550);
    /// assert_eq!(policy.credited_for(499), (499, None));
    /// ```
    pub fn credited_for(&self, amount: i64) -> (i64, Option<String>) {
        if amount >= self.bonus_threshold {
            (
                amount + self.bonus_credits,
                Some(format!(
                    "Bonus {} credits for topup over ${}",
                    self.bonus_credits, self.bonus_threshold
                )),
            )
        } else {
            (amount, None)
        }
    }

    fn check_amount(&self, amount: i64) -> AppResult<()> {
        if amount < self.min_topup {
            return Err(AppError::Validation(format!(
                "Invalid amount: minimum top-up is {} credits",
                self.min_topup
            )));
        }
        Ok(())
    }
}

impl From<&BillingConfig> for TopupPolicy {
    fn from(config: &BillingConfig) -> Self {
        Self {
            min_topup: config.min_topup,
            bonus_threshold: config.bonus_threshold,
            bonus_credits: config.bonus_credits,
        }
    }
}

impl Default for TopupPolicy {
    fn default() -> Self {
        Self::from(&BillingConfig::default())
    }
}

/// Where a top-up request left the state machine
#[derive(Debug, Clone)]
pub enum TopupStep {
    /// New intent and pending record
    Created {
        client_secret: String,
        record: CreditRecord,
    },
    /// Pending record and intent re-priced
    Updated {
        client_secret: String,
        record: CreditRecord,
    },
    /// Record settled and balance credited
    Confirmed(TopupOutcome),
}

impl TopupStep {
    pub fn client_secret(&self) -> Option<&str> {
        match self {
            TopupStep::Created { client_secret, .. } | TopupStep::Updated { client_secret, .. } => {
                Some(client_secret.as_str())
            }
            TopupStep::Confirmed(_) => None,
        }
    }
}

/// Top-up flow over a ledger store and a payment processor
pub struct PaymentBridge<R: CreditRecordRepository> {
    records: Arc<R>,
    gateway: Arc<dyn PaymentGateway>,
    policy: TopupPolicy,
}

impl<R: CreditRecordRepository> PaymentBridge<R> {
    /// Create a new payment bridge
    pub fn new(records: Arc<R>, gateway: Arc<dyn PaymentGateway>, policy: TopupPolicy) -> Self {
        Self {
            records,
            gateway,
            policy,
        }
    }

    /// Drive one top-up request
    ///
    /// With `is_paid` the pending top-up matching `client_secret` is
    /// confirmed; otherwise an intent is created or re-priced.
    #[instrument(skip(self, client_secret))]
    pub async fn process(
        &self,
        user_id: Uuid,
        amount: i64,
        client_secret: Option<&str>,
        is_paid: bool,
    ) -> AppResult<TopupStep> {
        self.policy.check_amount(amount)?;

        if is_paid {
            let secret = client_secret
                .filter(|s| !s.is_empty())
                .ok_or_else(|| AppError::MissingField("stripe_client_secret".to_string()))?;
            return self.confirm(user_id, amount, secret).await;
        }

        self.prepare(user_id, amount, client_secret).await
    }

    /// Create or re-price the user's pending top-up
    async fn prepare(
        &self,
        user_id: Uuid,
        amount: i64,
        client_secret: Option<&str>,
    ) -> AppResult<TopupStep> {
        let cents = to_cents(amount)?;

        match self.records.find_pending_topup(user_id).await? {
            Some(record) => {
                let secret = record.stripe_client_secret.clone().ok_or_else(|| {
                    error!("Pending top-up {} has no client secret", record.id);
                    AppError::Internal("pending top-up has no client secret".to_string())
                })?;

                if client_secret.is_some_and(|supplied| supplied != secret) {
                    warn!("User {} sent a stale client secret", user_id);
                    return Err(AppError::Conflict(
                        "Client secret does not match the pending top-up".to_string(),
                    ));
                }

                let intent_id = PaymentIntent::id_from_client_secret(&secret);
                self.gateway.update_intent(intent_id, cents).await?;
                let record = self.records.update_pending_amount(record.id, amount).await?;

                debug!("Re-priced pending top-up {} to {}", record.id, amount);
                Ok(TopupStep::Updated {
                    client_secret: secret,
                    record,
                })
            }
            None => {
                if client_secret.is_some() {
                    return Err(AppError::NotFound(
                        "No pending top-up for this client secret".to_string(),
                    ));
                }

                let intent = self.gateway.create_intent(cents, user_id).await?;
                let secret = intent.client_secret.ok_or_else(|| {
                    error!("Payment intent {} came back without a client secret", intent.id);
                    AppError::PaymentGateway("payment intent has no client secret".to_string())
                })?;
                let record = self
                    .records
                    .create_pending_topup(user_id, amount, &secret)
                    .await?;

                info!(
                    "Created top-up {} of {} credits for user {}",
                    record.id, amount, user_id
                );
                Ok(TopupStep::Created {
                    client_secret: secret,
                    record,
                })
            }
        }
    }

    /// Settle a pending top-up after the processor confirms payment
    async fn confirm(&self, user_id: Uuid, amount: i64, client_secret: &str) -> AppResult<TopupStep> {
        let record = self
            .records
            .find_pending_topup(user_id)
            .await?
            .filter(|r| r.stripe_client_secret.as_deref() == Some(client_secret))
            .ok_or_else(|| {
                warn!("No pending top-up for user {} and the given secret", user_id);
                AppError::NotFound("No pending top-up for this client secret".to_string())
            })?;

        if amount != record.amount {
            warn!(
                "Confirm for record {} sent amount {}, ledger has {}",
                record.id, amount, record.amount
            );
        }

        let intent_id = PaymentIntent::id_from_client_secret(client_secret);
        let intent = self.gateway.retrieve_intent(intent_id).await?;

        if !intent.status.is_succeeded() {
            warn!("Payment intent {} is {:?}", intent.id, intent.status);
            return Err(AppError::PaymentFailed(format!(
                "payment intent {} has not succeeded",
                intent.id
            )));
        }

        if intent.amount != to_cents(record.amount)? {
            error!(
                "Payment intent {} amount {} does not match top-up {} ({} credits)",
                intent.id, intent.amount, record.id, record.amount
            );
            return Err(AppError::PaymentFailed(
                "paid amount does not match the pending top-up".to_string(),
            ));
        }

        let (credited, note) = self.policy.credited_for(record.amount);
        let outcome = self
            .records
            .settle_topup(record.id, credited, note)
            .await?
            .ok_or_else(|| AppError::Conflict("Top-up already confirmed".to_string()))?;

        info!(
            "Top-up {} confirmed: {} credits for user {}, balance {}",
            record.id, credited, user_id, outcome.balance
        );
        Ok(TopupStep::Confirmed(outcome))
    }
}

fn to_cents(amount: i64) -> AppResult<i64> {
    amount
        .checked_mul(CENTS_PER_CREDIT)
        .ok_or_else(|| AppError::InvalidInput(format!("amount {} out of range", amount)))
}
