//! In-memory store and payment gateway for service tests

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use realtor_core::{
    models::{
        ChargeOutcome, Coupon, CouponUsage, CreditRecord, CreditStatus, CreditType, NewCharge,
        ServiceStatus, TopupOutcome, UserCoupon,
    },
    traits::{
        CouponClaim, CouponRepository, CreditRecordRepository, IntentStatus, PaymentGateway,
        PaymentIntent, Repository,
    },
    AppError, AppResult,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct State {
    balances: HashMap<Uuid, i64>,
    coupons: Vec<Coupon>,
    usages: Vec<CouponUsage>,
    records: Vec<CreditRecord>,
    /// Service request id to (owner, status)
    requests: HashMap<Uuid, (Uuid, ServiceStatus)>,
}

/// Repository double holding everything behind one lock
///
/// Each trait method holds the lock for its whole body, which gives the
/// same all-or-nothing behaviour as the SQL transactions.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, credits: i64) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().balances.insert(id, credits);
        id
    }

    pub fn balance(&self, user_id: Uuid) -> i64 {
        self.state.lock().balances.get(&user_id).copied().unwrap_or(0)
    }

    pub fn add_request(&self, owner: Uuid, status: ServiceStatus) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().requests.insert(id, (owner, status));
        id
    }

    pub fn request_status(&self, id: Uuid) -> Option<ServiceStatus> {
        self.state.lock().requests.get(&id).map(|(_, status)| *status)
    }

    pub fn add_coupon(&self, name: &str, credits: i64, usage_limit: Option<i32>) -> Uuid {
        let coupon = Coupon {
            name: Coupon::normalize_code(name),
            credits,
            usage_limit,
            ..Default::default()
        };
        let id = coupon.id;
        self.state.lock().coupons.push(coupon);
        id
    }

    pub fn edit_coupon(&self, id: Uuid, edit: impl FnOnce(&mut Coupon)) {
        let mut state = self.state.lock();
        if let Some(coupon) = state.coupons.iter_mut().find(|c| c.id == id) {
            edit(coupon);
        }
    }

    pub fn coupon(&self, id: Uuid) -> Coupon {
        self.state
            .lock()
            .coupons
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .expect("coupon exists")
    }

    pub fn usage(&self, coupon_id: Uuid, user_id: Uuid) -> Option<CouponUsage> {
        self.state
            .lock()
            .usages
            .iter()
            .find(|u| u.coupon_id == coupon_id && u.user_id == user_id)
            .cloned()
    }

    fn new_record(user_id: Uuid, amount: i64, tp: CreditType, status: CreditStatus) -> CreditRecord {
        let now = Utc::now();
        CreditRecord {
            id: Uuid::new_v4(),
            user_id,
            amount,
            tp,
            tp_id: None,
            status,
            stripe_client_secret: None,
            coupon_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl Repository<Coupon, Uuid> for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Coupon>> {
        Ok(self.state.lock().coupons.iter().find(|c| c.id == id).cloned())
    }

    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Coupon>> {
        Ok(self
            .state
            .lock()
            .coupons
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.state.lock().coupons.len() as i64)
    }

    async fn create(&self, entity: &Coupon) -> AppResult<Coupon> {
        let mut state = self.state.lock();
        if state.coupons.iter().any(|c| c.name == entity.name) {
            return Err(AppError::AlreadyExists(entity.name.clone()));
        }
        state.coupons.push(entity.clone());
        Ok(entity.clone())
    }

    async fn update(&self, entity: &Coupon) -> AppResult<Coupon> {
        let mut state = self.state.lock();
        let slot = state
            .coupons
            .iter_mut()
            .find(|c| c.id == entity.id)
            .ok_or_else(|| AppError::CouponNotFound(entity.id.to_string()))?;
        *slot = entity.clone();
        Ok(entity.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock();
        let before = state.coupons.len();
        state.coupons.retain(|c| c.id != id);
        Ok(state.coupons.len() < before)
    }
}

#[async_trait]
impl CouponRepository for MemoryStore {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Coupon>> {
        Ok(self
            .state
            .lock()
            .coupons
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn list_active(&self) -> AppResult<Vec<Coupon>> {
        let now = Utc::now();
        Ok(self
            .state
            .lock()
            .coupons
            .iter()
            .filter(|c| c.active && !c.is_expired_at(now))
            .cloned()
            .collect())
    }

    async fn find_usage(&self, coupon_id: Uuid, user_id: Uuid) -> AppResult<Option<CouponUsage>> {
        Ok(self.usage(coupon_id, user_id))
    }

    async fn claim(&self, coupon_id: Uuid, user_id: Uuid) -> AppResult<CouponClaim> {
        let mut state = self.state.lock();
        if state
            .usages
            .iter()
            .any(|u| u.coupon_id == coupon_id && u.user_id == user_id)
        {
            return Ok(CouponClaim::AlreadyClaimed);
        }

        let now = Utc::now();
        let Some(coupon) = state.coupons.iter_mut().find(|c| c.id == coupon_id) else {
            return Ok(CouponClaim::Unavailable);
        };
        if !coupon.is_redeemable_at(now) {
            return Ok(CouponClaim::Unavailable);
        }
        coupon.used_count += 1;

        let usage = CouponUsage {
            id: Uuid::new_v4(),
            coupon_id,
            user_id,
            redeemed_at: None,
            created_at: now,
        };
        state.usages.push(usage.clone());
        Ok(CouponClaim::Claimed(usage))
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<UserCoupon>> {
        let state = self.state.lock();
        Ok(state
            .usages
            .iter()
            .filter(|u| u.user_id == user_id)
            .filter_map(|u| {
                state
                    .coupons
                    .iter()
                    .find(|c| c.id == u.coupon_id)
                    .map(|c| UserCoupon {
                        coupon: c.clone(),
                        granted_at: u.created_at,
                        redeemed_at: u.redeemed_at,
                    })
            })
            .collect())
    }
}

#[async_trait]
impl CreditRecordRepository for MemoryStore {
    async fn find_pending_topup(&self, user_id: Uuid) -> AppResult<Option<CreditRecord>> {
        Ok(self
            .state
            .lock()
            .records
            .iter()
            .find(|r| r.user_id == user_id && r.is_pending_topup())
            .cloned())
    }

    async fn create_pending_topup(
        &self,
        user_id: Uuid,
        amount: i64,
        client_secret: &str,
    ) -> AppResult<CreditRecord> {
        let mut state = self.state.lock();
        if state
            .records
            .iter()
            .any(|r| r.user_id == user_id && r.is_pending_topup())
        {
            return Err(AppError::Conflict("pending top-up exists".to_string()));
        }
        let mut record = Self::new_record(user_id, amount, CreditType::Topup, CreditStatus::Pending);
        record.stripe_client_secret = Some(client_secret.to_string());
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update_pending_amount(&self, record_id: Uuid, amount: i64) -> AppResult<CreditRecord> {
        let mut state = self.state.lock();
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == record_id && r.is_pending_topup())
            .ok_or_else(|| AppError::NotFound(record_id.to_string()))?;
        record.amount = amount;
        Ok(record.clone())
    }

    async fn settle_topup(
        &self,
        record_id: Uuid,
        credited: i64,
        notes: Option<String>,
    ) -> AppResult<Option<TopupOutcome>> {
        let mut state = self.state.lock();
        let Some(record) = state
            .records
            .iter_mut()
            .find(|r| r.id == record_id && r.is_pending_topup())
        else {
            return Ok(None);
        };
        record.status = CreditStatus::Done;
        record.amount = credited;
        record.notes = notes;
        let record = record.clone();

        let balance = state.balances.entry(record.user_id).or_insert(0);
        *balance += credited;
        Ok(Some(TopupOutcome {
            record,
            credited,
            balance: *balance,
        }))
    }

    async fn settle_charge(&self, charge: &NewCharge) -> AppResult<ChargeOutcome> {
        let mut state = self.state.lock();
        let available = *state
            .balances
            .get(&charge.user_id)
            .ok_or_else(|| AppError::UserNotFound(charge.user_id.to_string()))?;
        let request = match &charge.request_change {
            Some(change) => {
                let id = charge
                    .tp_id
                    .ok_or_else(|| AppError::MissingField("tp_id".to_string()))?;
                match state.requests.get(&id) {
                    Some((owner, status)) if *owner == charge.user_id && *status == change.from => {
                        Some((id, change.to))
                    }
                    _ => {
                        return Err(AppError::Conflict(format!(
                            "request {} is not {}",
                            id, change.from
                        )))
                    }
                }
            }
            None => None,
        };

        if available < charge.total {
            return Err(AppError::InsufficientBalance {
                required: charge.total,
                available,
            });
        }

        if let Some(coupon_id) = charge.coupon_id {
            let usage = state
                .usages
                .iter_mut()
                .find(|u| {
                    u.coupon_id == coupon_id && u.user_id == charge.user_id && u.redeemed_at.is_none()
                })
                .ok_or_else(|| AppError::CouponAlreadyUsed(coupon_id.to_string()))?;
            usage.redeemed_at = Some(Utc::now());
        }

        let mut record =
            Self::new_record(charge.user_id, -charge.total, charge.tp, CreditStatus::Done);
        record.tp_id = charge.tp_id;
        record.coupon_id = charge.coupon_id;
        state.records.push(record.clone());

        if let Some((id, to)) = request {
            state.requests.insert(id, (charge.user_id, to));
        }

        let balance = available - charge.total;
        state.balances.insert(charge.user_id, balance);
        Ok(ChargeOutcome { record, balance })
    }

    async fn sum_done(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .state
            .lock()
            .records
            .iter()
            .filter(|r| r.user_id == user_id && r.is_settled())
            .map(|r| r.amount)
            .sum())
    }

    async fn sum_spent(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(-self
            .state
            .lock()
            .records
            .iter()
            .filter(|r| r.user_id == user_id && r.is_settled() && r.amount < 0)
            .map(|r| r.amount)
            .sum::<i64>())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<CreditRecord>> {
        Ok(self
            .state
            .lock()
            .records
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// Payment processor double
#[derive(Default)]
pub struct MockGateway {
    intents: Mutex<HashMap<String, PaymentIntent>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the processor moving an intent to a new state
    pub fn set_status(&self, client_secret: &str, status: IntentStatus) {
        let id = PaymentIntent::id_from_client_secret(client_secret);
        if let Some(intent) = self.intents.lock().get_mut(id) {
            intent.status = status;
        }
    }

    pub fn intent_count(&self) -> usize {
        self.intents.lock().len()
    }

    pub fn intent(&self, client_secret: &str) -> Option<PaymentIntent> {
        let id = PaymentIntent::id_from_client_secret(client_secret);
        self.intents.lock().get(id).cloned()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(&self, amount_cents: i64, user_id: Uuid) -> AppResult<PaymentIntent> {
        let id = format!("pi_{}", Uuid::new_v4().simple());
        let intent = PaymentIntent {
            client_secret: Some(format!("{}_secret_test", id)),
            id: id.clone(),
            amount: amount_cents,
            currency: "cad".to_string(),
            status: IntentStatus::RequiresPaymentMethod,
            metadata: HashMap::from([("user_id".to_string(), user_id.to_string())]),
        };
        self.intents.lock().insert(id, intent.clone());
        Ok(intent)
    }

    async fn update_intent(&self, intent_id: &str, amount_cents: i64) -> AppResult<PaymentIntent> {
        let mut intents = self.intents.lock();
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| AppError::PaymentGateway(format!("no such intent {}", intent_id)))?;
        intent.amount = amount_cents;
        Ok(intent.clone())
    }

    async fn retrieve_intent(&self, intent_id: &str) -> AppResult<PaymentIntent> {
        self.intents
            .lock()
            .get(intent_id)
            .cloned()
            .ok_or_else(|| AppError::PaymentGateway(format!("no such intent {}", intent_id)))
    }
}
