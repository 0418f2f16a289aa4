//! Coupon engine
//!
//! Redeeming a coupon grants its credits to a user once; the grant is spent
//! later by a service charge that names the coupon.

use chrono::Utc;
use realtor_core::{
    models::{Coupon, CouponDraft, CouponUsage, UserCoupon},
    traits::{CouponClaim, CouponRepository},
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// A successful redemption
#[derive(Debug, Clone)]
pub struct Redemption {
    pub coupon: Coupon,
    pub usage: CouponUsage,

    /// Credits the coupon takes off a later charge
    pub credits: i64,
}

/// Result of granting the welcome coupons at registration
#[derive(Debug, Clone, Default)]
pub struct WelcomeGrant {
    pub applied: Vec<Coupon>,
    pub total_credits: i64,
}

/// Coupon redemption and administration
pub struct CouponEngine<C: CouponRepository> {
    coupons: Arc<C>,
}

impl<C: CouponRepository> CouponEngine<C> {
    /// Create a new coupon engine
    pub fn new(coupons: Arc<C>) -> Self {
        Self { coupons }
    }

    /// Redeem a coupon code for a user
    ///
    /// Checks run in order: unknown or inactive, expired, limit reached,
    /// already used. The final claim is atomic in the store, so a request
    /// that loses a race still gets one of the same errors.
    #[instrument(skip(self))]
    pub async fn redeem(&self, code: &str, user_id: Uuid) -> AppResult<Redemption> {
        let name = Coupon::normalize_code(code);
        if name.is_empty() {
            return Err(AppError::MissingField("code".to_string()));
        }

        let coupon = self
            .coupons
            .find_by_name(&name)
            .await?
            .filter(|c| c.active)
            .ok_or_else(|| {
                debug!("Coupon {} not found or inactive", name);
                AppError::CouponNotFound(name.clone())
            })?;

        Self::check_redeemable(&coupon)?;

        if self.coupons.find_usage(coupon.id, user_id).await?.is_some() {
            warn!("User {} already redeemed coupon {}", user_id, name);
            return Err(AppError::CouponAlreadyUsed(name));
        }

        match self.coupons.claim(coupon.id, user_id).await? {
            CouponClaim::Claimed(usage) => {
                info!(
                    "User {} redeemed coupon {} for {} credits",
                    user_id, name, coupon.credits
                );
                Ok(Redemption {
                    credits: coupon.credits,
                    coupon,
                    usage,
                })
            }
            CouponClaim::AlreadyClaimed => Err(AppError::CouponAlreadyUsed(name)),
            CouponClaim::Unavailable => {
                // State changed between the checks and the claim
                let current = self
                    .coupons
                    .find_by_id(coupon.id)
                    .await?
                    .filter(|c| c.active)
                    .ok_or_else(|| AppError::CouponNotFound(name.clone()))?;
                Self::check_redeemable(&current)?;
                Err(AppError::CouponLimitReached(name))
            }
        }
    }

    fn check_redeemable(coupon: &Coupon) -> AppResult<()> {
        if coupon.is_expired_at(Utc::now()) {
            return Err(AppError::CouponExpired(coupon.name.clone()));
        }
        if coupon.is_exhausted() {
            return Err(AppError::CouponLimitReached(coupon.name.clone()));
        }
        Ok(())
    }

    /// Grant every active, unexpired coupon to a newly registered user
    ///
    /// Best effort: a coupon that cannot be claimed is logged and skipped.
    #[instrument(skip(self))]
    pub async fn auto_apply_welcome(&self, user_id: Uuid) -> AppResult<WelcomeGrant> {
        let mut grant = WelcomeGrant::default();

        for coupon in self.coupons.list_active().await? {
            if coupon.is_exhausted() {
                debug!("Skipping exhausted coupon {}", coupon.name);
                continue;
            }

            match self.coupons.claim(coupon.id, user_id).await {
                Ok(CouponClaim::Claimed(_)) => {
                    grant.total_credits += coupon.credits;
                    grant.applied.push(coupon);
                }
                Ok(other) => {
                    warn!(
                        coupon = %coupon.name,
                        outcome = ?other,
                        "Welcome coupon not granted"
                    );
                }
                Err(e) => {
                    warn!(coupon = %coupon.name, error = %e, "Failed to grant welcome coupon");
                }
            }
        }

        if !grant.applied.is_empty() {
            info!(
                "Granted {} welcome coupons ({} credits) to user {}",
                grant.applied.len(),
                grant.total_credits,
                user_id
            );
        }

        Ok(grant)
    }

    /// Coupons granted to a user, with their usage state
    pub async fn user_coupons(&self, user_id: Uuid) -> AppResult<Vec<UserCoupon>> {
        self.coupons.list_for_user(user_id).await
    }

    // ---- admin ----

    /// List coupons with the total count
    pub async fn list(&self, limit: i64, offset: i64) -> AppResult<(Vec<Coupon>, i64)> {
        let coupons = self.coupons.find_all(limit, offset).await?;
        let total = self.coupons.count().await?;
        Ok((coupons, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Coupon> {
        self.coupons
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CouponNotFound(id.to_string()))
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: CouponDraft) -> AppResult<Coupon> {
        let coupon = Self::apply_draft(Coupon::default(), draft)?;
        self.coupons.create(&coupon).await
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn update(&self, id: Uuid, draft: CouponDraft) -> AppResult<Coupon> {
        let existing = self.get(id).await?;
        let coupon = Self::apply_draft(existing, draft)?;
        self.coupons.update(&coupon).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if self.coupons.delete(id).await? {
            info!("Deleted coupon {}", id);
            Ok(())
        } else {
            Err(AppError::CouponNotFound(id.to_string()))
        }
    }

    fn apply_draft(mut coupon: Coupon, draft: CouponDraft) -> AppResult<Coupon> {
        let name = Coupon::normalize_code(&draft.name);
        if name.is_empty() {
            return Err(AppError::MissingField("name".to_string()));
        }
        if draft.credits <= 0 {
            return Err(AppError::Validation(
                "Coupon credits must be positive".to_string(),
            ));
        }
        if draft.usage_limit.is_some_and(|limit| limit < 0) {
            return Err(AppError::Validation(
                "Usage limit cannot be negative".to_string(),
            ));
        }

        coupon.name = name;
        coupon.credits = draft.credits;
        coupon.tp = draft.tp;
        coupon.active = draft.active;
        coupon.description = draft.description.filter(|d| !d.trim().is_empty());
        coupon.usage_limit = draft.usage_limit;
        coupon.expires_at = draft.expires_at;
        Ok(coupon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use chrono::Duration;
    use realtor_core::models::CouponScope;

    fn engine(store: &Arc<MemoryStore>) -> CouponEngine<MemoryStore> {
        CouponEngine::new(store.clone())
    }

    #[tokio::test]
    async fn test_redeem_is_case_insensitive() {
        let store = Arc::new(MemoryStore::new());
        let coupon = store.add_coupon("WELCOME100", 100, None);
        let user = store.add_user(0);

        let redemption = engine(&store).redeem("  welcome100 ", user).await.unwrap();
        assert_eq!(redemption.coupon.id, coupon);
        assert_eq!(redemption.credits, 100);
        assert!(redemption.usage.redeemed_at.is_none());
    }

    #[tokio::test]
    async fn test_second_redeem_fails_and_counts_once() {
        let store = Arc::new(MemoryStore::new());
        let coupon = store.add_coupon("SPRING", 50, None);
        let user = store.add_user(0);
        let engine = engine(&store);

        engine.redeem("spring", user).await.unwrap();
        let second = engine.redeem("SPRING", user).await;

        assert!(matches!(second, Err(AppError::CouponAlreadyUsed(_))));
        assert_eq!(store.coupon(coupon).used_count, 1);
    }

    #[tokio::test]
    async fn test_usage_limit_rejects_next_user() {
        let store = Arc::new(MemoryStore::new());
        let coupon = store.add_coupon("LIMITED", 25, Some(2));
        let engine = engine(&store);

        engine.redeem("LIMITED", store.add_user(0)).await.unwrap();
        engine.redeem("LIMITED", store.add_user(0)).await.unwrap();
        let third = engine.redeem("LIMITED", store.add_user(0)).await;

        assert!(matches!(third, Err(AppError::CouponLimitReached(_))));
        assert_eq!(store.coupon(coupon).used_count, 2);
    }

    #[tokio::test]
    async fn test_zero_limit_is_unlimited() {
        let store = Arc::new(MemoryStore::new());
        store.add_coupon("OPEN", 10, Some(0));
        let engine = engine(&store);

        for _ in 0..5 {
            engine.redeem("OPEN", store.add_user(0)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_unknown_inactive_and_expired() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user(0);
        let inactive = store.add_coupon("PAUSED", 10, None);
        store.edit_coupon(inactive, |c| c.active = false);
        let expired = store.add_coupon("OLD", 10, None);
        store.edit_coupon(expired, |c| c.expires_at = Some(Utc::now() - Duration::days(1)));
        let engine = engine(&store);

        assert!(matches!(
            engine.redeem("NOPE", user).await,
            Err(AppError::CouponNotFound(_))
        ));
        assert!(matches!(
            engine.redeem("PAUSED", user).await,
            Err(AppError::CouponNotFound(_))
        ));
        assert!(matches!(
            engine.redeem("OLD", user).await,
            Err(AppError::CouponExpired(_))
        ));
        assert!(matches!(
            engine.redeem("   ", user).await,
            Err(AppError::MissingField(_))
        ));
    }

    #[tokio::test]
    async fn test_welcome_grants_skip_exhausted_and_expired() {
        let store = Arc::new(MemoryStore::new());
        store.add_coupon("WELCOME", 100, None);
        store.add_coupon("LAUNCH", 40, Some(10));
        let full = store.add_coupon("FULL", 500, Some(1));
        store.edit_coupon(full, |c| c.used_count = 1);
        let expired = store.add_coupon("GONE", 70, None);
        store.edit_coupon(expired, |c| c.expires_at = Some(Utc::now() - Duration::hours(1)));

        let user = store.add_user(0);
        let grant = engine(&store).auto_apply_welcome(user).await.unwrap();

        assert_eq!(grant.total_credits, 140);
        assert_eq!(grant.applied.len(), 2);
        assert_eq!(store.coupon(full).used_count, 1);
    }

    #[tokio::test]
    async fn test_welcome_grant_tolerates_existing_usage() {
        let store = Arc::new(MemoryStore::new());
        store.add_coupon("WELCOME", 100, None);
        store.add_coupon("BONUS", 20, None);
        let user = store.add_user(0);
        let engine = engine(&store);

        engine.redeem("WELCOME", user).await.unwrap();
        let grant = engine.auto_apply_welcome(user).await.unwrap();

        assert_eq!(grant.total_credits, 20);
    }

    #[tokio::test]
    async fn test_admin_create_normalizes_name() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);

        let coupon = engine
            .create(CouponDraft {
                name: " summer25 ".to_string(),
                credits: 25,
                tp: CouponScope::Staging,
                active: true,
                description: Some("  ".to_string()),
                usage_limit: None,
                expires_at: None,
            })
            .await
            .unwrap();

        assert_eq!(coupon.name, "SUMMER25");
        assert_eq!(coupon.description, None);
        assert_eq!(engine.get(coupon.id).await.unwrap().tp, CouponScope::Staging);
    }

    #[tokio::test]
    async fn test_admin_rejects_non_positive_credits() {
        let store = Arc::new(MemoryStore::new());
        let result = engine(&store)
            .create(CouponDraft {
                name: "FREE".to_string(),
                credits: 0,
                tp: CouponScope::General,
                active: true,
                description: None,
                usage_limit: None,
                expires_at: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_admin_delete_missing() {
        let store = Arc::new(MemoryStore::new());
        let result = engine(&store).delete(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::CouponNotFound(_))));
    }
}
