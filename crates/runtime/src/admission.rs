use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use crate::account::{IdentityHints, PlanTier, UserLimits};
use crate::card::{Card, CardProfile};
use crate::error::CardServiceError;
use crate::store::CardStore;
use crate::{quota, slug};

/// Transactional write attempts before the failure surfaces to the caller.
const TXN_ATTEMPTS: u32 = 3;
/// Uniqueness probes before slug allocation gives up.
const SLUG_ATTEMPTS: u32 = 5;

/// Outcome of a successful admission.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdmittedCard {
    pub card_id: Uuid,
    pub slug: String,
}

/// Admission control for card creation: per-user quota enforcement, slug
/// allocation, and the atomic write, with bounded retries around transient
/// store failures.
///
/// The pre-check here only provides the fast, side-effect-free rejection;
/// the store re-validates the quota on the usage row it holds locked, so
/// concurrent creations for the same user serialize and can never commit
/// past the limit.
pub struct CardAdmission<S> {
    store: Arc<S>,
}

impl<S> Clone for CardAdmission<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: CardStore> CardAdmission<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create_card(
        &self,
        user_id: &str,
        hints: &IdentityHints,
        profile: CardProfile,
    ) -> Result<AdmittedCard, CardServiceError> {
        // 1. first contact creates the default usage record.
        self.store.ensure_account(user_id, hints).await?;

        // 2. the plan-limits record is authoritative for every decision.
        let limits = self.store.plan_limits().await?;

        let mut last_transient = None;
        for attempt in 0..TXN_ATTEMPTS {
            // 3. usage is re-read on every attempt; a stale value from a
            //    previous round must not leak into the next decision.
            let account = self
                .store
                .get_account(user_id)
                .await?
                .ok_or(CardServiceError::not_found("user account"))?;

            let quota = limits.quota_for(account.plan);
            if !quota::can_admit(account.plan, &limits, account.cards_created) {
                return Err(CardServiceError::QuotaExceeded {
                    plan: account.plan,
                    limit: quota,
                    used: account.cards_created,
                });
            }

            // 4. slug candidate plus uniqueness probe.
            let slug = self.allocate_slug(&profile).await?;
            let card = Card::new(user_id, slug, profile.clone());

            // 5. the only mutating step; quota is re-checked inside.
            match self.store.insert_card_and_bump_usage(card, quota).await {
                Ok(created) => {
                    return Ok(AdmittedCard {
                        card_id: created.id,
                        slug: created.slug,
                    })
                }
                Err(err) if err.is_transient() => {
                    tracing::warn!(
                        "[CardAdmission::create_card] attempt {} failed: {:?}",
                        attempt + 1,
                        err
                    );
                    last_transient = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_transient.unwrap_or_else(|| {
            CardServiceError::TransientStore(anyhow::anyhow!("admission attempts exhausted"))
        }))
    }

    /// Current usage against the authoritative quota. Unknown users read as
    /// fresh free-tier accounts without anything being provisioned; the
    /// account row itself is only created on the first admission.
    pub async fn user_limits(&self, user_id: &str) -> Result<UserLimits, CardServiceError> {
        let limits = self.store.plan_limits().await?;
        let (plan, cards_created) = match self.store.get_account(user_id).await? {
            Some(account) => (account.plan, account.cards_created),
            None => (PlanTier::default(), 0),
        };

        let card_limit = limits.quota_for(plan);
        Ok(UserLimits {
            plan,
            cards_created,
            card_limit,
            cards_remaining: (card_limit - cards_created).max(0),
        })
    }

    async fn allocate_slug(&self, profile: &CardProfile) -> Result<String, CardServiceError> {
        let base = profile
            .slug
            .as_deref()
            .and_then(slug::normalize)
            .unwrap_or_else(|| slug::generate(&profile.first_name, &profile.last_name));

        let mut candidate = base.clone();
        for _ in 0..SLUG_ATTEMPTS {
            if !self.store.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
            candidate = slug::disambiguate(&base);
        }

        Err(CardServiceError::SlugGeneration {
            attempts: SLUG_ATTEMPTS,
        })
    }
}
