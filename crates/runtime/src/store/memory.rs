use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::types::Uuid;

use tapfolio_common::get_current_timestamp;

use crate::account::{IdentityHints, PlanTier, UserAccount};
use crate::card::{Card, CardPatch};
use crate::error::CardServiceError;
use crate::plan_limits::PlanLimits;
use crate::stats::{ActivityKind, CardStats};
use crate::store::CardStore;

/// In-memory `CardStore` used as the test double behind the same seam as
/// the Postgres implementation. The single mutex makes every operation
/// linearizable, which is the transactional guarantee the services expect.
#[derive(Default)]
pub struct MemoryCardStore {
    inner: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<String, UserAccount>,
    limits: Option<PlanLimits>,
    cards: HashMap<Uuid, Card>,
    stats: HashMap<Uuid, CardStats>,
}

impl MemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().expect("card store mutex poisoned")
    }
}

#[async_trait]
impl CardStore for MemoryCardStore {
    async fn get_account(&self, user_id: &str) -> Result<Option<UserAccount>, CardServiceError> {
        Ok(self.lock().accounts.get(user_id).cloned())
    }

    async fn ensure_account(
        &self,
        user_id: &str,
        hints: &IdentityHints,
    ) -> Result<UserAccount, CardServiceError> {
        let mut state = self.lock();
        let account = state
            .accounts
            .entry(user_id.to_string())
            .or_insert_with(|| UserAccount::new(user_id, hints));
        Ok(account.clone())
    }

    async fn set_plan(
        &self,
        user_id: &str,
        plan: PlanTier,
    ) -> Result<UserAccount, CardServiceError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let limits = state.limits.get_or_insert_with(PlanLimits::default).clone();
        let account = state
            .accounts
            .get_mut(user_id)
            .ok_or(CardServiceError::not_found("user account"))?;
        account.plan = plan;
        account.card_limit = limits.quota_for(plan);
        account.updated_at = get_current_timestamp();
        Ok(account.clone())
    }

    async fn plan_limits(&self) -> Result<PlanLimits, CardServiceError> {
        Ok(self
            .lock()
            .limits
            .get_or_insert_with(PlanLimits::default)
            .clone())
    }

    async fn update_plan_limits(
        &self,
        free_card_limit: i64,
        pro_card_limit: i64,
    ) -> Result<PlanLimits, CardServiceError> {
        let mut state = self.lock();
        let limits = state.limits.get_or_insert_with(PlanLimits::default);
        limits.free_card_limit = free_card_limit;
        limits.pro_card_limit = pro_card_limit;
        limits.updated_at = get_current_timestamp();
        Ok(limits.clone())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, CardServiceError> {
        Ok(self.lock().cards.values().any(|card| card.slug == slug))
    }

    async fn get_card(&self, card_id: Uuid) -> Result<Option<Card>, CardServiceError> {
        Ok(self.lock().cards.get(&card_id).cloned())
    }

    async fn get_card_by_slug(&self, slug: &str) -> Result<Option<Card>, CardServiceError> {
        Ok(self
            .lock()
            .cards
            .values()
            .find(|card| card.slug == slug)
            .cloned())
    }

    async fn cards_by_owner(&self, owner_id: &str) -> Result<Vec<Card>, CardServiceError> {
        let mut cards: Vec<Card> = self
            .lock()
            .cards
            .values()
            .filter(|card| card.owner_id == owner_id)
            .cloned()
            .collect();
        cards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cards)
    }

    async fn insert_card_and_bump_usage(
        &self,
        card: Card,
        quota: i64,
    ) -> Result<Card, CardServiceError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if state.cards.values().any(|c| c.slug == card.slug) {
            return Err(CardServiceError::TransientStore(anyhow!(
                "unique index violation on cards.slug: {}",
                card.slug
            )));
        }

        let account = state
            .accounts
            .get_mut(&card.owner_id)
            .ok_or(CardServiceError::not_found("user account"))?;

        if account.cards_created >= quota {
            return Err(CardServiceError::QuotaExceeded {
                plan: account.plan,
                limit: quota,
                used: account.cards_created,
            });
        }

        account.cards_created += 1;
        account.card_limit = quota;
        account.updated_at = get_current_timestamp();

        state.cards.insert(card.id, card.clone());
        state.stats.insert(card.id, CardStats::zeroed(card.id));
        Ok(card)
    }

    async fn update_card(
        &self,
        card_id: Uuid,
        owner_id: &str,
        patch: CardPatch,
    ) -> Result<Card, CardServiceError> {
        let mut state = self.lock();
        let card = state
            .cards
            .get_mut(&card_id)
            .ok_or(CardServiceError::not_found("card"))?;
        if card.owner_id != owner_id {
            return Err(CardServiceError::PermissionDenied);
        }

        let mut merged = card.clone().apply(patch);
        merged.updated_at = get_current_timestamp();
        *card = merged.clone();
        Ok(merged)
    }

    async fn set_card_active(
        &self,
        card_id: Uuid,
        owner_id: &str,
        active: bool,
    ) -> Result<Card, CardServiceError> {
        let mut state = self.lock();
        let card = state
            .cards
            .get_mut(&card_id)
            .ok_or(CardServiceError::not_found("card"))?;
        if card.owner_id != owner_id {
            return Err(CardServiceError::PermissionDenied);
        }

        card.active = active;
        card.updated_at = get_current_timestamp();
        Ok(card.clone())
    }

    async fn delete_card_and_release_usage(
        &self,
        card_id: Uuid,
        owner_id: &str,
    ) -> Result<(), CardServiceError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let card = state
            .cards
            .get(&card_id)
            .ok_or(CardServiceError::not_found("card"))?;
        if card.owner_id != owner_id {
            return Err(CardServiceError::PermissionDenied);
        }

        state.cards.remove(&card_id);
        state.stats.remove(&card_id);

        if let Some(account) = state.accounts.get_mut(owner_id) {
            account.cards_created = (account.cards_created - 1).max(0);
            account.updated_at = get_current_timestamp();
        }
        Ok(())
    }

    async fn record_activity(
        &self,
        card_id: Uuid,
        kind: ActivityKind,
    ) -> Result<(), CardServiceError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if !state.cards.contains_key(&card_id) {
            return Err(CardServiceError::not_found("card"));
        }

        let stats = state
            .stats
            .entry(card_id)
            .or_insert_with(|| CardStats::zeroed(card_id));
        stats.bump(kind, get_current_timestamp());
        Ok(())
    }

    async fn get_stats(&self, card_id: Uuid) -> Result<Option<CardStats>, CardServiceError> {
        Ok(self.lock().stats.get(&card_id).cloned())
    }
}
