use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::types::Uuid;

use tapfolio_runtime::{
    ActivityKind, Card, CardAdmission, CardPatch, CardProfile, CardServiceError, CardStats,
    CardStore, IdentityHints, MemoryCardStore, PlanLimits, PlanTier, UserAccount,
};

/// Store double whose slug namespace is completely saturated: every probe
/// reports a collision, so allocation can never succeed.
struct SaturatedSlugStore {
    inner: MemoryCardStore,
}

#[async_trait]
impl CardStore for SaturatedSlugStore {
    async fn get_account(&self, user_id: &str) -> Result<Option<UserAccount>, CardServiceError> {
        self.inner.get_account(user_id).await
    }

    async fn ensure_account(
        &self,
        user_id: &str,
        hints: &IdentityHints,
    ) -> Result<UserAccount, CardServiceError> {
        self.inner.ensure_account(user_id, hints).await
    }

    async fn set_plan(
        &self,
        user_id: &str,
        plan: PlanTier,
    ) -> Result<UserAccount, CardServiceError> {
        self.inner.set_plan(user_id, plan).await
    }

    async fn plan_limits(&self) -> Result<PlanLimits, CardServiceError> {
        self.inner.plan_limits().await
    }

    async fn update_plan_limits(
        &self,
        free_card_limit: i64,
        pro_card_limit: i64,
    ) -> Result<PlanLimits, CardServiceError> {
        self.inner
            .update_plan_limits(free_card_limit, pro_card_limit)
            .await
    }

    async fn slug_exists(&self, _slug: &str) -> Result<bool, CardServiceError> {
        Ok(true)
    }

    async fn get_card(&self, card_id: Uuid) -> Result<Option<Card>, CardServiceError> {
        self.inner.get_card(card_id).await
    }

    async fn get_card_by_slug(&self, slug: &str) -> Result<Option<Card>, CardServiceError> {
        self.inner.get_card_by_slug(slug).await
    }

    async fn cards_by_owner(&self, owner_id: &str) -> Result<Vec<Card>, CardServiceError> {
        self.inner.cards_by_owner(owner_id).await
    }

    async fn insert_card_and_bump_usage(
        &self,
        card: Card,
        quota: i64,
    ) -> Result<Card, CardServiceError> {
        self.inner.insert_card_and_bump_usage(card, quota).await
    }

    async fn update_card(
        &self,
        card_id: Uuid,
        owner_id: &str,
        patch: CardPatch,
    ) -> Result<Card, CardServiceError> {
        self.inner.update_card(card_id, owner_id, patch).await
    }

    async fn set_card_active(
        &self,
        card_id: Uuid,
        owner_id: &str,
        active: bool,
    ) -> Result<Card, CardServiceError> {
        self.inner.set_card_active(card_id, owner_id, active).await
    }

    async fn delete_card_and_release_usage(
        &self,
        card_id: Uuid,
        owner_id: &str,
    ) -> Result<(), CardServiceError> {
        self.inner
            .delete_card_and_release_usage(card_id, owner_id)
            .await
    }

    async fn record_activity(
        &self,
        card_id: Uuid,
        kind: ActivityKind,
    ) -> Result<(), CardServiceError> {
        self.inner.record_activity(card_id, kind).await
    }

    async fn get_stats(&self, card_id: Uuid) -> Result<Option<CardStats>, CardServiceError> {
        self.inner.get_stats(card_id).await
    }
}

#[tokio::test]
async fn exhausted_disambiguation_fails_without_side_effects() -> Result<()> {
    let store = Arc::new(SaturatedSlugStore {
        inner: MemoryCardStore::new(),
    });
    let admission = CardAdmission::new(store.clone());

    let err = admission
        .create_card(
            "user-1",
            &IdentityHints::default(),
            CardProfile {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                ..CardProfile::default()
            },
        )
        .await
        .unwrap_err();

    match err {
        CardServiceError::SlugGeneration { attempts } => assert_eq!(attempts, 5),
        other => panic!("expected SlugGeneration, got {other:?}"),
    }

    // The failed allocation must not have consumed quota or written a card.
    let account = store.get_account("user-1").await?.expect("account exists");
    assert_eq!(account.cards_created, 0);
    assert!(store.cards_by_owner("user-1").await?.is_empty());

    Ok(())
}
