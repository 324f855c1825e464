use std::sync::Arc;

use sqlx::types::Uuid;

use crate::card::{Card, CardPatch};
use crate::error::CardServiceError;
use crate::store::CardStore;

/// Post-creation card operations. Deletion decrements the owner's usage
/// inside the same store transaction that removes the card, which is what
/// keeps the usage counter equal to the number of live cards.
pub struct CardLifecycle<S> {
    store: Arc<S>,
}

impl<S> Clone for CardLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: CardStore> CardLifecycle<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Ownership-checked profile update. Slug and usage are untouched.
    pub async fn update_card(
        &self,
        card_id: Uuid,
        owner_id: &str,
        patch: CardPatch,
    ) -> Result<Card, CardServiceError> {
        self.store.update_card(card_id, owner_id, patch).await
    }

    /// Publish or unpublish without affecting usage or the slug.
    pub async fn set_active(
        &self,
        card_id: Uuid,
        owner_id: &str,
        active: bool,
    ) -> Result<Card, CardServiceError> {
        self.store.set_card_active(card_id, owner_id, active).await
    }

    pub async fn delete_card(
        &self,
        card_id: Uuid,
        owner_id: &str,
    ) -> Result<(), CardServiceError> {
        self.store
            .delete_card_and_release_usage(card_id, owner_id)
            .await
    }

    pub async fn card(&self, card_id: Uuid, owner_id: &str) -> Result<Card, CardServiceError> {
        let card = self
            .store
            .get_card(card_id)
            .await?
            .ok_or(CardServiceError::not_found("card"))?;
        if card.owner_id != owner_id {
            return Err(CardServiceError::PermissionDenied);
        }
        Ok(card)
    }

    pub async fn cards_of(&self, owner_id: &str) -> Result<Vec<Card>, CardServiceError> {
        self.store.cards_by_owner(owner_id).await
    }

    /// Public lookup for the published card page. Unpublished cards stay
    /// invisible, indistinguishable from absent ones.
    pub async fn resolve_slug(&self, slug: &str) -> Result<Card, CardServiceError> {
        let card = self
            .store
            .get_card_by_slug(slug)
            .await?
            .ok_or(CardServiceError::not_found("card"))?;
        if !card.active {
            return Err(CardServiceError::not_found("card"));
        }
        Ok(card)
    }
}
