mod memory;
mod postgres;

pub use memory::MemoryCardStore;
pub use postgres::PostgresCardStore;

use async_trait::async_trait;
use sqlx::types::Uuid;

use crate::account::{IdentityHints, PlanTier, UserAccount};
use crate::card::{Card, CardPatch};
use crate::error::CardServiceError;
use crate::plan_limits::PlanLimits;
use crate::stats::{ActivityKind, CardStats};

/// Persistence seam for the card services.
///
/// The two compound operations are the only writers of `cards_created` and
/// must be atomic: either every effect lands or none does. Implementations
/// must also re-validate the quota against the usage row they hold locked,
/// so two concurrent admissions for the same user can never both commit at
/// `limit - 1`.
#[async_trait]
pub trait CardStore: Send + Sync + 'static {
    async fn get_account(&self, user_id: &str) -> Result<Option<UserAccount>, CardServiceError>;

    /// Creates the default account row when absent. Concurrent callers may
    /// both attempt the insert; losers must settle for the winner's row.
    async fn ensure_account(
        &self,
        user_id: &str,
        hints: &IdentityHints,
    ) -> Result<UserAccount, CardServiceError>;

    async fn set_plan(
        &self,
        user_id: &str,
        plan: PlanTier,
    ) -> Result<UserAccount, CardServiceError>;

    /// Reads the plan-limits record, persisting the defaults when missing.
    async fn plan_limits(&self) -> Result<PlanLimits, CardServiceError>;

    async fn update_plan_limits(
        &self,
        free_card_limit: i64,
        pro_card_limit: i64,
    ) -> Result<PlanLimits, CardServiceError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, CardServiceError>;

    async fn get_card(&self, card_id: Uuid) -> Result<Option<Card>, CardServiceError>;

    async fn get_card_by_slug(&self, slug: &str) -> Result<Option<Card>, CardServiceError>;

    async fn cards_by_owner(&self, owner_id: &str) -> Result<Vec<Card>, CardServiceError>;

    /// Single atomic unit of the admission: re-check the quota on the locked
    /// usage row, write the card and its zeroed stats, bump `cards_created`
    /// and refresh the cached `card_limit`.
    async fn insert_card_and_bump_usage(
        &self,
        card: Card,
        quota: i64,
    ) -> Result<Card, CardServiceError>;

    /// Ownership-checked field update; usage counters untouched.
    async fn update_card(
        &self,
        card_id: Uuid,
        owner_id: &str,
        patch: CardPatch,
    ) -> Result<Card, CardServiceError>;

    async fn set_card_active(
        &self,
        card_id: Uuid,
        owner_id: &str,
        active: bool,
    ) -> Result<Card, CardServiceError>;

    /// Atomic: ownership check, card removal, usage decrement floored at 0.
    async fn delete_card_and_release_usage(
        &self,
        card_id: Uuid,
        owner_id: &str,
    ) -> Result<(), CardServiceError>;

    async fn record_activity(
        &self,
        card_id: Uuid,
        kind: ActivityKind,
    ) -> Result<(), CardServiceError>;

    async fn get_stats(&self, card_id: Uuid) -> Result<Option<CardStats>, CardServiceError>;
}
