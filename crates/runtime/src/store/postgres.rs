use async_trait::async_trait;
use sqlx::types::Uuid;
use sqlx::PgPool;

use tapfolio_common::get_current_timestamp;

use crate::account::{IdentityHints, PlanTier, UserAccount};
use crate::card::{Card, CardPatch};
use crate::error::CardServiceError;
use crate::plan_limits::PlanLimits;
use crate::stats::{ActivityKind, CardStats};
use crate::store::CardStore;

/// `CardStore` over a Postgres pool.
///
/// Cross-record consistency rides on `BEGIN`/`COMMIT` plus a
/// `SELECT ... FOR UPDATE` lock on the account row: two admissions for the
/// same user serialize on that lock, and the quota is re-checked against
/// the locked row before anything is written. The unique index on
/// `cards.slug` is the last line of defense for slug races; a violation
/// surfaces as a transient failure and the admission retry re-probes.
#[derive(Clone)]
pub struct PostgresCardStore {
    pool: PgPool,
}

impl PostgresCardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CardStore for PostgresCardStore {
    async fn get_account(&self, user_id: &str) -> Result<Option<UserAccount>, CardServiceError> {
        let account =
            sqlx::query_as::<_, UserAccount>("SELECT * FROM user_accounts WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(account)
    }

    async fn ensure_account(
        &self,
        user_id: &str,
        hints: &IdentityHints,
    ) -> Result<UserAccount, CardServiceError> {
        if let Some(existing) = self.get_account(user_id).await? {
            return Ok(existing);
        }

        // A concurrent caller may win the insert; DO NOTHING and settle for
        // whichever row is there afterwards.
        let fresh = UserAccount::new(user_id, hints);
        sqlx::query(
            "INSERT INTO user_accounts \
             (user_id, display_name, email, photo_url, role, plan, cards_created, card_limit, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(&fresh.user_id)
        .bind(&fresh.display_name)
        .bind(&fresh.email)
        .bind(&fresh.photo_url)
        .bind(fresh.role.to_string())
        .bind(fresh.plan.to_string())
        .bind(fresh.cards_created)
        .bind(fresh.card_limit)
        .bind(fresh.created_at)
        .bind(fresh.updated_at)
        .execute(&self.pool)
        .await?;

        self.get_account(user_id)
            .await?
            .ok_or(CardServiceError::not_found("user account"))
    }

    async fn set_plan(
        &self,
        user_id: &str,
        plan: PlanTier,
    ) -> Result<UserAccount, CardServiceError> {
        let limits = self.plan_limits().await?;
        let account = sqlx::query_as::<_, UserAccount>(
            "UPDATE user_accounts SET plan = $2, card_limit = $3 WHERE user_id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(plan.to_string())
        .bind(limits.quota_for(plan))
        .fetch_optional(&self.pool)
        .await?;
        account.ok_or(CardServiceError::not_found("user account"))
    }

    async fn plan_limits(&self) -> Result<PlanLimits, CardServiceError> {
        let existing =
            sqlx::query_as::<_, PlanLimits>("SELECT * FROM plan_limits WHERE name = $1")
                .bind(PlanLimits::DEFAULT_NAME)
                .fetch_optional(&self.pool)
                .await?;
        if let Some(limits) = existing {
            return Ok(limits);
        }

        let defaults = PlanLimits::default();
        sqlx::query(
            "INSERT INTO plan_limits (name, free_card_limit, pro_card_limit, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(&defaults.name)
        .bind(defaults.free_card_limit)
        .bind(defaults.pro_card_limit)
        .bind(defaults.created_at)
        .bind(defaults.updated_at)
        .execute(&self.pool)
        .await?;

        let limits = sqlx::query_as::<_, PlanLimits>("SELECT * FROM plan_limits WHERE name = $1")
            .bind(PlanLimits::DEFAULT_NAME)
            .fetch_optional(&self.pool)
            .await?;
        limits.ok_or(CardServiceError::not_found("plan limits"))
    }

    async fn update_plan_limits(
        &self,
        free_card_limit: i64,
        pro_card_limit: i64,
    ) -> Result<PlanLimits, CardServiceError> {
        let now = get_current_timestamp();
        let limits = sqlx::query_as::<_, PlanLimits>(
            "INSERT INTO plan_limits (name, free_card_limit, pro_card_limit, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) \
             ON CONFLICT (name) DO UPDATE SET \
                free_card_limit = EXCLUDED.free_card_limit, \
                pro_card_limit = EXCLUDED.pro_card_limit \
             RETURNING *",
        )
        .bind(PlanLimits::DEFAULT_NAME)
        .bind(free_card_limit)
        .bind(pro_card_limit)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(limits)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, CardServiceError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM cards WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn get_card(&self, card_id: Uuid) -> Result<Option<Card>, CardServiceError> {
        let card = sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1")
            .bind(card_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(card)
    }

    async fn get_card_by_slug(&self, slug: &str) -> Result<Option<Card>, CardServiceError> {
        let card = sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(card)
    }

    async fn cards_by_owner(&self, owner_id: &str) -> Result<Vec<Card>, CardServiceError> {
        let cards = sqlx::query_as::<_, Card>(
            "SELECT * FROM cards WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(cards)
    }

    async fn insert_card_and_bump_usage(
        &self,
        card: Card,
        quota: i64,
    ) -> Result<Card, CardServiceError> {
        let mut tx = self.pool.begin().await?;

        // 1. lock the usage row; the quota decision is only valid against
        //    the value this transaction observes.
        let account = sqlx::query_as::<_, UserAccount>(
            "SELECT * FROM user_accounts WHERE user_id = $1 FOR UPDATE",
        )
        .bind(&card.owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CardServiceError::not_found("user account"))?;

        if account.cards_created >= quota {
            tx.rollback().await?;
            return Err(CardServiceError::QuotaExceeded {
                plan: account.plan,
                limit: quota,
                used: account.cards_created,
            });
        }

        // 2. write the card and its zeroed stats row.
        let created = sqlx::query_as::<_, Card>(
            "INSERT INTO cards \
             (id, owner_id, slug, active, first_name, last_name, organization, title, email, \
              phone, website, address, notes, theme, photo_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING *",
        )
        .bind(card.id)
        .bind(&card.owner_id)
        .bind(&card.slug)
        .bind(card.active)
        .bind(&card.first_name)
        .bind(&card.last_name)
        .bind(&card.organization)
        .bind(&card.title)
        .bind(&card.email)
        .bind(&card.phone)
        .bind(&card.website)
        .bind(&card.address)
        .bind(&card.notes)
        .bind(&card.theme)
        .bind(&card.photo_url)
        .bind(card.created_at)
        .bind(card.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO card_stats (card_id, views, downloads, shares, last_viewed) \
             VALUES ($1, 0, 0, 0, NULL)",
        )
        .bind(card.id)
        .execute(&mut *tx)
        .await?;

        // 3. bump usage and refresh the cached limit in the same unit.
        sqlx::query(
            "UPDATE user_accounts SET cards_created = cards_created + 1, card_limit = $2 \
             WHERE user_id = $1",
        )
        .bind(&card.owner_id)
        .bind(quota)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update_card(
        &self,
        card_id: Uuid,
        owner_id: &str,
        patch: CardPatch,
    ) -> Result<Card, CardServiceError> {
        let mut tx = self.pool.begin().await?;

        let existing =
            sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1 FOR UPDATE")
                .bind(card_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CardServiceError::not_found("card"))?;

        if existing.owner_id != owner_id {
            tx.rollback().await?;
            return Err(CardServiceError::PermissionDenied);
        }

        let merged = existing.apply(patch);
        let updated = sqlx::query_as::<_, Card>(
            "UPDATE cards SET \
                first_name = $2, last_name = $3, organization = $4, title = $5, email = $6, \
                phone = $7, website = $8, address = $9, notes = $10, theme = $11, photo_url = $12 \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(card_id)
        .bind(&merged.first_name)
        .bind(&merged.last_name)
        .bind(&merged.organization)
        .bind(&merged.title)
        .bind(&merged.email)
        .bind(&merged.phone)
        .bind(&merged.website)
        .bind(&merged.address)
        .bind(&merged.notes)
        .bind(&merged.theme)
        .bind(&merged.photo_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn set_card_active(
        &self,
        card_id: Uuid,
        owner_id: &str,
        active: bool,
    ) -> Result<Card, CardServiceError> {
        let mut tx = self.pool.begin().await?;

        let existing =
            sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1 FOR UPDATE")
                .bind(card_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CardServiceError::not_found("card"))?;

        if existing.owner_id != owner_id {
            tx.rollback().await?;
            return Err(CardServiceError::PermissionDenied);
        }

        let updated =
            sqlx::query_as::<_, Card>("UPDATE cards SET active = $2 WHERE id = $1 RETURNING *")
                .bind(card_id)
                .bind(active)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_card_and_release_usage(
        &self,
        card_id: Uuid,
        owner_id: &str,
    ) -> Result<(), CardServiceError> {
        let mut tx = self.pool.begin().await?;

        let existing =
            sqlx::query_as::<_, Card>("SELECT * FROM cards WHERE id = $1 FOR UPDATE")
                .bind(card_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CardServiceError::not_found("card"))?;

        if existing.owner_id != owner_id {
            tx.rollback().await?;
            return Err(CardServiceError::PermissionDenied);
        }

        // Stats go with the card through ON DELETE CASCADE.
        sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(card_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE user_accounts SET cards_created = GREATEST(cards_created - 1, 0) \
             WHERE user_id = $1",
        )
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn record_activity(
        &self,
        card_id: Uuid,
        kind: ActivityKind,
    ) -> Result<(), CardServiceError> {
        // Keep counters from resurrecting a deleted card; plain atomic
        // upserts after that, no shared transaction with anything else.
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM cards WHERE id = $1)")
                .bind(card_id)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(CardServiceError::not_found("card"));
        }

        match kind {
            ActivityKind::View => {
                sqlx::query(
                    "INSERT INTO card_stats (card_id, views, downloads, shares, last_viewed) \
                     VALUES ($1, 1, 0, 0, $2) \
                     ON CONFLICT (card_id) DO UPDATE SET \
                        views = card_stats.views + 1, \
                        last_viewed = EXCLUDED.last_viewed",
                )
                .bind(card_id)
                .bind(get_current_timestamp())
                .execute(&self.pool)
                .await?;
            }
            ActivityKind::Download => {
                sqlx::query(
                    "INSERT INTO card_stats (card_id, views, downloads, shares, last_viewed) \
                     VALUES ($1, 0, 1, 0, NULL) \
                     ON CONFLICT (card_id) DO UPDATE SET \
                        downloads = card_stats.downloads + 1",
                )
                .bind(card_id)
                .execute(&self.pool)
                .await?;
            }
            ActivityKind::Share => {
                sqlx::query(
                    "INSERT INTO card_stats (card_id, views, downloads, shares, last_viewed) \
                     VALUES ($1, 0, 0, 1, NULL) \
                     ON CONFLICT (card_id) DO UPDATE SET \
                        shares = card_stats.shares + 1",
                )
                .bind(card_id)
                .execute(&self.pool)
                .await?;
            }
        }

        Ok(())
    }

    async fn get_stats(&self, card_id: Uuid) -> Result<Option<CardStats>, CardServiceError> {
        let stats = sqlx::query_as::<_, CardStats>("SELECT * FROM card_stats WHERE card_id = $1")
            .bind(card_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(stats)
    }
}
