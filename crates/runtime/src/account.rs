use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use strum_macros::{Display, EnumString};

use tapfolio_common::get_current_timestamp;
use tapfolio_database::{updated_at_trigger_sql, SqlxSchema};

use crate::quota::FALLBACK_CARD_LIMIT;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString, Default)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString, Default)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Admin,
    #[default]
    User,
}

/// Profile hints handed over by the identity provider on first contact.
/// Opaque to this crate, only used to seed a fresh account row.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct IdentityHints {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

/// Per-user usage record. `cards_created` must equal the number of live
/// cards owned by `user_id` after every completed operation; the only
/// writers are the two atomic store operations.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserAccount {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,

    pub role: AccountRole,
    pub plan: PlanTier,

    pub cards_created: i64,
    // Cache of the plan quota at last admission; plan_limits stays authoritative.
    pub card_limit: i64,

    pub created_at: i64,
    pub updated_at: i64,
}

impl UserAccount {
    pub fn new(user_id: &str, hints: &IdentityHints) -> Self {
        let now = get_current_timestamp();
        Self {
            user_id: user_id.to_string(),
            display_name: hints
                .display_name
                .clone()
                .unwrap_or_else(|| user_id.to_string()),
            email: hints.email.clone(),
            photo_url: hints.photo_url.clone(),
            role: AccountRole::default(),
            plan: PlanTier::default(),
            cards_created: 0,
            card_limit: FALLBACK_CARD_LIMIT,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Read model for the limits endpoint.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserLimits {
    pub plan: PlanTier,
    pub cards_created: i64,
    pub card_limit: i64,
    pub cards_remaining: i64,
}

impl FromRow<'_, PgRow> for UserAccount {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            display_name: row.try_get("display_name")?,
            email: row.try_get("email")?,
            photo_url: row.try_get("photo_url")?,
            role: row.try_get::<String, _>("role")?.parse().unwrap_or_default(),
            plan: row.try_get::<String, _>("plan")?.parse().unwrap_or_default(),
            cards_created: row.try_get("cards_created")?,
            card_limit: row.try_get("card_limit")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl SqlxSchema for UserAccount {
    const TABLE_NAME: &'static str = "user_accounts";
    const ID_COLUMN_NAME: &'static str = "user_id";
    const INDEXES_SQL: &'static [&'static str] = &[];

    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS user_accounts (
            user_id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            email TEXT,
            photo_url TEXT,
            role TEXT NOT NULL DEFAULT 'user',
            plan TEXT NOT NULL DEFAULT 'free',
            cards_created BIGINT NOT NULL DEFAULT 0,
            card_limit BIGINT NOT NULL DEFAULT 2,
            created_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now())),
            updated_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now()))
        );"
        .to_string()
    }

    fn drop_table_sql() -> String {
        "DROP TABLE IF EXISTS user_accounts CASCADE;".to_string()
    }

    fn trigger_sql() -> String {
        updated_at_trigger_sql(Self::TABLE_NAME)
    }
}
