use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use tapfolio_common::get_current_timestamp;
use tapfolio_database::{updated_at_trigger_sql, SqlxSchema};

use crate::account::PlanTier;
use crate::quota::FALLBACK_CARD_LIMIT;

/// Singleton quota configuration, one row keyed by `name = "default"`.
/// Created with the defaults on first read, administratively mutable.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlanLimits {
    pub name: String,
    pub free_card_limit: i64,
    pub pro_card_limit: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PlanLimits {
    pub const DEFAULT_NAME: &'static str = "default";

    pub fn quota_for(&self, plan: PlanTier) -> i64 {
        match plan {
            PlanTier::Free => self.free_card_limit,
            PlanTier::Pro => self.pro_card_limit,
        }
    }
}

impl Default for PlanLimits {
    fn default() -> Self {
        let now = get_current_timestamp();
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            free_card_limit: FALLBACK_CARD_LIMIT,
            pro_card_limit: 999,
            created_at: now,
            updated_at: now,
        }
    }
}

impl FromRow<'_, PgRow> for PlanLimits {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            name: row.try_get("name")?,
            free_card_limit: row.try_get("free_card_limit")?,
            pro_card_limit: row.try_get("pro_card_limit")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl SqlxSchema for PlanLimits {
    const TABLE_NAME: &'static str = "plan_limits";
    const ID_COLUMN_NAME: &'static str = "name";
    const INDEXES_SQL: &'static [&'static str] = &[];

    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS plan_limits (
            name TEXT PRIMARY KEY,
            free_card_limit BIGINT NOT NULL DEFAULT 2,
            pro_card_limit BIGINT NOT NULL DEFAULT 999,
            created_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now())),
            updated_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now()))
        );"
        .to_string()
    }

    fn drop_table_sql() -> String {
        "DROP TABLE IF EXISTS plan_limits CASCADE;".to_string()
    }

    fn trigger_sql() -> String {
        updated_at_trigger_sql(Self::TABLE_NAME)
    }
}
