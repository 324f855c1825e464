use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::types::Uuid;
use sqlx::{FromRow, Row};
use strum_macros::{Display, EnumString};

use tapfolio_database::SqlxSchema;

use crate::error::CardServiceError;
use crate::store::CardStore;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    View,
    Download,
    Share,
}

/// Per-card activity counters, 1:1 with the card, zero-initialized inside
/// the admission transaction.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CardStats {
    pub card_id: Uuid,
    pub views: i64,
    pub downloads: i64,
    pub shares: i64,
    pub last_viewed: Option<i64>,
}

impl CardStats {
    pub fn zeroed(card_id: Uuid) -> Self {
        Self {
            card_id,
            views: 0,
            downloads: 0,
            shares: 0,
            last_viewed: None,
        }
    }

    pub fn bump(&mut self, kind: ActivityKind, now: i64) {
        match kind {
            ActivityKind::View => {
                self.views += 1;
                self.last_viewed = Some(now);
            }
            ActivityKind::Download => self.downloads += 1,
            ActivityKind::Share => self.shares += 1,
        }
    }
}

impl FromRow<'_, PgRow> for CardStats {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            card_id: row.try_get("card_id")?,
            views: row.try_get("views")?,
            downloads: row.try_get("downloads")?,
            shares: row.try_get("shares")?,
            last_viewed: row.try_get("last_viewed")?,
        })
    }
}

impl SqlxSchema for CardStats {
    const TABLE_NAME: &'static str = "card_stats";
    const ID_COLUMN_NAME: &'static str = "card_id";
    const INDEXES_SQL: &'static [&'static str] = &[];

    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS card_stats (
            card_id UUID PRIMARY KEY REFERENCES cards(id) ON DELETE CASCADE,
            views BIGINT NOT NULL DEFAULT 0,
            downloads BIGINT NOT NULL DEFAULT 0,
            shares BIGINT NOT NULL DEFAULT 0,
            last_viewed BIGINT
        );"
        .to_string()
    }

    fn drop_table_sql() -> String {
        "DROP TABLE IF EXISTS card_stats CASCADE;".to_string()
    }

    fn trigger_sql() -> String {
        String::new()
    }
}

/// Increment-only counters keyed by card. Deliberately outside the
/// admission transaction: concurrent recordings interleave freely and an
/// occasional lost increment under failure is acceptable.
pub struct StatsCounter<S> {
    store: Arc<S>,
}

impl<S> Clone for StatsCounter<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: CardStore> StatsCounter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn record_activity(
        &self,
        card_id: Uuid,
        kind: ActivityKind,
    ) -> Result<(), CardServiceError> {
        self.store.record_activity(card_id, kind).await
    }

    /// A card without a stats row reads as all-zero.
    pub async fn get_stats(&self, card_id: Uuid) -> Result<CardStats, CardServiceError> {
        Ok(self
            .store
            .get_stats(card_id)
            .await?
            .unwrap_or_else(|| CardStats::zeroed(card_id)))
    }
}
