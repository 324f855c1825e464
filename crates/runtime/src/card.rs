use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::types::Uuid;
use sqlx::{FromRow, Row};

use tapfolio_common::get_current_timestamp;
use tapfolio_database::{updated_at_trigger_sql, SqlxSchema};

/// Profile fields supplied at creation time. `slug` is a client proposal;
/// the admission service sanitizes and disambiguates it before use.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CardProfile {
    pub first_name: String,
    pub last_name: String,

    pub slug: Option<String>,

    pub organization: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub theme: Option<String>,
    pub photo_url: Option<String>,
}

/// Field-wise update of the profile. Slug and active are deliberately
/// absent: slugs are fixed at creation, publishing goes through set_active.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CardPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    pub organization: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub theme: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Card {
    pub id: Uuid,
    pub owner_id: String,
    pub slug: String,
    pub active: bool,

    pub first_name: String,
    pub last_name: String,
    pub organization: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub theme: Option<String>,
    pub photo_url: Option<String>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Card {
    pub fn new(owner_id: &str, slug: String, profile: CardProfile) -> Self {
        let now = get_current_timestamp();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            slug,
            active: true,

            first_name: profile.first_name,
            last_name: profile.last_name,
            organization: profile.organization,
            title: profile.title,
            email: profile.email,
            phone: profile.phone,
            website: profile.website,
            address: profile.address,
            notes: profile.notes,
            theme: profile.theme,
            photo_url: profile.photo_url,

            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a patch field by field; untouched fields keep their value.
    pub fn apply(mut self, patch: CardPatch) -> Self {
        self.first_name = patch.first_name.unwrap_or(self.first_name);
        self.last_name = patch.last_name.unwrap_or(self.last_name);
        self.organization = patch.organization.or(self.organization);
        self.title = patch.title.or(self.title);
        self.email = patch.email.or(self.email);
        self.phone = patch.phone.or(self.phone);
        self.website = patch.website.or(self.website);
        self.address = patch.address.or(self.address);
        self.notes = patch.notes.or(self.notes);
        self.theme = patch.theme.or(self.theme);
        self.photo_url = patch.photo_url.or(self.photo_url);
        self
    }
}

impl FromRow<'_, PgRow> for Card {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            slug: row.try_get("slug")?,
            active: row.try_get("active")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            organization: row.try_get("organization")?,
            title: row.try_get("title")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            website: row.try_get("website")?,
            address: row.try_get("address")?,
            notes: row.try_get("notes")?,
            theme: row.try_get("theme")?,
            photo_url: row.try_get("photo_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl SqlxSchema for Card {
    const TABLE_NAME: &'static str = "cards";
    const ID_COLUMN_NAME: &'static str = "id";
    const INDEXES_SQL: &'static [&'static str] = &[
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_cards_slug ON cards (slug);",
        "CREATE INDEX IF NOT EXISTS idx_cards_owner ON cards (owner_id);",
    ];

    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS cards (
            id UUID PRIMARY KEY,
            owner_id TEXT NOT NULL REFERENCES user_accounts(user_id),
            slug TEXT NOT NULL,
            active BOOLEAN NOT NULL DEFAULT TRUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            organization TEXT,
            title TEXT,
            email TEXT,
            phone TEXT,
            website TEXT,
            address TEXT,
            notes TEXT,
            theme TEXT,
            photo_url TEXT,
            created_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now())),
            updated_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now()))
        );"
        .to_string()
    }

    fn drop_table_sql() -> String {
        "DROP TABLE IF EXISTS cards CASCADE;".to_string()
    }

    fn trigger_sql() -> String {
        updated_at_trigger_sql(Self::TABLE_NAME)
    }
}
