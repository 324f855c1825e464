use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;

use tapfolio_clients::PostgresClient;
use tapfolio_common::ModuleClient;
use tapfolio_runtime::{CardAdmission, CardLifecycle, PostgresCardStore, StatsCounter};

#[derive(Clone)]
pub struct GlobalState {
    pub db: PostgresClient,
    pub store: Arc<PostgresCardStore>,
    pub admission: CardAdmission<PostgresCardStore>,
    pub lifecycle: CardLifecycle<PostgresCardStore>,
    pub stats: StatsCounter<PostgresCardStore>,
}

impl GlobalState {
    pub async fn new() -> Result<Self> {
        let db = PostgresClient::setup_connection().await;
        let pool: PgPool = db.get_client().as_ref().clone();
        let store = Arc::new(PostgresCardStore::new(pool));

        Ok(Self {
            db,
            store: store.clone(),
            admission: CardAdmission::new(store.clone()),
            lifecycle: CardLifecycle::new(store.clone()),
            stats: StatsCounter::new(store),
        })
    }
}
