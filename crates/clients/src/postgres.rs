use sqlx::PgPool;

use tapfolio_common::define_module_client;
use tapfolio_database::init_databases;

// Registration order matters: referenced tables before their dependents.
init_databases!(
    default: [
        tapfolio_runtime::UserAccount,
        tapfolio_runtime::PlanLimits,
        tapfolio_runtime::Card,
        tapfolio_runtime::CardStats,
    ]
);

define_module_client! {
    (struct PostgresClient, "postgres")
    client_type: PgPool,
    env: ["DATABASE_URL"],
    setup: async {
        connect(false, true).await.clone()
    }
}
