use anyhow::Result;
use axum::Router;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use tapfolio_common::{EnvVars, ModuleClient};
use tapfolio_runtime::{CardStore, IdentityHints};
use tapfolio_service_api::{
    admin_routes, card_routes, public_routes, setup_tracing, user_routes, ApiServerEnv,
    GlobalState,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    let cors = CorsLayer::very_permissive();
    let trace = TraceLayer::new_for_http();

    let state = GlobalState::new().await?;
    let env = ApiServerEnv::load();

    // First deploy has no admin yet; promote the configured account so the
    // plan-limits endpoints are reachable.
    let bootstrap_admin = env.get_env_var("ADMIN_BOOTSTRAP_USER");
    if !bootstrap_admin.is_empty() {
        state
            .store
            .ensure_account(&bootstrap_admin, &IdentityHints::default())
            .await?;
        sqlx::query("UPDATE user_accounts SET role = 'admin' WHERE user_id = $1")
            .bind(&bootstrap_admin)
            .execute(state.db.get_client().as_ref())
            .await?;
        tracing::info!("granted admin role to {bootstrap_admin}");
    }

    let app = Router::new()
        .merge(public_routes())
        .merge(card_routes())
        .merge(user_routes())
        .merge(admin_routes())
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(30)))
        .layer(cors)
        .layer(trace)
        .with_state(state);

    let port: u16 = env
        .get_env_var("PORT")
        .parse()
        .expect("failed to convert to number");

    let listener = tokio::net::TcpListener::bind(format!(":::{port}"))
        .await
        .unwrap();

    tracing::info!("LISTENING ON {port}");
    axum::serve(listener, app.into_make_service()).await.unwrap();
    Ok(())
}
