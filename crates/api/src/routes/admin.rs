use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::json;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode, middleware,
    routing::post, Json, Router
};

use tapfolio_runtime::{CardStore, PlanTier};

use crate::{
    ensure_admin,
    middleware::authenticate,
    response::{AppError, AppSuccess},
    GlobalState
};

pub fn admin_routes() -> Router<GlobalState> {
    Router::new()
        .route("/admin/limits",
            post(update_limits)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/admin/plan/{user_id}",
            post(set_plan)
            .route_layer(middleware::from_fn(authenticate))
        )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateLimitsRequest {
    pub free_card_limit: i64,
    pub pro_card_limit: i64,
}

async fn update_limits(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<UpdateLimitsRequest>,
) -> Result<AppSuccess, AppError> {
    ensure_admin(&state, &user_id).await?;

    if payload.free_card_limit < 0 || payload.pro_card_limit < 0 {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/admin/limits] limits must be non-negative"),
        ));
    }

    let limits = state
        .store
        .update_plan_limits(payload.free_card_limit, payload.pro_card_limit)
        .await?;

    Ok(AppSuccess::new(StatusCode::OK, "Plan limits updated successfully", json!(limits)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetPlanRequest {
    pub plan: PlanTier,
}

// Plan changes are an administrative action; there is no payment flow.
async fn set_plan(
    State(state): State<GlobalState>,
    Extension(admin_id): Extension<String>,
    Path(user_id): Path<String>,
    Json(payload): Json<SetPlanRequest>,
) -> Result<AppSuccess, AppError> {
    ensure_admin(&state, &admin_id).await?;

    let account = state.store.set_plan(&user_id, payload.plan).await?;

    Ok(AppSuccess::new(StatusCode::OK, "Plan updated successfully", json!({
        "user_id": account.user_id,
        "plan": account.plan,
        "card_limit": account.card_limit,
    })))
}
