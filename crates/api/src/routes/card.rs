use serde::{Deserialize, Serialize};
use serde_json::json;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode, middleware,
    routing::{get, post}, Json, Router
};
use sqlx::types::Uuid;

use tapfolio_runtime::{CardPatch, CardProfile, IdentityHints};

use crate::{
    middleware::authenticate,
    response::{AppError, AppSuccess},
    GlobalState
};

pub fn card_routes() -> Router<GlobalState> {
    Router::new()
        .route("/card/create",
            post(create_card)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/card/update/{card_id}",
            post(update_card)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/card/active/{card_id}",
            post(set_active)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/card/delete/{card_id}",
            post(delete_card)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/card/mine",
            get(my_cards)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/card/stats/{card_id}",
            get(card_stats)
            .route_layer(middleware::from_fn(authenticate))
        )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCardRequest {
    #[serde(default)]
    pub identity: IdentityHints,
    pub profile: CardProfile,
}

async fn create_card(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<CreateCardRequest>,
) -> Result<AppSuccess, AppError> {
    let admitted = state
        .admission
        .create_card(&user_id, &payload.identity, payload.profile)
        .await?;

    Ok(AppSuccess::new(StatusCode::OK, "Card created successfully", json!(admitted)))
}

async fn update_card(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Path(card_id): Path<Uuid>,
    Json(patch): Json<CardPatch>,
) -> Result<AppSuccess, AppError> {
    let card = state.lifecycle.update_card(card_id, &user_id, patch).await?;

    Ok(AppSuccess::new(StatusCode::OK, "Card updated successfully", json!({
        "card_id": card.id,
        "updated_at": card.updated_at,
    })))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

async fn set_active(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Path(card_id): Path<Uuid>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<AppSuccess, AppError> {
    let card = state
        .lifecycle
        .set_active(card_id, &user_id, payload.active)
        .await?;

    Ok(AppSuccess::new(StatusCode::OK, "Card visibility updated successfully", json!({
        "card_id": card.id,
        "active": card.active,
    })))
}

async fn delete_card(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Path(card_id): Path<Uuid>,
) -> Result<AppSuccess, AppError> {
    state.lifecycle.delete_card(card_id, &user_id).await?;

    Ok(AppSuccess::new(StatusCode::OK, "Card deleted successfully", json!(())))
}

async fn my_cards(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let cards = state.lifecycle.cards_of(&user_id).await?;

    Ok(AppSuccess::new(StatusCode::OK, "Cards fetched successfully", json!({
        "cards": cards,
    })))
}

async fn card_stats(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Path(card_id): Path<Uuid>,
) -> Result<AppSuccess, AppError> {
    // Stats are owner-facing dashboard data.
    state.lifecycle.card(card_id, &user_id).await?;
    let stats = state.stats.get_stats(card_id).await?;

    Ok(AppSuccess::new(StatusCode::OK, "Stats fetched successfully", json!(stats)))
}
