use anyhow::anyhow;
use serde_json::json;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post}, Router
};

use tapfolio_runtime::ActivityKind;

use crate::{
    response::{AppError, AppSuccess},
    GlobalState
};

pub fn public_routes() -> Router<GlobalState> {
    Router::new()
        .route("/health",
            get(|| async { "OK" })
        )

        .route("/p/{slug}",
            get(view_card)
        )

        .route("/p/{slug}/activity/{kind}",
            post(record_activity)
        )
}

async fn view_card(
    State(state): State<GlobalState>,
    Path(slug): Path<String>,
) -> Result<AppSuccess, AppError> {
    let card = state.lifecycle.resolve_slug(&slug).await?;

    Ok(AppSuccess::new(StatusCode::OK, "Card fetched successfully", json!(card)))
}

async fn record_activity(
    State(state): State<GlobalState>,
    Path((slug, kind)): Path<(String, String)>,
) -> Result<AppSuccess, AppError> {
    let kind = kind.parse::<ActivityKind>().map_err(|_| {
        AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[record_activity] unknown activity kind: {kind}"),
        )
    })?;

    let card = state.lifecycle.resolve_slug(&slug).await?;
    state.stats.record_activity(card.id, kind).await?;

    Ok(AppSuccess::new(StatusCode::OK, "Activity recorded successfully", json!(())))
}
