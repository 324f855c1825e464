use serde_json::json;
use axum::{
    extract::{Extension, State},
    http::StatusCode, middleware,
    routing::get, Router
};

use crate::{
    middleware::authenticate,
    response::{AppError, AppSuccess},
    GlobalState
};

pub fn user_routes() -> Router<GlobalState> {
    Router::new()
        .route("/user/limits",
            get(user_limits)
            .route_layer(middleware::from_fn(authenticate))
        )
}

async fn user_limits(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let limits = state.admission.user_limits(&user_id).await?;

    Ok(AppSuccess::new(StatusCode::OK, "User limits fetched successfully", json!(limits)))
}
