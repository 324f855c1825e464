use anyhow::anyhow;
use axum::body::Body;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::{extract::Request, response::Response};

use tapfolio_runtime::{AccountRole, CardStore, UserAccount};

use crate::response::AppError;
use crate::utils::extract_bearer_token;
use crate::GlobalState;

/// The bearer token carries the identity provider's opaque subject id.
/// Downstream handlers pick it up as a request extension.
pub async fn authenticate(mut req: Request, next: Next) -> Result<Response<Body>, AppError> {
    let user_id = extract_bearer_token(&req)?;
    if user_id.is_empty() {
        return Err(AppError::new(
            StatusCode::UNAUTHORIZED,
            anyhow!("empty bearer token"),
        ));
    }

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}

/// Gate for administrative handlers; the caller must have an account row
/// carrying the admin role.
pub async fn ensure_admin(state: &GlobalState, user_id: &str) -> Result<UserAccount, AppError> {
    let account = state
        .store
        .get_account(user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::new(StatusCode::FORBIDDEN, anyhow!("[ensure_admin] unknown account"))
        })?;

    if account.role != AccountRole::Admin {
        return Err(AppError::new(
            StatusCode::FORBIDDEN,
            anyhow!("[ensure_admin] admin role required"),
        ));
    }

    Ok(account)
}
