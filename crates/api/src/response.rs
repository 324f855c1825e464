use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use tapfolio_runtime::CardServiceError;

pub type AppSuccess = GenericResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericResponse {
    pub status: u16,
    pub message: String,
    pub data: serde_json::Value,
}

impl GenericResponse {
    pub fn new(status: StatusCode, message: &str, data: serde_json::Value) -> Self {
        Self {
            status: status.as_u16(),
            message: message.to_string(),
            data,
        }
    }
}

impl IntoResponse for GenericResponse {
    fn into_response(self) -> Response {
        Json::from(self).into_response()
    }
}

// Error envelope around `anyhow::Error` plus a stable machine-readable kind,
// so calling UI code branches on the discriminant instead of the message.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub error: anyhow::Error,
    pub data: serde_json::Value,
}

impl AppError {
    pub fn new(status: StatusCode, err: anyhow::Error) -> Self {
        let kind = match status {
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::FORBIDDEN => "permission_denied",
            StatusCode::NOT_FOUND => "not_found",
            _ => "bad_request",
        };
        Self {
            status,
            kind,
            error: err,
            data: json!({}),
        }
    }
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            "CODE: {}, KIND: {}, MESSAGE: {}",
            self.status.as_u16(),
            self.kind,
            self.error
        );
        let mut data = self.data;
        if let serde_json::Value::Object(ref mut map) = data {
            map.insert("kind".to_string(), json!(self.kind));
        }
        GenericResponse::new(self.status, &self.error.to_string(), data).into_response()
    }
}

// The service taxonomy maps onto status codes here; quota rejections carry
// their payload so the UI can render the upgrade prompt.
impl From<CardServiceError> for AppError {
    fn from(err: CardServiceError) -> Self {
        let kind = err.kind();
        let (status, data) = match &err {
            CardServiceError::QuotaExceeded { plan, limit, used } => (
                StatusCode::FORBIDDEN,
                json!({ "plan": plan, "limit": limit, "used": used }),
            ),
            CardServiceError::SlugGeneration { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({}))
            }
            CardServiceError::NotFound { entity } => {
                (StatusCode::NOT_FOUND, json!({ "entity": entity }))
            }
            CardServiceError::PermissionDenied => (StatusCode::FORBIDDEN, json!({})),
            CardServiceError::TransientStore(_) => (StatusCode::SERVICE_UNAVAILABLE, json!({})),
        };
        Self {
            status,
            kind,
            error: anyhow::Error::new(err),
            data,
        }
    }
}

// This enables using `?` on functions that return `Result<_, anyhow::Error>`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err)
    }
}
