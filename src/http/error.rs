//! AdminError -> HTTP response

use crate::error::AdminError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

fn json_error(code: StatusCode, kind: &str, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    let body = serde_json::json!({
        "error": { "code": code.as_u16(), "kind": kind, "message": message }
    });
    (code, Json(body))
}

impl AdminError {
    pub fn status_code(&self) -> (StatusCode, &'static str) {
        match self {
            AdminError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AdminError::InvalidFilter(_) => (StatusCode::BAD_REQUEST, "INVALID_FILTER"),
            AdminError::InvalidPagination(_) => (StatusCode::BAD_REQUEST, "INVALID_PAGINATION"),
            AdminError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AdminError::Storage(_)
            | AdminError::LockPoisoned
            | AdminError::Corrupt(_)
            | AdminError::Migration(_)
            | AdminError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (code, kind) = self.status_code();
        let message = self.to_string();

        if self.is_client_error() {
            log::warn!("⚠️  Rejected request: {}", message);
        } else {
            log::error!("❌ {}", message);
        }

        json_error(code, kind, &message).into_response()
    }
}
