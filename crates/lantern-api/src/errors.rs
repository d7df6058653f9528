use axum::{Json, http::StatusCode};
use tracing::error;

use lantern_moderation::store::{ConvertError, StoreError};

pub type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn json_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(serde_json::json!({ "error": message })))
}

pub fn internal() -> ApiError {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

pub fn from_store(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "submission not found"),
        StoreError::Invalid(message) => json_error(StatusCode::UNPROCESSABLE_ENTITY, message),
        StoreError::Storage(e) => {
            error!("store failure: {:#}", e);
            internal()
        }
    }
}

/// Conflict-class conversion failures keep their message so a moderator can
/// tell a duplicate or vanished destination apart from a generic failure.
pub fn from_convert(err: ConvertError) -> ApiError {
    match err {
        ConvertError::NotFound => json_error(StatusCode::NOT_FOUND, "submission not found"),
        ConvertError::Invalid(message) => json_error(StatusCode::UNPROCESSABLE_ENTITY, message),
        ConvertError::NotAResource => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "only resource submissions can be converted")
        }
        ConvertError::AlreadyConverted | ConvertError::MissingTarget | ConvertError::DuplicateUrl => {
            json_error(StatusCode::CONFLICT, &err.to_string())
        }
        ConvertError::Storage(e) => {
            error!("convert failure: {:#}", e);
            internal()
        }
    }
}
