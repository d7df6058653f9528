use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::error;

use lantern_types::api::CreateSubmissionRequest;
use lantern_types::models::SubmissionType;

use crate::auth::AppState;
use crate::errors::{ApiError, internal, json_error};

/// Anonymous submission intake from the public site. Status is forced to
/// `pending`; the url-iff-resource invariant is the only shape check beyond
/// a required title.
pub async fn create_submission(
    State(state): State<AppState>,
    Json(req): Json<CreateSubmissionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(validation("title is required"));
    }
    let has_url = req.url.as_deref().is_some_and(|u| !u.trim().is_empty());
    if req.kind == SubmissionType::Resource && !has_url {
        return Err(validation("resource submissions require a url"));
    }
    if req.kind != SubmissionType::Resource && req.url.is_some() {
        return Err(validation("only resource submissions carry a url"));
    }

    // Run the blocking insert off the async runtime
    let db = state.clone();
    let submission = tokio::task::spawn_blocking(move || db.db.create_submission(&req))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            internal()
        })?
        .map_err(|e| {
            error!("submission insert failed: {:#}", e);
            internal()
        })?;

    Ok((StatusCode::CREATED, Json(submission)))
}

fn validation(message: &str) -> ApiError {
    json_error(StatusCode::UNPROCESSABLE_ENTITY, message)
}
