use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use lantern_moderation::store::{ListFilter, ListScope, SubmissionStore};
use lantern_types::api::{
    BulkStatusRequest, ConvertRequest, PermanentDeleteRequest, SetDeletedRequest,
    UpdateNotesRequest,
};
use lantern_types::models::{ConversionTarget, ResourceType, SubmissionStatus, SubmissionType};

use crate::auth::AppState;
use crate::errors::{ApiError, from_convert, from_store, internal, json_error};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub kind: SubmissionType,
    pub status: Option<SubmissionStatus>,
    #[serde(default)]
    pub deleted: bool,
    /// Cursor: the `created_at` of the last row of the previous page.
    pub before: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    25
}

impl ListQuery {
    fn into_filter(self) -> Result<ListFilter, ApiError> {
        let scope = match (self.deleted, self.status) {
            (true, None) => ListScope::Trash,
            (true, Some(_)) => {
                return Err(json_error(
                    StatusCode::BAD_REQUEST,
                    "status and deleted are mutually exclusive",
                ));
            }
            (false, status) => ListScope::Status(status.unwrap_or(SubmissionStatus::Pending)),
        };
        Ok(ListFilter {
            kind: self.kind,
            scope,
            before: self.before,
            limit: self.limit.clamp(1, 200),
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.into_filter()?;

    // Run blocking DB reads off the async runtime
    let db = state.clone();
    let rows = spawn_db(move || db.db.list(&filter)).await?.map_err(from_store)?;
    Ok(Json(rows))
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let stats = spawn_db(move || db.db.stats()).await?.map_err(from_store)?;
    Ok(Json(stats))
}

pub async fn bulk_status(
    State(state): State<AppState>,
    Json(req): Json<BulkStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    spawn_db(move || db.db.bulk_update_status(&req.ids, req.status))
        .await?
        .map_err(from_store)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_deleted(
    State(state): State<AppState>,
    Json(req): Json<SetDeletedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    spawn_db(move || db.db.set_deleted(&req.ids, req.deleted))
        .await?
        .map_err(from_store)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Irreversible. The client is expected to have confirmed with the operator;
/// the store additionally restricts the delete to rows already in the trash.
pub async fn permanently_delete(
    State(state): State<AppState>,
    Json(req): Json<PermanentDeleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    spawn_db(move || db.db.permanently_delete(&req.ids))
        .await?
        .map_err(from_store)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_notes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNotesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    spawn_db(move || db.db.update_notes(id, &req.notes))
        .await?
        .map_err(from_store)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Conversion order as sent by the admin UI. The resource type may be
/// omitted when the detector can classify the url; when it cannot, a manual
/// type is mandatory.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertBody {
    pub title: String,
    pub url: String,
    pub resource_type: Option<ResourceType>,
    pub target: ConversionTarget,
}

pub async fn convert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ConvertBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.title.trim().is_empty() {
        return Err(json_error(StatusCode::UNPROCESSABLE_ENTITY, "title is required"));
    }
    if body.url.trim().is_empty() {
        return Err(json_error(StatusCode::UNPROCESSABLE_ENTITY, "url is required"));
    }
    let resource_type = body
        .resource_type
        .or_else(|| lantern_detect::detect(&body.url))
        .ok_or_else(|| {
            json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "resource type could not be detected; select one manually",
            )
        })?;

    let req = ConvertRequest {
        submission_id: id,
        title: body.title,
        url: body.url,
        resource_type,
        target: body.target,
    };

    let db = state.clone();
    spawn_db(move || db.db.convert(&req))
        .await?
        .map_err(from_convert)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn spawn_db<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        internal()
    })
}
