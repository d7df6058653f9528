//! Read-only hierarchy listings backing the destination picker's cascading
//! selects.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use lantern_moderation::store::CatalogReader;
use lantern_types::models::CatalogNode;

use crate::auth::AppState;
use crate::errors::{ApiError, from_store, internal};

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    /// Narrow each level to published nodes; defaults to true.
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

pub async fn categories(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    nodes(move |db| db.categories(query.published), state).await
}

pub async fn courses(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    nodes(move |db| db.courses(category_id, query.published), state).await
}

pub async fn days(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    nodes(move |db| db.days(course_id, query.published), state).await
}

pub async fn tracks(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    nodes(move |db| db.tracks(query.published), state).await
}

pub async fn topics(
    State(state): State<AppState>,
    Path(track_id): Path<Uuid>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    nodes(move |db| db.topics(track_id, query.published), state).await
}

async fn nodes<F>(read: F, state: AppState) -> Result<Json<Vec<CatalogNode>>, ApiError>
where
    F: FnOnce(&lantern_db::Database) -> Result<Vec<CatalogNode>, lantern_moderation::store::StoreError>
        + Send
        + 'static,
{
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || read(&db.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            internal()
        })?
        .map_err(from_store)?;
    Ok(Json(rows))
}
