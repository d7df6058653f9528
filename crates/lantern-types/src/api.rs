use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ConversionTarget, ResourceType, SubmissionStatus, SubmissionType};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and token issuance.
/// Canonical definition lives here to avoid drift between the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Public intake --

/// Anonymous submission from the public site. Status is always forced to
/// `pending` server-side; `url` must be present iff `type` is `resource`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSubmissionRequest {
    #[serde(rename = "type")]
    pub kind: SubmissionType,
    pub title: String,
    pub message: Option<String>,
    pub url: Option<String>,
    pub context_url: Option<String>,
    pub context_title: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

// -- Moderator actions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkStatusRequest {
    pub ids: Vec<Uuid>,
    pub status: SubmissionStatus,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetDeletedRequest {
    pub ids: Vec<Uuid>,
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermanentDeleteRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateNotesRequest {
    pub notes: String,
}

/// The fully-resolved conversion order handed to the store: everything the
/// atomic convert transaction needs, with the resource type already settled
/// (detected or manually chosen, never absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub submission_id: Uuid,
    pub title: String,
    pub url: String,
    pub resource_type: ResourceType,
    pub target: ConversionTarget,
}
