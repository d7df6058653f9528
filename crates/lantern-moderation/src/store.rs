use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use lantern_types::api::ConvertRequest;
use lantern_types::models::{
    CatalogNode, ModerationStats, Submission, SubmissionStatus, SubmissionType,
};

/// Which slice of a submission type a listing covers. A status scope only
/// ever sees non-deleted rows; the trash scope sees every soft-deleted row
/// regardless of its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Status(SubmissionStatus),
    Trash,
}

/// Cursor-paged listing filter. `before` is the `created_at` of the last row
/// of the previous page; rows are returned newest-first and strictly older
/// than the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub kind: SubmissionType,
    pub scope: ListScope,
    pub before: Option<DateTime<Utc>>,
    pub limit: u32,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("submission not found")]
    NotFound,
    #[error("invalid request: {0}")]
    Invalid(&'static str),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Why a conversion attempt was refused or failed. The conflict-class
/// variants (`AlreadyConverted`, `MissingTarget`, `DuplicateUrl`) are kept
/// distinct from generic storage failures so moderators get an actionable
/// message.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("submission not found")]
    NotFound,
    #[error("only resource submissions can be converted")]
    NotAResource,
    #[error("submission was already added")]
    AlreadyConverted,
    #[error("destination no longer exists")]
    MissingTarget,
    #[error("a resource with this url already exists at the destination")]
    DuplicateUrl,
    #[error("invalid request: {0}")]
    Invalid(&'static str),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// The submission store contract. Mutations are all-or-nothing: a batch
/// either applies to every id or to none, and `convert` runs as a single
/// transaction on the store side (never as sequenced client calls).
pub trait SubmissionStore {
    /// List one page, newest-first. A page shorter than `filter.limit`
    /// means there are no further pages.
    fn list(&self, filter: &ListFilter) -> Result<Vec<Submission>, StoreError>;

    /// Per-status counts over the whole corpus.
    fn stats(&self) -> Result<ModerationStats, StoreError>;

    /// Set `status` on every id. `Added` is never a legal target status and
    /// rows already `added` are left untouched (the state is terminal).
    fn bulk_update_status(
        &self,
        ids: &[Uuid],
        status: SubmissionStatus,
    ) -> Result<(), StoreError>;

    /// Toggle the soft-delete flag; orthogonal to `status`.
    fn set_deleted(&self, ids: &[Uuid], deleted: bool) -> Result<(), StoreError>;

    /// Hard removal. Only rows already in the trash are deleted; the caller
    /// must have confirmed with the operator before reaching this.
    fn permanently_delete(&self, ids: &[Uuid]) -> Result<(), StoreError>;

    /// Free-text moderator notes, editable regardless of status.
    fn update_notes(&self, id: Uuid, notes: &str) -> Result<(), StoreError>;

    /// The atomic conversion primitive: insert the leaf row at the chosen
    /// destination and flip the submission to `added`, as one unit.
    fn convert(&self, req: &ConvertRequest) -> Result<(), ConvertError>;
}

/// Read access to the two content hierarchies, as needed by the destination
/// resolver. `published_only` narrows each level to published nodes.
pub trait CatalogReader {
    fn categories(&self, published_only: bool) -> Result<Vec<CatalogNode>, StoreError>;
    fn courses(&self, category_id: Uuid, published_only: bool)
    -> Result<Vec<CatalogNode>, StoreError>;
    fn days(&self, course_id: Uuid, published_only: bool) -> Result<Vec<CatalogNode>, StoreError>;
    fn tracks(&self, published_only: bool) -> Result<Vec<CatalogNode>, StoreError>;
    fn topics(&self, track_id: Uuid, published_only: bool)
    -> Result<Vec<CatalogNode>, StoreError>;
}
