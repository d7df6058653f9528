//! The atomic conversion primitive: materialize a resource submission as a
//! lesson (course side) or resource (roadmap side) and flip the submission
//! to `added`, as one transaction.

use anyhow::anyhow;
use chrono::Utc;
use rusqlite::{OptionalExtension, Transaction, TransactionBehavior};
use tracing::info;
use uuid::Uuid;

use lantern_moderation::store::ConvertError;
use lantern_types::api::ConvertRequest;
use lantern_types::models::ConversionTarget;

use crate::Database;
use crate::models::format_ts;

impl Database {
    /// Run the whole conversion inside one IMMEDIATE transaction so two
    /// moderators racing on the same submission cannot both succeed, and
    /// so the leaf insert and the status flip are never observable apart.
    pub fn convert_submission(&self, req: &ConvertRequest) -> Result<(), ConvertError> {
        if req.title.trim().is_empty() {
            return Err(ConvertError::Invalid("title must not be empty"));
        }
        if req.url.trim().is_empty() {
            return Err(ConvertError::Invalid("url must not be empty"));
        }

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ConvertError::Storage(anyhow!("DB lock poisoned: {}", e)))?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ConvertError::Storage(e.into()))?;

        let id = req.submission_id.to_string();
        let current: Option<(String, String)> = tx
            .query_row(
                "SELECT type, status FROM submissions WHERE id = ?1",
                [&id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| ConvertError::Storage(e.into()))?;

        let (kind, status) = current.ok_or(ConvertError::NotFound)?;
        if kind != "resource" {
            return Err(ConvertError::NotAResource);
        }
        if status == "added" {
            return Err(ConvertError::AlreadyConverted);
        }

        let (target_day, target_topic) = match req.target {
            ConversionTarget::Course { day_id } => {
                insert_leaf(&tx, "days", "lessons", "day_id", day_id, req)?;
                (Some(day_id.to_string()), None)
            }
            ConversionTarget::Roadmap { topic_id } => {
                insert_leaf(&tx, "topics", "resources", "topic_id", topic_id, req)?;
                (None, Some(topic_id.to_string()))
            }
        };

        tx.execute(
            "UPDATE submissions
             SET status = 'added', title = ?1, url = ?2, resource_type = ?3,
                 target_type = ?4, target_day_id = ?5, target_topic_id = ?6
             WHERE id = ?7",
            rusqlite::params![
                req.title.trim(),
                req.url.trim(),
                req.resource_type.as_str(),
                req.target.target_type().as_str(),
                target_day,
                target_topic,
                id,
            ],
        )
        .map_err(|e| ConvertError::Storage(e.into()))?;

        tx.commit().map_err(|e| ConvertError::Storage(e.into()))?;

        info!(
            submission = %req.submission_id,
            target = req.target.target_type().as_str(),
            leaf = %req.target.leaf_id(),
            "submission converted"
        );
        Ok(())
    }
}

/// Validate the leaf parent, refuse duplicate URLs among its children, and
/// append the new item after its siblings.
fn insert_leaf(
    tx: &Transaction,
    parent_table: &str,
    leaf_table: &str,
    parent_col: &str,
    parent_id: Uuid,
    req: &ConvertRequest,
) -> Result<(), ConvertError> {
    let parent = parent_id.to_string();

    let exists: Option<i64> = tx
        .query_row(
            &format!("SELECT 1 FROM {parent_table} WHERE id = ?1"),
            [&parent],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| ConvertError::Storage(e.into()))?;
    if exists.is_none() {
        return Err(ConvertError::MissingTarget);
    }

    let duplicate: Option<i64> = tx
        .query_row(
            &format!("SELECT 1 FROM {leaf_table} WHERE {parent_col} = ?1 AND url = ?2"),
            rusqlite::params![parent, req.url.trim()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| ConvertError::Storage(e.into()))?;
    if duplicate.is_some() {
        return Err(ConvertError::DuplicateUrl);
    }

    let position: i64 = tx
        .query_row(
            &format!(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM {leaf_table} WHERE {parent_col} = ?1"
            ),
            [&parent],
            |row| row.get(0),
        )
        .map_err(|e| ConvertError::Storage(e.into()))?;

    tx.execute(
        &format!(
            "INSERT INTO {leaf_table} (id, {parent_col}, title, url, type, position, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        ),
        rusqlite::params![
            Uuid::new_v4().to_string(),
            parent,
            req.title.trim(),
            req.url.trim(),
            req.resource_type.as_str(),
            position,
            format_ts(Utc::now()),
        ],
    )
    .map_err(|e| ConvertError::Storage(e.into()))?;

    Ok(())
}
