use anyhow::{Context, Result, ensure};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use lantern_moderation::store::{
    CatalogReader, ConvertError, ListFilter, ListScope, StoreError, SubmissionStore,
};
use lantern_types::api::{ConvertRequest, CreateSubmissionRequest};
use lantern_types::models::{
    CatalogNode, ModerationStats, Submission, SubmissionStatus, SubmissionType,
};

use crate::Database;
use crate::models::{LeafRow, SubmissionRow, UserRow, format_ts};

/// Shared SELECT head for submissions; the CASE computes the per-email
/// contributor tally (0 for anonymous rows).
const SUBMISSION_SELECT: &str = "SELECT s.id, s.type, s.status, s.is_deleted, s.title, s.message,
        s.url, s.resource_type, s.admin_notes, s.name, s.email,
        CASE WHEN s.email IS NULL THEN 0
             ELSE (SELECT COUNT(*) FROM submissions c WHERE c.email = s.email) END,
        s.context_title, s.context_url, s.target_type, s.target_day_id, s.target_topic_id,
        s.created_at
     FROM submissions s";

fn read_submission_row(row: &Row) -> rusqlite::Result<SubmissionRow> {
    Ok(SubmissionRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        status: row.get(2)?,
        is_deleted: row.get(3)?,
        title: row.get(4)?,
        message: row.get(5)?,
        url: row.get(6)?,
        resource_type: row.get(7)?,
        admin_notes: row.get(8)?,
        name: row.get(9)?,
        email: row.get(10)?,
        contributor_count: row.get(11)?,
        context_title: row.get(12)?,
        context_url: row.get(13)?,
        target_type: row.get(14)?,
        target_day_id: row.get(15)?,
        target_topic_id: row.get(16)?,
        created_at: row.get(17)?,
    })
}

fn in_placeholders(first_index: usize, count: usize) -> String {
    (first_index..first_index + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare(
                    "SELECT id, username, password, created_at FROM users WHERE username = ?1",
                )?
                .query_row([username], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    // -- Submissions --

    /// Insert a new public submission. Status is always `pending`; the
    /// url-iff-resource invariant is enforced here in addition to the
    /// table's CHECK constraint so callers get a readable error.
    pub fn create_submission(&self, req: &CreateSubmissionRequest) -> Result<Submission> {
        ensure!(!req.title.trim().is_empty(), "title is required");
        if req.kind == SubmissionType::Resource {
            ensure!(
                req.url.as_deref().is_some_and(|u| !u.trim().is_empty()),
                "resource submissions require a url"
            );
        } else {
            ensure!(req.url.is_none(), "only resource submissions carry a url");
        }

        let id = Uuid::new_v4();
        let created_at = format_ts(Utc::now());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO submissions
                    (id, type, status, is_deleted, title, message, url,
                     name, email, context_title, context_url, created_at)
                 VALUES (?1, ?2, 'pending', 0, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    id.to_string(),
                    req.kind.as_str(),
                    req.title.trim(),
                    req.message,
                    req.url,
                    req.name,
                    req.email,
                    req.context_title,
                    req.context_url,
                    created_at,
                ],
            )?;
            Ok(())
        })?;

        self.get_submission(id)?
            .context("submission missing immediately after insert")
    }

    pub fn get_submission(&self, id: Uuid) -> Result<Option<Submission>> {
        self.with_conn(|conn| {
            let sql = format!("{SUBMISSION_SELECT} WHERE s.id = ?1");
            let row = conn
                .prepare(&sql)?
                .query_row([id.to_string()], read_submission_row)
                .optional()?;
            row.map(SubmissionRow::into_submission).transpose()
        })
    }

    /// One page of a `(type, scope)` partition, newest first, strictly
    /// older than the cursor when one is given.
    pub fn list_submissions(&self, filter: &ListFilter) -> Result<Vec<Submission>> {
        let kind = filter.kind.as_str();
        let status = match filter.scope {
            ListScope::Status(status) => Some(status.as_str()),
            ListScope::Trash => None,
        };
        let cursor = filter.before.map(format_ts);
        let limit = filter.limit as i64;

        let mut sql = format!("{SUBMISSION_SELECT} WHERE s.type = ?");
        let mut params: Vec<&dyn rusqlite::types::ToSql> = vec![&kind];
        match &status {
            Some(status) => {
                sql.push_str(" AND s.is_deleted = 0 AND s.status = ?");
                params.push(status);
            }
            None => sql.push_str(" AND s.is_deleted = 1"),
        }
        if let Some(cursor) = &cursor {
            sql.push_str(" AND s.created_at < ?");
            params.push(cursor);
        }
        sql.push_str(" ORDER BY s.created_at DESC LIMIT ?");
        params.push(&limit);

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params.as_slice(), read_submission_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter()
                .map(SubmissionRow::into_submission)
                .collect()
        })
    }

    pub fn submission_stats(&self) -> Result<ModerationStats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    COALESCE(SUM(CASE WHEN is_deleted = 0 AND status = 'pending'  THEN 1 END), 0),
                    COALESCE(SUM(CASE WHEN is_deleted = 0 AND status = 'approved' THEN 1 END), 0),
                    COALESCE(SUM(CASE WHEN is_deleted = 0 AND status = 'rejected' THEN 1 END), 0),
                    COALESCE(SUM(CASE WHEN is_deleted = 0 AND status = 'added'    THEN 1 END), 0),
                    COALESCE(SUM(CASE WHEN is_deleted = 0 AND status = 'spam'     THEN 1 END), 0),
                    COALESCE(SUM(CASE WHEN is_deleted = 1 THEN 1 END), 0)
                 FROM submissions",
                [],
                |row| {
                    Ok(ModerationStats {
                        pending: row.get::<_, i64>(0)? as u64,
                        approved: row.get::<_, i64>(1)? as u64,
                        rejected: row.get::<_, i64>(2)? as u64,
                        added: row.get::<_, i64>(3)? as u64,
                        spam: row.get::<_, i64>(4)? as u64,
                        trash: row.get::<_, i64>(5)? as u64,
                    })
                },
            )?;
            Ok(stats)
        })
    }

    /// Set `status` on all ids in one statement. Rows already `added` are
    /// skipped: that state is terminal.
    pub fn bulk_set_status(&self, ids: &[Uuid], status: SubmissionStatus) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let id_strings: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let sql = format!(
            "UPDATE submissions SET status = ?1
             WHERE status != 'added' AND id IN ({})",
            in_placeholders(2, id_strings.len())
        );
        let status = status.as_str();
        self.with_conn(|conn| {
            let mut params: Vec<&dyn rusqlite::types::ToSql> = vec![&status];
            params.extend(id_strings.iter().map(|id| id as &dyn rusqlite::types::ToSql));
            conn.execute(&sql, params.as_slice())?;
            Ok(())
        })
    }

    /// Toggle the soft-delete flag; `status` is untouched.
    pub fn set_submissions_deleted(&self, ids: &[Uuid], deleted: bool) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let id_strings: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let sql = format!(
            "UPDATE submissions SET is_deleted = ?1 WHERE id IN ({})",
            in_placeholders(2, id_strings.len())
        );
        self.with_conn(|conn| {
            let flag = deleted as i64;
            let mut params: Vec<&dyn rusqlite::types::ToSql> = vec![&flag];
            params.extend(id_strings.iter().map(|id| id as &dyn rusqlite::types::ToSql));
            conn.execute(&sql, params.as_slice())?;
            Ok(())
        })
    }

    /// Hard-delete rows, but only ones already in the trash.
    pub fn purge_submissions(&self, ids: &[Uuid]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let id_strings: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let sql = format!(
            "DELETE FROM submissions WHERE is_deleted = 1 AND id IN ({})",
            in_placeholders(1, id_strings.len())
        );
        self.with_conn(|conn| {
            let params: Vec<&dyn rusqlite::types::ToSql> = id_strings
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            conn.execute(&sql, params.as_slice())?;
            Ok(())
        })
    }

    /// Returns false when no such submission exists.
    pub fn set_admin_notes(&self, id: Uuid, notes: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE submissions SET admin_notes = ?1 WHERE id = ?2",
                rusqlite::params![notes, id.to_string()],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Catalog reads --

    pub fn list_categories(&self, published_only: bool) -> Result<Vec<CatalogNode>> {
        self.with_conn(|conn| {
            catalog_nodes(
                conn,
                "SELECT id, title, published FROM categories
                 WHERE (?1 = 0 OR published = 1) ORDER BY position, title",
                None,
                published_only,
            )
        })
    }

    pub fn list_courses(&self, category_id: Uuid, published_only: bool) -> Result<Vec<CatalogNode>> {
        self.with_conn(|conn| {
            catalog_nodes(
                conn,
                "SELECT id, title, published FROM courses
                 WHERE category_id = ?2 AND (?1 = 0 OR published = 1) ORDER BY position, title",
                Some(category_id),
                published_only,
            )
        })
    }

    pub fn list_days(&self, course_id: Uuid, published_only: bool) -> Result<Vec<CatalogNode>> {
        self.with_conn(|conn| {
            catalog_nodes(
                conn,
                "SELECT id, title, published FROM days
                 WHERE course_id = ?2 AND (?1 = 0 OR published = 1) ORDER BY position, title",
                Some(course_id),
                published_only,
            )
        })
    }

    pub fn list_tracks(&self, published_only: bool) -> Result<Vec<CatalogNode>> {
        self.with_conn(|conn| {
            catalog_nodes(
                conn,
                "SELECT id, title, published FROM tracks
                 WHERE (?1 = 0 OR published = 1) ORDER BY position, title",
                None,
                published_only,
            )
        })
    }

    pub fn list_topics(&self, track_id: Uuid, published_only: bool) -> Result<Vec<CatalogNode>> {
        self.with_conn(|conn| {
            catalog_nodes(
                conn,
                "SELECT id, title, published FROM topics
                 WHERE track_id = ?2 AND (?1 = 0 OR published = 1) ORDER BY position, title",
                Some(track_id),
                published_only,
            )
        })
    }

    // -- Leaf items (conversion output) --

    pub fn lessons_for_day(&self, day_id: Uuid) -> Result<Vec<LeafRow>> {
        self.with_conn(|conn| {
            leaf_rows(
                conn,
                "SELECT id, day_id, title, url, type, position FROM lessons
                 WHERE day_id = ?1 ORDER BY position",
                day_id,
            )
        })
    }

    pub fn resources_for_topic(&self, topic_id: Uuid) -> Result<Vec<LeafRow>> {
        self.with_conn(|conn| {
            leaf_rows(
                conn,
                "SELECT id, topic_id, title, url, type, position FROM resources
                 WHERE topic_id = ?1 ORDER BY position",
                topic_id,
            )
        })
    }
}

fn catalog_nodes(
    conn: &Connection,
    sql: &str,
    parent: Option<Uuid>,
    published_only: bool,
) -> Result<Vec<CatalogNode>> {
    let mut stmt = conn.prepare(sql)?;
    let flag = published_only as i64;
    let read = |row: &Row| -> rusqlite::Result<(String, String, bool)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    };
    let raw: Vec<(String, String, bool)> = match parent {
        Some(parent) => stmt
            .query_map(rusqlite::params![flag, parent.to_string()], read)?
            .collect::<std::result::Result<_, _>>()?,
        None => stmt
            .query_map(rusqlite::params![flag], read)?
            .collect::<std::result::Result<_, _>>()?,
    };
    raw.into_iter()
        .map(|(id, title, published)| {
            Ok(CatalogNode {
                id: id.parse().context("bad catalog node id")?,
                title,
                published,
            })
        })
        .collect()
}

fn leaf_rows(conn: &Connection, sql: &str, parent: Uuid) -> Result<Vec<LeafRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([parent.to_string()], |row| {
            Ok(LeafRow {
                id: row.get(0)?,
                parent_id: row.get(1)?,
                title: row.get(2)?,
                url: row.get(3)?,
                kind: row.get(4)?,
                position: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// -- Moderation core contracts --

impl SubmissionStore for Database {
    fn list(&self, filter: &ListFilter) -> Result<Vec<Submission>, StoreError> {
        Ok(self.list_submissions(filter)?)
    }

    fn stats(&self) -> Result<ModerationStats, StoreError> {
        Ok(self.submission_stats()?)
    }

    fn bulk_update_status(
        &self,
        ids: &[Uuid],
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        if status == SubmissionStatus::Added {
            return Err(StoreError::Invalid("added is set only through conversion"));
        }
        Ok(self.bulk_set_status(ids, status)?)
    }

    fn set_deleted(&self, ids: &[Uuid], deleted: bool) -> Result<(), StoreError> {
        Ok(self.set_submissions_deleted(ids, deleted)?)
    }

    fn permanently_delete(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        Ok(self.purge_submissions(ids)?)
    }

    fn update_notes(&self, id: Uuid, notes: &str) -> Result<(), StoreError> {
        if self.set_admin_notes(id, notes)? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn convert(&self, req: &ConvertRequest) -> Result<(), ConvertError> {
        self.convert_submission(req)
    }
}

impl CatalogReader for Database {
    fn categories(&self, published_only: bool) -> Result<Vec<CatalogNode>, StoreError> {
        Ok(self.list_categories(published_only)?)
    }

    fn courses(
        &self,
        category_id: Uuid,
        published_only: bool,
    ) -> Result<Vec<CatalogNode>, StoreError> {
        Ok(self.list_courses(category_id, published_only)?)
    }

    fn days(&self, course_id: Uuid, published_only: bool) -> Result<Vec<CatalogNode>, StoreError> {
        Ok(self.list_days(course_id, published_only)?)
    }

    fn tracks(&self, published_only: bool) -> Result<Vec<CatalogNode>, StoreError> {
        Ok(self.list_tracks(published_only)?)
    }

    fn topics(&self, track_id: Uuid, published_only: bool) -> Result<Vec<CatalogNode>, StoreError> {
        Ok(self.list_topics(track_id, published_only)?)
    }
}
