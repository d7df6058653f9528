//! In-memory store and catalog fakes for controller and resolver tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use anyhow::anyhow;
use chrono::{Duration, Utc};
use uuid::Uuid;

use lantern_types::api::ConvertRequest;
use lantern_types::models::{
    CatalogNode, ConversionTarget, ModerationStats, Submission, SubmissionStatus, SubmissionType,
};

use crate::store::{
    CatalogReader, ConvertError, ListFilter, ListScope, StoreError, SubmissionStore,
};

pub fn sub(kind: SubmissionType, status: SubmissionStatus, age_minutes: i64) -> Submission {
    Submission {
        id: Uuid::new_v4(),
        kind,
        status,
        is_deleted: false,
        title: format!("submission {age_minutes}"),
        message: None,
        url: (kind == SubmissionType::Resource).then(|| "https://example.com/post".to_string()),
        resource_type: None,
        admin_notes: None,
        name: None,
        email: None,
        contributor_count: 0,
        context_title: None,
        context_url: None,
        target: None,
        created_at: Utc::now() - Duration::minutes(age_minutes),
    }
}

#[derive(Default)]
pub struct MemStore {
    pub rows: RefCell<Vec<Submission>>,
    pub fail_mutations: Cell<bool>,
    /// (leaf id, url) pairs already present at a destination, to simulate
    /// the duplicate-URL conflict.
    pub leaf_urls: RefCell<HashSet<(Uuid, String)>>,
}

impl MemStore {
    pub fn push(&self, row: Submission) {
        self.rows.borrow_mut().push(row);
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        if self.fail_mutations.get() {
            return Err(StoreError::Storage(anyhow!("simulated store failure")));
        }
        Ok(())
    }
}

impl SubmissionStore for MemStore {
    fn list(&self, filter: &ListFilter) -> Result<Vec<Submission>, StoreError> {
        let mut rows: Vec<Submission> = self
            .rows
            .borrow()
            .iter()
            .filter(|row| row.kind == filter.kind)
            .filter(|row| match filter.scope {
                ListScope::Status(status) => !row.is_deleted && row.status == status,
                ListScope::Trash => row.is_deleted,
            })
            .filter(|row| filter.before.is_none_or(|cursor| row.created_at < cursor))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(filter.limit as usize);
        Ok(rows)
    }

    fn stats(&self) -> Result<ModerationStats, StoreError> {
        let mut stats = ModerationStats::default();
        for row in self.rows.borrow().iter() {
            if row.is_deleted {
                stats.trash += 1;
                continue;
            }
            match row.status {
                SubmissionStatus::Pending => stats.pending += 1,
                SubmissionStatus::Approved => stats.approved += 1,
                SubmissionStatus::Rejected => stats.rejected += 1,
                SubmissionStatus::Spam => stats.spam += 1,
                SubmissionStatus::Added => stats.added += 1,
            }
        }
        Ok(stats)
    }

    fn bulk_update_status(
        &self,
        ids: &[Uuid],
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        self.check_failure()?;
        if status == SubmissionStatus::Added {
            return Err(StoreError::Invalid("added is set only through conversion"));
        }
        for row in self.rows.borrow_mut().iter_mut() {
            if ids.contains(&row.id) && row.status != SubmissionStatus::Added {
                row.status = status;
            }
        }
        Ok(())
    }

    fn set_deleted(&self, ids: &[Uuid], deleted: bool) -> Result<(), StoreError> {
        self.check_failure()?;
        for row in self.rows.borrow_mut().iter_mut() {
            if ids.contains(&row.id) {
                row.is_deleted = deleted;
            }
        }
        Ok(())
    }

    fn permanently_delete(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        self.check_failure()?;
        self.rows
            .borrow_mut()
            .retain(|row| !(ids.contains(&row.id) && row.is_deleted));
        Ok(())
    }

    fn update_notes(&self, id: Uuid, notes: &str) -> Result<(), StoreError> {
        self.check_failure()?;
        let mut rows = self.rows.borrow_mut();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(StoreError::NotFound)?;
        row.admin_notes = Some(notes.to_string());
        Ok(())
    }

    fn convert(&self, req: &ConvertRequest) -> Result<(), ConvertError> {
        if self.fail_mutations.get() {
            return Err(ConvertError::Storage(anyhow!("simulated store failure")));
        }
        let mut rows = self.rows.borrow_mut();
        let row = rows
            .iter_mut()
            .find(|row| row.id == req.submission_id)
            .ok_or(ConvertError::NotFound)?;
        if row.kind != SubmissionType::Resource {
            return Err(ConvertError::NotAResource);
        }
        if row.status == SubmissionStatus::Added {
            return Err(ConvertError::AlreadyConverted);
        }
        let key = (req.target.leaf_id(), req.url.clone());
        if !self.leaf_urls.borrow_mut().insert(key) {
            return Err(ConvertError::DuplicateUrl);
        }
        row.title = req.title.clone();
        row.url = Some(req.url.clone());
        row.resource_type = Some(req.resource_type);
        row.target = Some(req.target);
        row.status = SubmissionStatus::Added;
        Ok(())
    }
}

pub struct MemCatalog {
    pub category: CatalogNode,
    pub course: CatalogNode,
    pub day: CatalogNode,
    pub track: CatalogNode,
    pub topic: CatalogNode,
}

fn node(title: &str) -> CatalogNode {
    CatalogNode {
        id: Uuid::new_v4(),
        title: title.to_string(),
        published: true,
    }
}

impl Default for MemCatalog {
    fn default() -> Self {
        Self {
            category: node("Web"),
            course: node("HTML Basics"),
            day: node("Day 1"),
            track: node("Frontend"),
            topic: node("CSS Layout"),
        }
    }
}

impl CatalogReader for MemCatalog {
    fn categories(&self, _published_only: bool) -> Result<Vec<CatalogNode>, StoreError> {
        Ok(vec![self.category.clone()])
    }

    fn courses(
        &self,
        category_id: Uuid,
        _published_only: bool,
    ) -> Result<Vec<CatalogNode>, StoreError> {
        if category_id == self.category.id {
            Ok(vec![self.course.clone()])
        } else {
            Ok(vec![])
        }
    }

    fn days(&self, course_id: Uuid, _published_only: bool) -> Result<Vec<CatalogNode>, StoreError> {
        if course_id == self.course.id {
            Ok(vec![self.day.clone()])
        } else {
            Ok(vec![])
        }
    }

    fn tracks(&self, _published_only: bool) -> Result<Vec<CatalogNode>, StoreError> {
        Ok(vec![self.track.clone()])
    }

    fn topics(&self, track_id: Uuid, _published_only: bool) -> Result<Vec<CatalogNode>, StoreError> {
        if track_id == self.track.id {
            Ok(vec![self.topic.clone()])
        } else {
            Ok(vec![])
        }
    }
}