//! Database row types and row-to-domain mapping.
//! Rows hold raw SQLite values; parsing into the shared domain model
//! happens in one place so corrupt rows fail loudly instead of leaking.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, SecondsFormat, Utc};

use lantern_types::models::{
    ConversionTarget, ResourceType, Submission, SubmissionStatus, SubmissionType,
};

/// Fixed-width RFC 3339 with microseconds: lexicographic order matches
/// chronological order, which the strictly-less-than pagination cursor
/// relies on.
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("bad timestamp in database: {raw}"))?;
    Ok(parsed.with_timezone(&Utc))
}

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct SubmissionRow {
    pub id: String,
    pub kind: String,
    pub status: String,
    pub is_deleted: bool,
    pub title: String,
    pub message: Option<String>,
    pub url: Option<String>,
    pub resource_type: Option<String>,
    pub admin_notes: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub contributor_count: i64,
    pub context_title: Option<String>,
    pub context_url: Option<String>,
    pub target_type: Option<String>,
    pub target_day_id: Option<String>,
    pub target_topic_id: Option<String>,
    pub created_at: String,
}

impl SubmissionRow {
    pub fn into_submission(self) -> Result<Submission> {
        let kind = SubmissionType::parse(&self.kind)
            .with_context(|| format!("bad submission type: {}", self.kind))?;
        let status = SubmissionStatus::parse(&self.status)
            .with_context(|| format!("bad submission status: {}", self.status))?;
        let resource_type = self
            .resource_type
            .as_deref()
            .map(|raw| {
                ResourceType::parse(raw).with_context(|| format!("bad resource type: {raw}"))
            })
            .transpose()?;

        let target = match (self.target_type.as_deref(), &self.target_day_id, &self.target_topic_id)
        {
            (None, None, None) => None,
            (Some("course"), Some(day_id), None) => Some(ConversionTarget::Course {
                day_id: day_id.parse().context("bad target_day_id")?,
            }),
            (Some("roadmap"), None, Some(topic_id)) => Some(ConversionTarget::Roadmap {
                topic_id: topic_id.parse().context("bad target_topic_id")?,
            }),
            _ => bail!("inconsistent target linkage on submission {}", self.id),
        };

        Ok(Submission {
            id: self.id.parse().context("bad submission id")?,
            kind,
            status,
            is_deleted: self.is_deleted,
            title: self.title,
            message: self.message,
            url: self.url,
            resource_type,
            admin_notes: self.admin_notes,
            name: self.name,
            email: self.email,
            contributor_count: self.contributor_count.max(0) as u32,
            context_title: self.context_title,
            context_url: self.context_url,
            target,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

/// A materialized leaf item: a lesson under a day, or a resource under a
/// topic.
pub struct LeafRow {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub url: String,
    pub kind: String,
    pub position: i64,
}
