use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a visitor submitted. Fixed at creation, never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionType {
    Feedback,
    Suggestion,
    Resource,
}

impl SubmissionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionType::Feedback => "feedback",
            SubmissionType::Suggestion => "suggestion",
            SubmissionType::Resource => "resource",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "feedback" => Some(SubmissionType::Feedback),
            "suggestion" => Some(SubmissionType::Suggestion),
            "resource" => Some(SubmissionType::Resource),
            _ => None,
        }
    }
}

/// Moderation state. `Added` is terminal: it is reachable only through
/// conversion and can never be left through a plain status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
    Spam,
    Added,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::Spam => "spam",
            SubmissionStatus::Added => "added",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SubmissionStatus::Pending),
            "approved" => Some(SubmissionStatus::Approved),
            "rejected" => Some(SubmissionStatus::Rejected),
            "spam" => Some(SubmissionStatus::Spam),
            "added" => Some(SubmissionStatus::Added),
            _ => None,
        }
    }
}

/// Coarse content classification for a learning resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Video,
    Article,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Video => "video",
            ResourceType::Article => "article",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(ResourceType::Video),
            "article" => Some(ResourceType::Article),
            _ => None,
        }
    }
}

/// Which content hierarchy a converted submission landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Course,
    Roadmap,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Course => "course",
            TargetType::Roadmap => "roadmap",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "course" => Some(TargetType::Course),
            "roadmap" => Some(TargetType::Roadmap),
            _ => None,
        }
    }
}

/// Destination linkage written at conversion time. Modeled as a tagged union
/// so a submission can never carry both a day id and a topic id, or a target
/// type without a leaf id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConversionTarget {
    Course { day_id: Uuid },
    Roadmap { topic_id: Uuid },
}

impl ConversionTarget {
    pub fn target_type(self) -> TargetType {
        match self {
            ConversionTarget::Course { .. } => TargetType::Course,
            ConversionTarget::Roadmap { .. } => TargetType::Roadmap,
        }
    }

    /// The leaf parent id: a day for the course hierarchy, a topic for the
    /// roadmap hierarchy.
    pub fn leaf_id(self) -> Uuid {
        match self {
            ConversionTarget::Course { day_id } => day_id,
            ConversionTarget::Roadmap { topic_id } => topic_id,
        }
    }
}

/// A moderatable community submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: SubmissionType,
    pub status: SubmissionStatus,
    pub is_deleted: bool,
    pub title: String,
    pub message: Option<String>,
    /// Present iff `kind == Resource`.
    pub url: Option<String>,
    /// Set once, at conversion.
    pub resource_type: Option<ResourceType>,
    pub admin_notes: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    /// How many submissions share this contributor's email. Display signal
    /// only; 0 for anonymous submissions.
    pub contributor_count: u32,
    pub context_title: Option<String>,
    pub context_url: Option<String>,
    /// Populated only once the submission has been converted.
    pub target: Option<ConversionTarget>,
    pub created_at: DateTime<Utc>,
}

/// Per-status counts driving the moderation tab badges. The five status
/// buckets count non-deleted rows; `trash` counts every soft-deleted row
/// regardless of status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationStats {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub added: u64,
    pub spam: u64,
    pub trash: u64,
}

impl ModerationStats {
    pub fn total(&self) -> u64 {
        self.pending + self.approved + self.rejected + self.added + self.spam + self.trash
    }
}

/// One selectable node of a content hierarchy (category, course, day, track
/// or topic), as surfaced to the destination picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogNode {
    pub id: Uuid,
    pub title: String,
    pub published: bool,
}
