use thiserror::Error;
use uuid::Uuid;

use lantern_types::api::ConvertRequest;
use lantern_types::models::{
    CatalogNode, ConversionTarget, ResourceType, Submission, SubmissionType, TargetType,
};

use crate::store::{CatalogReader, StoreError};

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("only resource submissions can be routed")]
    NotAResource,
    #[error("submission has no url")]
    MissingUrl,
    #[error("no destination leaf selected")]
    MissingDestination,
    #[error("title must not be empty")]
    MissingTitle,
    #[error("resource type could not be detected; select one manually")]
    UnknownResourceType,
    #[error("selected id is not an option at this level")]
    UnknownOption,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Loaded options and selections while walking one hierarchy. Every level
/// below a change is reset, and options are only fetched once the parent is
/// chosen.
enum Destination {
    Unset,
    Course {
        categories: Vec<CatalogNode>,
        category: Option<Uuid>,
        courses: Vec<CatalogNode>,
        course: Option<Uuid>,
        days: Vec<CatalogNode>,
        day: Option<Uuid>,
    },
    Roadmap {
        tracks: Vec<CatalogNode>,
        track: Option<Uuid>,
        topics: Vec<CatalogNode>,
        topic: Option<Uuid>,
    },
}

/// What the moderator sees before confirming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub title: String,
    pub url: String,
    pub resource_type: Option<ResourceType>,
    /// Titles of the chosen nodes, root to leaf.
    pub destination: Vec<String>,
}

/// Guided destination picker for converting a resource submission.
///
/// Step 1: choose the hierarchy (`course` or `roadmap`). Step 2: cascade
/// down to a leaf (day or topic). Step 3: review — title and url are
/// editable in place, with the detector re-run live on every url edit.
pub struct DestinationResolver<'a, C: CatalogReader> {
    catalog: &'a C,
    published_only: bool,
    submission_id: Uuid,
    title: String,
    url: String,
    detected: Option<ResourceType>,
    manual_type: Option<ResourceType>,
    destination: Destination,
}

impl<'a, C: CatalogReader> DestinationResolver<'a, C> {
    pub fn new(
        catalog: &'a C,
        submission: &Submission,
        published_only: bool,
    ) -> Result<Self, ResolverError> {
        if submission.kind != SubmissionType::Resource {
            return Err(ResolverError::NotAResource);
        }
        let url = submission.url.clone().ok_or(ResolverError::MissingUrl)?;
        Ok(Self {
            catalog,
            published_only,
            submission_id: submission.id,
            title: submission.title.clone(),
            detected: lantern_detect::detect(&url),
            manual_type: None,
            url,
            destination: Destination::Unset,
        })
    }

    /// Current wizard step, 1 through 3.
    pub fn step(&self) -> u8 {
        if matches!(self.destination, Destination::Unset) {
            1
        } else if self.leaf().is_none() {
            2
        } else {
            3
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Manual override wins; otherwise whatever the detector said last.
    pub fn resource_type(&self) -> Option<ResourceType> {
        self.manual_type.or(self.detected)
    }

    pub fn leaf(&self) -> Option<ConversionTarget> {
        match &self.destination {
            Destination::Course { day: Some(day_id), .. } => {
                Some(ConversionTarget::Course { day_id: *day_id })
            }
            Destination::Roadmap { topic: Some(topic_id), .. } => {
                Some(ConversionTarget::Roadmap { topic_id: *topic_id })
            }
            _ => None,
        }
    }

    // -- Step 1 --

    /// Pick which hierarchy to route into, loading its top level. Switching
    /// hierarchies discards every selection made so far.
    pub fn choose_destination(&mut self, target: TargetType) -> Result<(), ResolverError> {
        self.destination = match target {
            TargetType::Course => Destination::Course {
                categories: self.catalog.categories(self.published_only)?,
                category: None,
                courses: Vec::new(),
                course: None,
                days: Vec::new(),
                day: None,
            },
            TargetType::Roadmap => Destination::Roadmap {
                tracks: self.catalog.tracks(self.published_only)?,
                track: None,
                topics: Vec::new(),
                topic: None,
            },
        };
        Ok(())
    }

    // -- Step 2: course side --

    pub fn categories(&self) -> &[CatalogNode] {
        match &self.destination {
            Destination::Course { categories, .. } => categories,
            _ => &[],
        }
    }

    pub fn courses(&self) -> &[CatalogNode] {
        match &self.destination {
            Destination::Course { courses, .. } => courses,
            _ => &[],
        }
    }

    pub fn days(&self) -> &[CatalogNode] {
        match &self.destination {
            Destination::Course { days, .. } => days,
            _ => &[],
        }
    }

    pub fn choose_category(&mut self, id: Uuid) -> Result<(), ResolverError> {
        let loaded = self.catalog.courses(id, self.published_only)?;
        match &mut self.destination {
            Destination::Course { categories, category, courses, course, days, day } => {
                if !categories.iter().any(|n| n.id == id) {
                    return Err(ResolverError::UnknownOption);
                }
                *category = Some(id);
                *courses = loaded;
                *course = None;
                days.clear();
                *day = None;
                Ok(())
            }
            _ => Err(ResolverError::UnknownOption),
        }
    }

    pub fn choose_course(&mut self, id: Uuid) -> Result<(), ResolverError> {
        let loaded = self.catalog.days(id, self.published_only)?;
        match &mut self.destination {
            Destination::Course { courses, course, days, day, .. } => {
                if !courses.iter().any(|n| n.id == id) {
                    return Err(ResolverError::UnknownOption);
                }
                *course = Some(id);
                *days = loaded;
                *day = None;
                Ok(())
            }
            _ => Err(ResolverError::UnknownOption),
        }
    }

    pub fn choose_day(&mut self, id: Uuid) -> Result<(), ResolverError> {
        match &mut self.destination {
            Destination::Course { days, day, .. } => {
                if !days.iter().any(|n| n.id == id) {
                    return Err(ResolverError::UnknownOption);
                }
                *day = Some(id);
                Ok(())
            }
            _ => Err(ResolverError::UnknownOption),
        }
    }

    // -- Step 2: roadmap side --

    pub fn tracks(&self) -> &[CatalogNode] {
        match &self.destination {
            Destination::Roadmap { tracks, .. } => tracks,
            _ => &[],
        }
    }

    pub fn topics(&self) -> &[CatalogNode] {
        match &self.destination {
            Destination::Roadmap { topics, .. } => topics,
            _ => &[],
        }
    }

    pub fn choose_track(&mut self, id: Uuid) -> Result<(), ResolverError> {
        let loaded = self.catalog.topics(id, self.published_only)?;
        match &mut self.destination {
            Destination::Roadmap { tracks, track, topics, topic } => {
                if !tracks.iter().any(|n| n.id == id) {
                    return Err(ResolverError::UnknownOption);
                }
                *track = Some(id);
                *topics = loaded;
                *topic = None;
                Ok(())
            }
            _ => Err(ResolverError::UnknownOption),
        }
    }

    pub fn choose_topic(&mut self, id: Uuid) -> Result<(), ResolverError> {
        match &mut self.destination {
            Destination::Roadmap { topics, topic, .. } => {
                if !topics.iter().any(|n| n.id == id) {
                    return Err(ResolverError::UnknownOption);
                }
                *topic = Some(id);
                Ok(())
            }
            _ => Err(ResolverError::UnknownOption),
        }
    }

    // -- Step 3 --

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Edit the url in place. The detector is re-run on the new value and a
    /// stale manual override is dropped with it.
    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
        self.detected = lantern_detect::detect(url);
        self.manual_type = None;
    }

    /// Manual type selection, required when the detector yields nothing.
    pub fn override_type(&mut self, resource_type: ResourceType) {
        self.manual_type = Some(resource_type);
    }

    pub fn preview(&self) -> Preview {
        Preview {
            title: self.title.clone(),
            url: self.url.clone(),
            resource_type: self.resource_type(),
            destination: self.destination_path(),
        }
    }

    fn destination_path(&self) -> Vec<String> {
        fn label(nodes: &[CatalogNode], id: Option<Uuid>) -> Option<String> {
            let id = id?;
            nodes.iter().find(|n| n.id == id).map(|n| n.title.clone())
        }
        match &self.destination {
            Destination::Unset => Vec::new(),
            Destination::Course { categories, category, courses, course, days, day } => [
                label(categories, *category),
                label(courses, *course),
                label(days, *day),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Destination::Roadmap { tracks, track, topics, topic } => {
                [label(tracks, *track), label(topics, *topic)]
                    .into_iter()
                    .flatten()
                    .collect()
            }
        }
    }

    pub fn can_confirm(&self) -> bool {
        self.leaf().is_some()
            && !self.title.trim().is_empty()
            && !self.url.trim().is_empty()
            && self.resource_type().is_some()
    }

    /// Produce the conversion order. Every confirmation gate is re-checked
    /// here so a caller bypassing `can_confirm` still cannot build an
    /// invalid request.
    pub fn finish(&self) -> Result<ConvertRequest, ResolverError> {
        let target = self.leaf().ok_or(ResolverError::MissingDestination)?;
        if self.title.trim().is_empty() {
            return Err(ResolverError::MissingTitle);
        }
        if self.url.trim().is_empty() {
            return Err(ResolverError::MissingUrl);
        }
        let resource_type = self.resource_type().ok_or(ResolverError::UnknownResourceType)?;
        Ok(ConvertRequest {
            submission_id: self.submission_id,
            title: self.title.trim().to_string(),
            url: self.url.trim().to_string(),
            resource_type,
            target,
        })
    }
}
