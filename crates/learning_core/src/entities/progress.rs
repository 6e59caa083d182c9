//! The `progress` collection.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{equality, to_json, Entity};
use crate::domain::{LessonProgress, Progress};
use crate::ports::{Document, PortResult};

pub const PROGRESS: &str = "progress";

#[derive(Debug, Clone, Default)]
pub struct ProgressDraft {
    pub user_id: String,
    pub lessons: Vec<LessonProgress>,
    pub badges: Vec<String>,
}

impl ProgressDraft {
    pub fn for_owner(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressFilter {
    Owner(String),
}

/// Whole-collection replacements. `None` leaves a collection alone.
#[derive(Debug, Clone, Default)]
pub struct ProgressPatch {
    pub lessons: Option<Vec<LessonProgress>>,
    pub badges: Option<Vec<String>>,
}

impl Entity for Progress {
    const COLLECTION: &'static str = PROGRESS;

    type Draft = ProgressDraft;
    type Filter = ProgressFilter;
    type Patch = ProgressPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn build(id: String, draft: ProgressDraft, now: DateTime<Utc>) -> Self {
        Progress {
            id,
            user_id: draft.user_id,
            lessons: draft.lessons,
            badges: draft.badges,
            created_at: now,
            updated_at: now,
        }
    }

    fn predicate(filter: &ProgressFilter) -> PortResult<(&'static str, Value)> {
        match filter {
            ProgressFilter::Owner(user_id) => equality("userId", user_id),
        }
    }

    fn patch_fields(patch: &ProgressPatch) -> PortResult<Document> {
        let mut fields = Document::new();
        if let Some(lessons) = &patch.lessons {
            fields.insert("lessons".to_string(), to_json(lessons)?);
        }
        if let Some(badges) = &patch.badges {
            fields.insert("badges".to_string(), to_json(badges)?);
        }
        Ok(fields)
    }

    fn upsert_draft(filter: &ProgressFilter, patch: &ProgressPatch) -> ProgressDraft {
        let ProgressFilter::Owner(user_id) = filter;
        ProgressDraft {
            user_id: user_id.clone(),
            lessons: patch.lessons.clone().unwrap_or_default(),
            badges: patch.badges.clone().unwrap_or_default(),
        }
    }

    fn saved_fields(&self) -> PortResult<Document> {
        let mut fields = Document::new();
        fields.insert("lessons".to_string(), to_json(&self.lessons)?);
        fields.insert("badges".to_string(), to_json(&self.badges)?);
        Ok(fields)
    }
}
