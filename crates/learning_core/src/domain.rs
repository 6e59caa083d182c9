//! crates/learning_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! These records carry their document-store field names (camelCase) through serde,
//! but are otherwise independent of any particular database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name given to learners who never supplied one.
pub const DEFAULT_DISPLAY_NAME: &str = "Learner";

//=========================================================================================
// User
//=========================================================================================

/// Interface language chosen by the learner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Telugu,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub language: Language,
    pub notifications: bool,
    pub voice_enabled: bool,
    pub onboarding_completed: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: Language::English,
            notifications: true,
            voice_enabled: true,
            onboarding_completed: false,
        }
    }
}

/// The allow-listed preference fields a learner may change. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencesPatch {
    pub language: Option<Language>,
    pub notifications: Option<bool>,
    pub voice_enabled: Option<bool>,
    pub onboarding_completed: Option<bool>,
}

impl PreferencesPatch {
    pub fn is_empty(&self) -> bool {
        self.language.is_none()
            && self.notifications.is_none()
            && self.voice_enabled.is_none()
            && self.onboarding_completed.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_time_spent: u64,
    pub favorite_module: Option<String>,
}

/// One learner account as stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    // Only present for password accounts, and only when a read asked for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_display_name")]
    pub name_english: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    pub join_date: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub stats: Stats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_display_name() -> String {
    DEFAULT_DISPLAY_NAME.to_string()
}

/// The caller-facing user shape. It has no secret fields at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub mobile: Option<String>,
    pub name: Option<String>,
    pub name_english: String,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
    pub join_date: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub preferences: Preferences,
    pub stats: Stats,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            mobile: user.mobile,
            name: user.name,
            name_english: user.name_english,
            email: user.email,
            profile_picture: user.profile_picture,
            join_date: user.join_date,
            last_login: user.last_login,
            preferences: user.preferences,
            stats: user.stats,
        }
    }
}

//=========================================================================================
// Progress
//=========================================================================================

/// The learner's latest result for one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub module_key: String,
    pub lesson_id: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub attempts: u32,
    pub last_attempt_at: DateTime<Utc>,
}

/// A single lesson result submitted by a learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonSubmission {
    pub module_key: String,
    pub lesson_id: String,
    pub completed: bool,
    pub score: u32,
}

/// One learner's lesson history, stored in the `progress` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub lessons: Vec<LessonProgress>,
    #[serde(default)]
    pub badges: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    /// Records one attempt at a lesson, keyed by (module key, lesson id).
    ///
    /// A resubmission overwrites `completed` and `score` and bumps `attempts`;
    /// a first submission appends a record with `attempts = 1`.
    pub fn record_attempt(
        &mut self,
        submission: LessonSubmission,
        now: DateTime<Utc>,
    ) -> &LessonProgress {
        let existing = self.lessons.iter().position(|l| {
            l.module_key == submission.module_key && l.lesson_id == submission.lesson_id
        });

        let idx = match existing {
            Some(idx) => {
                let lesson = &mut self.lessons[idx];
                lesson.completed = submission.completed;
                lesson.score = submission.score;
                lesson.attempts = lesson.attempts.saturating_add(1);
                lesson.last_attempt_at = now;
                idx
            }
            None => {
                self.lessons.push(LessonProgress {
                    module_key: submission.module_key,
                    lesson_id: submission.lesson_id,
                    completed: submission.completed,
                    score: submission.score,
                    attempts: 1,
                    last_attempt_at: now,
                });
                self.lessons.len() - 1
            }
        };
        &self.lessons[idx]
    }

    pub fn lesson(&self, module_key: &str, lesson_id: &str) -> Option<&LessonProgress> {
        self.lessons
            .iter()
            .find(|l| l.module_key == module_key && l.lesson_id == lesson_id)
    }
}

/// What a progress read hands back: the stored document, or the empty shape for a
/// learner who has not submitted anything yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProgressView {
    Stored(Progress),
    Empty {
        lessons: Vec<LessonProgress>,
        badges: Vec<String>,
    },
}

impl ProgressView {
    pub fn empty() -> Self {
        ProgressView::Empty {
            lessons: Vec::new(),
            badges: Vec::new(),
        }
    }

    pub fn lessons(&self) -> &[LessonProgress] {
        match self {
            ProgressView::Stored(progress) => &progress.lessons,
            ProgressView::Empty { lessons, .. } => lessons,
        }
    }
}

//=========================================================================================
// One-time codes
//=========================================================================================

/// A short-lived numeric code proving control of a mobile number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl OneTimeCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn empty_progress(now: DateTime<Utc>) -> Progress {
        Progress {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            lessons: Vec::new(),
            badges: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn submission(
        module_key: &str,
        lesson_id: &str,
        completed: bool,
        score: u32,
    ) -> LessonSubmission {
        LessonSubmission {
            module_key: module_key.to_string(),
            lesson_id: lesson_id.to_string(),
            completed,
            score,
        }
    }

    #[test]
    fn resubmission_updates_the_same_record() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(3);
        let mut progress = empty_progress(t0);

        progress.record_attempt(submission("m1", "l1", false, 80), t0);
        let lesson = progress.record_attempt(submission("m1", "l1", true, 95), t1).clone();

        assert_eq!(progress.lessons.len(), 1);
        assert!(lesson.completed);
        assert_eq!(lesson.score, 95);
        assert_eq!(lesson.attempts, 2);
        assert_eq!(lesson.last_attempt_at, t1);
    }

    #[test]
    fn key_pair_must_match_exactly() {
        let now = Utc::now();
        let mut progress = empty_progress(now);

        progress.record_attempt(submission("m1", "l1", true, 50), now);
        progress.record_attempt(submission("m1", "l2", true, 60), now);
        progress.record_attempt(submission("m2", "l1", true, 70), now);

        assert_eq!(progress.lessons.len(), 3);
        assert!(progress.lessons.iter().all(|l| l.attempts == 1));
        assert_eq!(progress.lesson("m2", "l1").map(|l| l.score), Some(70));
    }

    #[test]
    fn preferences_patch_is_empty_only_without_fields() {
        let patch = PreferencesPatch {
            language: Some(Language::Telugu),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert!(PreferencesPatch::default().is_empty());
    }

    #[test]
    fn empty_progress_view_serializes_to_bare_collections() {
        let json = serde_json::to_value(ProgressView::empty()).unwrap();
        assert_eq!(json, serde_json::json!({ "lessons": [], "badges": [] }));
    }

    #[test]
    fn public_user_drops_the_password_hash() {
        let now = Utc::now();
        let user = User {
            id: "u1".to_string(),
            mobile: None,
            email: Some("a@b.com".to_string()),
            password_hash: Some("secret-hash".to_string()),
            name: None,
            name_english: DEFAULT_DISPLAY_NAME.to_string(),
            profile_picture: None,
            join_date: now,
            last_login: now,
            preferences: Preferences::default(),
            stats: Stats::default(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("passwordHash"));
    }

    #[test]
    fn code_expires_strictly_after_deadline() {
        let now = Utc::now();
        let code = OneTimeCode {
            code: "123456".to_string(),
            expires_at: now,
        };
        assert!(!code.is_expired(now));
        assert!(code.is_expired(now + Duration::seconds(1)));
    }
}
