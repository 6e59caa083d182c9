//! The `users` collection.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{equality, to_json, Entity};
use crate::domain::{Preferences, PreferencesPatch, Stats, User, DEFAULT_DISPLAY_NAME};
use crate::ports::{Document, PortResult};

pub const USERS: &str = "users";

/// Fields for a new user. Anything left `None` falls back to the template.
#[derive(Debug, Clone, Default)]
pub struct UserDraft {
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub name_english: Option<String>,
    pub profile_picture: Option<String>,
    pub join_date: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

/// The identifying attributes a user can be looked up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    Email(String),
    Mobile(String),
}

/// Fields applied to matched and inserted documents alike.
#[derive(Debug, Clone, Default)]
pub struct UserSet {
    pub last_login: Option<DateTime<Utc>>,
    pub preferences: PreferencesPatch,
}

/// Fields only written when an upsert inserts.
#[derive(Debug, Clone, Default)]
pub struct UserInsert {
    pub name_english: Option<String>,
    pub join_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub set: UserSet,
    pub set_on_insert: UserInsert,
}

impl UserPatch {
    pub fn last_login(at: DateTime<Utc>) -> Self {
        Self {
            set: UserSet {
                last_login: Some(at),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn preferences(patch: PreferencesPatch) -> Self {
        Self {
            set: UserSet {
                preferences: patch,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

impl Entity for User {
    const COLLECTION: &'static str = USERS;

    type Draft = UserDraft;
    type Filter = UserFilter;
    type Patch = UserPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn build(id: String, draft: UserDraft, now: DateTime<Utc>) -> Self {
        User {
            id,
            mobile: draft.mobile,
            email: draft.email,
            password_hash: draft.password_hash,
            name: draft.name,
            name_english: draft
                .name_english
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            profile_picture: draft.profile_picture,
            join_date: draft.join_date.unwrap_or(now),
            last_login: draft.last_login.unwrap_or(now),
            preferences: Preferences::default(),
            stats: Stats::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn predicate(filter: &UserFilter) -> PortResult<(&'static str, Value)> {
        match filter {
            UserFilter::Email(email) => equality("email", email),
            UserFilter::Mobile(mobile) => equality("mobile", mobile),
        }
    }

    fn patch_fields(patch: &UserPatch) -> PortResult<Document> {
        let mut fields = Document::new();
        if let Some(last_login) = &patch.set.last_login {
            fields.insert("lastLogin".to_string(), to_json(last_login)?);
        }

        let prefs = &patch.set.preferences;
        if let Some(language) = &prefs.language {
            fields.insert("preferences.language".to_string(), to_json(language)?);
        }
        if let Some(notifications) = prefs.notifications {
            fields.insert("preferences.notifications".to_string(), Value::Bool(notifications));
        }
        if let Some(voice_enabled) = prefs.voice_enabled {
            fields.insert("preferences.voiceEnabled".to_string(), Value::Bool(voice_enabled));
        }
        if let Some(onboarding_completed) = prefs.onboarding_completed {
            fields.insert(
                "preferences.onboardingCompleted".to_string(),
                Value::Bool(onboarding_completed),
            );
        }
        Ok(fields)
    }

    fn upsert_draft(filter: &UserFilter, patch: &UserPatch) -> UserDraft {
        let (mobile, email) = match filter {
            UserFilter::Mobile(mobile) => (Some(mobile.clone()), None),
            UserFilter::Email(email) => (None, Some(email.clone())),
        };
        UserDraft {
            mobile,
            email,
            name_english: patch.set_on_insert.name_english.clone(),
            join_date: patch.set_on_insert.join_date,
            last_login: patch.set.last_login,
            ..Default::default()
        }
    }

    fn saved_fields(&self) -> PortResult<Document> {
        let mut fields = Document::new();
        fields.insert("name".to_string(), to_json(&self.name)?);
        fields.insert("nameEnglish".to_string(), to_json(&self.name_english)?);
        fields.insert("profilePicture".to_string(), to_json(&self.profile_picture)?);
        fields.insert("lastLogin".to_string(), to_json(&self.last_login)?);
        fields.insert("preferences".to_string(), to_json(&self.preferences)?);
        Ok(fields)
    }

    fn redact_secrets(&mut self) {
        self.password_hash = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Language;
    use crate::ports::PortError;

    #[test]
    fn build_fills_template_defaults() {
        let now = Utc::now();
        let user = User::build(
            "u1".to_string(),
            UserDraft {
                email: Some("a@b.com".to_string()),
                ..Default::default()
            },
            now,
        );
        assert_eq!(user.name_english, DEFAULT_DISPLAY_NAME);
        assert_eq!(user.preferences, Preferences::default());
        assert_eq!(user.stats, Stats::default());
        assert_eq!(user.join_date, now);
        assert_eq!(user.created_at, user.updated_at);
        assert!(user.mobile.is_none());
    }

    #[test]
    fn blank_filter_is_an_invalid_predicate() {
        let err = User::predicate(&UserFilter::Mobile("  ".to_string())).unwrap_err();
        assert!(matches!(err, PortError::InvalidPredicate(_)));
    }

    #[test]
    fn patch_fields_only_carry_present_values() {
        let patch = UserPatch::preferences(PreferencesPatch {
            language: Some(Language::Telugu),
            voice_enabled: Some(false),
            ..Default::default()
        });
        let fields = User::patch_fields(&patch).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields["preferences.language"], "telugu");
        assert_eq!(fields["preferences.voiceEnabled"], false);
    }

    #[test]
    fn upsert_draft_takes_identity_from_the_filter() {
        let now = Utc::now();
        let patch = UserPatch {
            set: UserSet {
                last_login: Some(now),
                ..Default::default()
            },
            set_on_insert: UserInsert {
                name_english: Some("Learner".to_string()),
                join_date: Some(now),
            },
        };
        let draft = User::upsert_draft(&UserFilter::Mobile("9999999999".to_string()), &patch);

        assert_eq!(draft.mobile.as_deref(), Some("9999999999"));
        assert!(draft.email.is_none());
        assert_eq!(draft.join_date, Some(now));
        assert_eq!(draft.last_login, Some(now));
        assert!(draft.password_hash.is_none());
    }
}
