//! Tests for the generic entity adapter over the in-memory document store:
//! lookups, secret redaction, patching, upserts and saves.

mod common;

use std::sync::Arc;

use api_lib::adapters::MemoryDocumentStore;
use chrono::Duration;
use common::ManualClock;
use learning_core::entities::progress::{ProgressDraft, ProgressFilter, ProgressPatch, PROGRESS};
use learning_core::entities::user::{UserDraft, UserFilter, UserInsert, UserPatch, UserSet, USERS};
use learning_core::ports::{Clock, DocumentStoreService, PortError, WriteOutcome};
use learning_core::{
    DocumentAdapter, Language, LessonProgress, PreferencesPatch, Progress, ReadOptions,
    UpdateOptions, UpsertOutcome, User,
};

struct Fixture {
    store: Arc<MemoryDocumentStore>,
    clock: Arc<ManualClock>,
    users: DocumentAdapter<User>,
    progress: DocumentAdapter<Progress>,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryDocumentStore::with_app_indexes());
    let clock = Arc::new(ManualClock::new());
    Fixture {
        users: DocumentAdapter::new(store.clone(), clock.clone()),
        progress: DocumentAdapter::new(store.clone(), clock.clone()),
        store,
        clock,
    }
}

fn email_draft(email: &str) -> UserDraft {
    UserDraft {
        email: Some(email.to_string()),
        password_hash: Some("$argon2id$fake".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_fills_in_the_template() {
    let f = fixture();
    let user = f.users.create(email_draft("a@b.com")).await.unwrap().written().unwrap();

    assert!(!user.id.is_empty());
    assert_eq!(user.name_english, "Learner");
    assert_eq!(user.preferences.language, Language::English);
    assert!(user.preferences.notifications);
    assert!(user.preferences.voice_enabled);
    assert!(!user.preferences.onboarding_completed);
    assert_eq!(user.stats.total_sessions, 0);
    assert_eq!(user.created_at, f.clock.now());
    assert_eq!(user.updated_at, user.created_at);
    // The returned entity is redacted like any read.
    assert!(user.password_hash.is_none());
}

#[tokio::test]
async fn reads_redact_the_password_hash_unless_asked() {
    let f = fixture();
    let created = f.users.create(email_draft("a@b.com")).await.unwrap().written().unwrap();
    let filter = UserFilter::Email("a@b.com".to_string());

    let plain = f.users.find_one(&filter, ReadOptions::default()).await.unwrap().unwrap();
    assert!(plain.password_hash.is_none());

    let secret = f.users.find_one(&filter, ReadOptions::with_secret()).await.unwrap().unwrap();
    assert_eq!(secret.password_hash.as_deref(), Some("$argon2id$fake"));

    let by_id = f
        .users
        .find_by_id(&created.id, ReadOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_id.id, created.id);
    assert!(by_id.password_hash.is_none());
}

#[tokio::test]
async fn lookups_that_match_nothing_return_none() {
    let f = fixture();
    let missing = f
        .users
        .find_one(&UserFilter::Mobile("9999999999".to_string()), ReadOptions::default())
        .await
        .unwrap();
    assert!(missing.is_none());
    assert!(f.users.find_by_id("nope", ReadOptions::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn blank_filter_values_are_rejected() {
    let f = fixture();
    let err = f
        .users
        .find_one(&UserFilter::Email("  ".to_string()), ReadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::InvalidPredicate(_)));
}

#[tokio::test]
async fn a_second_user_with_the_same_email_is_refused() {
    let f = fixture();
    f.users.create(email_draft("a@b.com")).await.unwrap();
    let again = f.users.create(email_draft("a@b.com")).await.unwrap();

    assert!(matches!(again, WriteOutcome::AlreadyExists));
    assert_eq!(f.store.count(USERS).await, 1);
}

#[tokio::test]
async fn update_without_upsert_reports_not_found() {
    let f = fixture();
    let outcome = f
        .users
        .find_one_and_update(
            &UserFilter::Mobile("9999999999".to_string()),
            &UserPatch::last_login(f.clock.now()),
            UpdateOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(outcome, UpsertOutcome::NotFound);
    assert_eq!(f.store.count(USERS).await, 0);
}

#[tokio::test]
async fn upsert_inserts_with_set_on_insert_fields() {
    let f = fixture();
    let now = f.clock.now();
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
    let outcome = f
        .users
        .find_one_and_update(
            &UserFilter::Mobile("9999999999".to_string()),
            &patch,
            UpdateOptions {
                upsert: true,
                return_updated: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let UpsertOutcome::Inserted(user) = outcome else {
        panic!("expected an insert, got {:?}", outcome);
    };
    assert_eq!(user.mobile.as_deref(), Some("9999999999"));
    assert_eq!(user.join_date, now);
    assert_eq!(user.last_login, now);
    assert_eq!(f.store.count(USERS).await, 1);
}

#[tokio::test]
async fn update_returns_the_pre_or_post_image() {
    let f = fixture();
    let created = f.users.create(email_draft("a@b.com")).await.unwrap().written().unwrap();
    f.clock.advance(Duration::hours(1));
    let later = f.clock.now();
    let filter = UserFilter::Email("a@b.com".to_string());

    let before = f
        .users
        .find_one_and_update(&filter, &UserPatch::last_login(later), UpdateOptions::default())
        .await
        .unwrap()
        .into_document()
        .unwrap();
    assert_eq!(before.last_login, created.last_login);

    f.clock.advance(Duration::hours(1));
    let latest = f.clock.now();
    let after = f
        .users
        .find_one_and_update(
            &filter,
            &UserPatch::last_login(latest),
            UpdateOptions {
                return_updated: true,
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_document()
        .unwrap();
    assert_eq!(after.last_login, latest);
    assert_eq!(after.updated_at, latest);
    assert_eq!(after.created_at, created.created_at);
}

#[tokio::test]
async fn preference_patches_leave_other_fields_alone() {
    let f = fixture();
    let created = f.users.create(email_draft("a@b.com")).await.unwrap().written().unwrap();

    let patch = UserPatch::preferences(PreferencesPatch {
        language: Some(Language::Telugu),
        ..Default::default()
    });
    let updated = f
        .users
        .find_by_id_and_update(&created.id, &patch, true)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.preferences.language, Language::Telugu);
    assert!(updated.preferences.notifications);
    assert!(updated.preferences.voice_enabled);

    // The hash survives a patch even though reads never show it.
    let secret = f
        .users
        .find_by_id(&created.id, ReadOptions::with_secret())
        .await
        .unwrap()
        .unwrap();
    assert!(secret.password_hash.is_some());
}

#[tokio::test]
async fn find_by_id_and_update_never_inserts() {
    let f = fixture();
    let result = f
        .users
        .find_by_id_and_update("missing", &UserPatch::last_login(f.clock.now()), true)
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(f.store.count(USERS).await, 0);
}

#[tokio::test]
async fn save_writes_back_mutations_and_bumps_updated_at() {
    let f = fixture();
    let mut progress = f
        .progress
        .create(ProgressDraft::for_owner("u1"))
        .await
        .unwrap()
        .written()
        .unwrap();
    assert!(progress.lessons.is_empty());

    f.clock.advance(Duration::minutes(10));
    progress.badges.push("first-steps".to_string());
    let saved = f.progress.save(&progress).await.unwrap();

    assert_eq!(saved.badges, vec!["first-steps".to_string()]);
    assert_eq!(saved.user_id, "u1");
    assert_eq!(saved.updated_at, f.clock.now());
    assert!(saved.updated_at > saved.created_at);
}

#[tokio::test]
async fn progress_patches_replace_whole_collections() {
    let f = fixture();
    let created = f
        .progress
        .create(ProgressDraft::for_owner("u1"))
        .await
        .unwrap()
        .written()
        .unwrap();

    let lesson = LessonProgress {
        module_key: "numbers".to_string(),
        lesson_id: "l1".to_string(),
        completed: true,
        score: 90,
        attempts: 1,
        last_attempt_at: f.clock.now(),
    };
    let patch = ProgressPatch {
        lessons: Some(vec![lesson.clone()]),
        badges: None,
    };
    let updated = f
        .progress
        .find_one_and_update(
            &ProgressFilter::Owner("u1".to_string()),
            &patch,
            UpdateOptions {
                return_updated: true,
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_document()
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.lessons, vec![lesson]);
    assert!(updated.badges.is_empty());
    assert_eq!(f.store.count(PROGRESS).await, 1);
}

#[tokio::test]
async fn documents_written_by_hand_are_decoded_with_defaults() {
    let f = fixture();
    let body = serde_json::json!({
        "userId": "u9",
        "createdAt": "2024-06-01T12:00:00Z",
        "updatedAt": "2024-06-01T12:00:00Z"
    });
    let serde_json::Value::Object(body) = body else {
        unreachable!()
    };
    f.store.put(PROGRESS, "p9", body).await.unwrap();

    let found = f
        .progress
        .find_one(&ProgressFilter::Owner("u9".to_string()), ReadOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, "p9");
    assert!(found.lessons.is_empty());
    assert!(found.badges.is_empty());
}
