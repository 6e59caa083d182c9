//! crates/learning_core/src/entities/mod.rs
//!
//! The entity adapter layer. Every persisted entity implements [`Entity`], and
//! [`DocumentAdapter`] turns that description into the uniform
//! create / find / find-and-update / save contract on top of a
//! [`DocumentStoreService`].

pub mod progress;
pub mod user;

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::ports::{
    Clock, Document, DocumentStoreService, PortError, PortResult, StoredDocument, WriteOutcome,
};

pub use progress::{ProgressDraft, ProgressFilter, ProgressPatch};
pub use user::{UserDraft, UserFilter, UserInsert, UserPatch, UserSet};

/// Name of the timestamp field bumped on every mutation.
const UPDATED_AT: &str = "updatedAt";

//=========================================================================================
// Entity description
//=========================================================================================

/// Describes how one entity type maps onto a document collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;

    /// Caller-supplied fields for a new document.
    type Draft: Send;
    /// The supported equality lookups.
    type Filter: Send + Sync;
    /// The allow-listed fields an update may touch.
    type Patch: Send + Sync;

    fn id(&self) -> &str;

    /// Merges `draft` over the entity's default template.
    fn build(id: String, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// The stored field and value a filter compares against.
    fn predicate(filter: &Self::Filter) -> PortResult<(&'static str, Value)>;

    /// The `$set` part of a patch as field paths.
    fn patch_fields(patch: &Self::Patch) -> PortResult<Document>;

    /// The document an upsert inserts when nothing matches `filter`.
    fn upsert_draft(filter: &Self::Filter, patch: &Self::Patch) -> Self::Draft;

    /// Fields written back by [`DocumentAdapter::save`].
    fn saved_fields(&self) -> PortResult<Document>;

    /// Strips fields that reads must not expose unless asked to.
    fn redact_secrets(&mut self) {}
}

/// Builds an equality predicate, rejecting blank values.
pub(crate) fn equality(field: &'static str, value: &str) -> PortResult<(&'static str, Value)> {
    if value.trim().is_empty() {
        return Err(PortError::InvalidPredicate(format!("empty value for `{}`", field)));
    }
    Ok((field, Value::String(value.to_string())))
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> PortResult<Value> {
    serde_json::to_value(value).map_err(|e| PortError::Malformed(e.to_string()))
}

//=========================================================================================
// Options and outcomes
//=========================================================================================

/// Options for reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Return secret fields (the password hash) as stored.
    pub include_secret: bool,
}

impl ReadOptions {
    pub fn with_secret() -> Self {
        Self { include_secret: true }
    }
}

/// Options for [`DocumentAdapter::find_one_and_update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    pub upsert: bool,
    /// Return the post-image instead of the pre-image.
    pub return_updated: bool,
    pub include_secret: bool,
}

impl UpdateOptions {
    fn read(&self) -> ReadOptions {
        ReadOptions {
            include_secret: self.include_secret,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome<E> {
    /// A document matched and was patched.
    Updated(E),
    /// Nothing matched and a new document was written.
    Inserted(E),
    /// Nothing matched and upsert was off.
    NotFound,
    /// Nothing matched, but the insert collided with a document written concurrently.
    AlreadyExists,
}

impl<E> UpsertOutcome<E> {
    pub fn into_document(self) -> Option<E> {
        match self {
            UpsertOutcome::Updated(e) | UpsertOutcome::Inserted(e) => Some(e),
            UpsertOutcome::NotFound | UpsertOutcome::AlreadyExists => None,
        }
    }
}

//=========================================================================================
// The Adapter
//=========================================================================================

pub struct DocumentAdapter<E> {
    store: Arc<dyn DocumentStoreService>,
    clock: Arc<dyn Clock>,
    entity: PhantomData<fn() -> E>,
}

impl<E> Clone for DocumentAdapter<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
            entity: PhantomData,
        }
    }
}

impl<E: Entity> DocumentAdapter<E> {
    pub fn new(store: Arc<dyn DocumentStoreService>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            entity: PhantomData,
        }
    }

    /// Writes a new document with a fresh identifier and both timestamps set to now.
    pub async fn create(&self, draft: E::Draft) -> PortResult<WriteOutcome<E>> {
        self.insert(draft, ReadOptions::default()).await
    }

    /// Returns the first document matching `filter`, or `None`.
    pub async fn find_one(
        &self,
        filter: &E::Filter,
        options: ReadOptions,
    ) -> PortResult<Option<E>> {
        let (field, value) = E::predicate(filter)?;
        let found = self.store.query(E::COLLECTION, field, &value, 1).await?;
        found.into_iter().next().map(|doc| decode(doc, options)).transpose()
    }

    pub async fn find_by_id(&self, id: &str, options: ReadOptions) -> PortResult<Option<E>> {
        let found = self.store.get(E::COLLECTION, id).await?;
        found.map(|doc| decode(doc, options)).transpose()
    }

    /// Patches the first document matching `filter`, inserting one when
    /// nothing matches and `options.upsert` is set.
    pub async fn find_one_and_update(
        &self,
        filter: &E::Filter,
        patch: &E::Patch,
        options: UpdateOptions,
    ) -> PortResult<UpsertOutcome<E>> {
        let (field, value) = E::predicate(filter)?;
        let existing = self.store.query(E::COLLECTION, field, &value, 1).await?;

        match existing.into_iter().next() {
            Some(doc) => {
                let id = doc.id.clone();
                let before: E = decode(doc, options.read())?;
                let after = self.patch(&id, patch, options.return_updated, options.read()).await?;
                Ok(UpsertOutcome::Updated(after.unwrap_or(before)))
            }
            None if options.upsert => {
                let draft = E::upsert_draft(filter, patch);
                Ok(match self.insert(draft, options.read()).await? {
                    WriteOutcome::Written(entity) => UpsertOutcome::Inserted(entity),
                    WriteOutcome::AlreadyExists => {
                        debug!(collection = E::COLLECTION, "upsert lost an insert race");
                        UpsertOutcome::AlreadyExists
                    }
                })
            }
            None => Ok(UpsertOutcome::NotFound),
        }
    }

    /// Patches the document stored under `id`. Never inserts.
    pub async fn find_by_id_and_update(
        &self,
        id: &str,
        patch: &E::Patch,
        return_updated: bool,
    ) -> PortResult<Option<E>> {
        let Some(before) = self.find_by_id(id, ReadOptions::default()).await? else {
            return Ok(None);
        };
        let after = self.patch(id, patch, return_updated, ReadOptions::default()).await?;
        Ok(Some(after.unwrap_or(before)))
    }

    /// Writes the entity's saved fields back over the stored document and returns
    /// the stored result.
    pub async fn save(&self, entity: &E) -> PortResult<E> {
        let mut fields = entity.saved_fields()?;
        fields.insert(UPDATED_AT.to_string(), to_json(&self.clock.now())?);
        self.store.update(E::COLLECTION, entity.id(), fields).await?;

        self.find_by_id(entity.id(), ReadOptions::default())
            .await?
            .ok_or_else(|| PortError::NotFound(format!("{} {}", E::COLLECTION, entity.id())))
    }

    async fn insert(&self, draft: E::Draft, options: ReadOptions) -> PortResult<WriteOutcome<E>> {
        let id = Uuid::new_v4().to_string();
        let mut entity = E::build(id.clone(), draft, self.clock.now());
        let body = match to_json(&entity)? {
            Value::Object(body) => body,
            _ => return Err(PortError::Malformed(format!("{} is not an object", E::COLLECTION))),
        };

        let outcome = self.store.put(E::COLLECTION, &id, body).await?;
        if !options.include_secret {
            entity.redact_secrets();
        }
        Ok(outcome.map(|()| entity))
    }

    /// Applies `patch` and, when asked, re-reads the post-image.
    async fn patch(
        &self,
        id: &str,
        patch: &E::Patch,
        return_updated: bool,
        options: ReadOptions,
    ) -> PortResult<Option<E>> {
        let mut fields = E::patch_fields(patch)?;
        fields.insert(UPDATED_AT.to_string(), to_json(&self.clock.now())?);
        self.store.update(E::COLLECTION, id, fields).await?;

        if !return_updated {
            return Ok(None);
        }
        self.find_by_id(id, options)
            .await?
            .map(Some)
            .ok_or_else(|| PortError::NotFound(format!("{} {}", E::COLLECTION, id)))
    }
}

/// Turns a stored document into an entity, annotating it with its key.
fn decode<E: Entity>(doc: StoredDocument, options: ReadOptions) -> PortResult<E> {
    let StoredDocument { id, mut body } = doc;
    body.insert("id".to_string(), Value::String(id));

    let mut entity: E = serde_json::from_value(Value::Object(body))
        .map_err(|e| PortError::Malformed(format!("{}: {}", E::COLLECTION, e)))?;
    if !options.include_secret {
        entity.redact_secrets();
    }
    Ok(entity)
}
