//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DocumentStoreService` port. Used when no
//! database is configured and by the test suites. Unique fields are declared per
//! collection and enforced on `put`, mirroring the Postgres unique indexes.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use learning_core::document::{apply_fields, field_equals};
use learning_core::entities::{progress::PROGRESS, user::USERS};
use learning_core::ports::{
    Document, DocumentStoreService, PortError, PortResult, StoredDocument, WriteOutcome,
};
use serde_json::Value;
use tokio::sync::RwLock;

type Collection = BTreeMap<String, Document>;

/// Documents held in memory, ordered by id within each collection.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
    unique_fields: HashMap<String, Vec<String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with the same uniqueness rules as the production schema.
    pub fn with_app_indexes() -> Self {
        Self::new()
            .with_unique_field(USERS, "email")
            .with_unique_field(USERS, "mobile")
            .with_unique_field(PROGRESS, "userId")
    }

    /// Rejects a `put` whose non-null `field` value is already held by another
    /// document in `collection`.
    pub fn with_unique_field(mut self, collection: &str, field: &str) -> Self {
        self.unique_fields
            .entry(collection.to_string())
            .or_default()
            .push(field.to_string());
        self
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn violates_unique(
        &self,
        collection: &str,
        existing: &Collection,
        id: &str,
        body: &Document,
    ) -> bool {
        let Some(fields) = self.unique_fields.get(collection) else {
            return false;
        };
        fields.iter().any(|field| match body.get(field) {
            None | Some(Value::Null) => false,
            Some(value) => existing
                .iter()
                .any(|(other_id, other)| other_id != id && field_equals(other, field, value)),
        })
    }
}

#[async_trait]
impl DocumentStoreService for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> PortResult<Option<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|body| StoredDocument {
                id: id.to_string(),
                body: body.clone(),
            }))
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> PortResult<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, body)| field_equals(body, field, value))
            .take(limit)
            .map(|(id, body)| StoredDocument {
                id: id.clone(),
                body: body.clone(),
            })
            .collect())
    }

    async fn put(&self, collection: &str, id: &str, body: Document) -> PortResult<WriteOutcome> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if self.violates_unique(collection, docs, id, &body) {
            return Ok(WriteOutcome::AlreadyExists);
        }
        docs.insert(id.to_string(), body);
        Ok(WriteOutcome::Written(()))
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> PortResult<()> {
        let mut collections = self.collections.write().await;
        let body = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| PortError::NotFound(format!("{} {} not found", collection, id)))?;
        apply_fields(body, fields);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn unique_fields_reject_a_second_holder() {
        let store = MemoryDocumentStore::with_app_indexes();
        let first = store
            .put(USERS, "a", doc(json!({ "mobile": "9999999999", "email": null })))
            .await
            .unwrap();
        let second = store
            .put(USERS, "b", doc(json!({ "mobile": "9999999999", "email": null })))
            .await
            .unwrap();
        let no_mobile = store
            .put(USERS, "c", doc(json!({ "mobile": null, "email": "c@d.com" })))
            .await
            .unwrap();

        assert_eq!(first, WriteOutcome::Written(()));
        assert_eq!(second, WriteOutcome::AlreadyExists);
        assert_eq!(no_mobile, WriteOutcome::Written(()));
        assert_eq!(store.count(USERS).await, 2);
    }

    #[tokio::test]
    async fn rewriting_the_same_id_is_not_a_duplicate() {
        let store = MemoryDocumentStore::with_app_indexes();
        store.put(USERS, "a", doc(json!({ "email": "a@b.com" }))).await.unwrap();
        let again = store
            .put(USERS, "a", doc(json!({ "email": "a@b.com", "name": "A" })))
            .await
            .unwrap();
        assert_eq!(again, WriteOutcome::Written(()));
    }

    #[tokio::test]
    async fn update_of_a_missing_document_fails() {
        let store = MemoryDocumentStore::new();
        let err = store.update(PROGRESS, "nope", Document::new()).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn query_honours_the_limit() {
        let store = MemoryDocumentStore::new();
        for id in ["a", "b", "c"] {
            store.put(PROGRESS, id, doc(json!({ "userId": "u1" }))).await.unwrap();
        }
        let found = store.query(PROGRESS, "userId", &json!("u1"), 2).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "a");
    }
}
