//! crates/learning_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core logic depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to stay independent of the concrete document database, hashing scheme or token format.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::OneTimeCode;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, hashing).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),
    #[error("Malformed document: {0}")]
    Malformed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Document store types
//=========================================================================================

/// A schemaless document body.
pub type Document = serde_json::Map<String, Value>;

/// A document together with the key it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub body: Document,
}

/// Result of a write that may be rejected by a uniqueness constraint.
///
/// A rejected write is an expected outcome of concurrent inserts, so it is
/// a value rather than a `PortError`.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<T = ()> {
    Written(T),
    AlreadyExists,
}

impl<T> WriteOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WriteOutcome<U> {
        match self {
            WriteOutcome::Written(value) => WriteOutcome::Written(f(value)),
            WriteOutcome::AlreadyExists => WriteOutcome::AlreadyExists,
        }
    }

    pub fn written(self) -> Option<T> {
        match self {
            WriteOutcome::Written(value) => Some(value),
            WriteOutcome::AlreadyExists => None,
        }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DocumentStoreService: Send + Sync {
    /// Direct keyed lookup.
    async fn get(&self, collection: &str, id: &str) -> PortResult<Option<StoredDocument>>;

    /// Equality query on one top-level field, in the store's own ordering.
    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> PortResult<Vec<StoredDocument>>;

    /// Writes the whole document under `id`, replacing any previous body.
    /// Returns `AlreadyExists` when another document holds the same value in a unique field.
    async fn put(&self, collection: &str, id: &str, body: Document) -> PortResult<WriteOutcome>;

    /// Sets the given fields on an existing document. Keys may be dotted paths
    /// (`preferences.language`); untouched fields keep their values.
    /// Fails with `PortError::NotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Document) -> PortResult<()>;
}

#[async_trait]
pub trait PasswordHashingService: Send + Sync {
    async fn hash(&self, plaintext: &str) -> PortResult<String>;
    async fn verify(&self, plaintext: &str, hash: &str) -> PortResult<bool>;
}

/// Issues and checks the session credential handed to clients after authentication.
pub trait CredentialService: Send + Sync {
    fn issue(&self, user_id: &str) -> PortResult<String>;
    /// Resolves a credential back to the user id it was issued for.
    fn verify(&self, token: &str) -> PortResult<String>;
}

/// Short-lived storage for one-time codes, keyed by mobile number.
#[async_trait]
pub trait OneTimeCodeService: Send + Sync {
    async fn store(&self, mobile: &str, code: OneTimeCode) -> PortResult<()>;
    async fn fetch(&self, mobile: &str) -> PortResult<Option<OneTimeCode>>;
    async fn discard(&self, mobile: &str) -> PortResult<()>;
    /// Counts a wrong guess against the current code and returns the running
    /// total. Storing a new code resets it; with no code stored it returns 0.
    async fn record_failure(&self, mobile: &str) -> PortResult<u32>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
