//! services/api/src/adapters/db.rs
//!
//! This module contains the Postgres adapter, a concrete implementation of the
//! `DocumentStoreService` port from the `core` crate. Every collection lives in a
//! single `documents` table holding JSONB bodies; see `migrations/` for the
//! unique indexes that back the identity invariants.

use async_trait::async_trait;
use learning_core::document::apply_fields;
use learning_core::ports::{
    Document, DocumentStoreService, PortError, PortResult, StoredDocument, WriteOutcome,
};
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A document store backed by a Postgres JSONB table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a new `PgDocumentStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DocumentRecord {
    id: String,
    body: Json<Document>,
}
impl DocumentRecord {
    fn to_domain(self) -> StoredDocument {
        StoredDocument {
            id: self.id,
            body: self.body.0,
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `DocumentStoreService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStoreService for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> PortResult<Option<StoredDocument>> {
        let record = sqlx::query_as::<_, DocumentRecord>(
            "SELECT id, body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(DocumentRecord::to_domain))
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> PortResult<Vec<StoredDocument>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = sqlx::query_as::<_, DocumentRecord>(
            "SELECT id, body FROM documents \
             WHERE collection = $1 AND body -> $2 = $3 \
             ORDER BY inserted_at ASC, id ASC LIMIT $4",
        )
        .bind(collection)
        .bind(field)
        .bind(Json(value))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(DocumentRecord::to_domain).collect())
    }

    async fn put(&self, collection: &str, id: &str, body: Document) -> PortResult<WriteOutcome> {
        let result = sqlx::query(
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) DO UPDATE SET body = EXCLUDED.body",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(&body))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(WriteOutcome::Written(())),
            // The partial unique indexes on identifying fields reject duplicates here.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(WriteOutcome::AlreadyExists)
            }
            Err(e) => Err(unexpected(e)),
        }
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let record = sqlx::query_as::<_, DocumentRecord>(
            "SELECT id, body FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("{} {} not found", collection, id)))?;

        let mut body = record.body.0;
        apply_fields(&mut body, fields);

        sqlx::query("UPDATE documents SET body = $3 WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .bind(Json(&body))
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }
}
