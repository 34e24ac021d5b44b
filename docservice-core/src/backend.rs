//! Storage backend abstraction.
//!
//! A [`StoreBackend`] is the live handle to a document store: it finds, counts,
//! inserts, replaces and deletes BSON documents in named collections. The service layer
//! is written against this trait only, so the same engine runs on the in-memory store
//! and on MongoDB.
//!
//! Backends must be safe to share across tasks; the service keeps a single
//! `Arc`-wrapped handle for all callers and performs no locking of its own.
//!
//! Documents cross this boundary as BSON maps whose identity lives under
//! [`ID_FIELD`](crate::document::ID_FIELD). Translating that field to the store's
//! native key is the backend's job.

use async_trait::async_trait;
use bson::Bson;
use std::fmt::Debug;

use crate::{
    document::DocumentId,
    error::DocumentServiceResult,
    query::{Expr, Query},
};

/// Abstract interface for document storage backends.
///
/// All methods are async and propagate backend failures as
/// [`DocumentServiceError::Storage`](crate::error::DocumentServiceError::Storage) (or a
/// more specific variant where noted). None of them retry.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a single document.
    ///
    /// If the document carries no identity the store assigns one. Returns the identity
    /// under which the document was stored.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentAlreadyExists`](crate::error::DocumentServiceError::DocumentAlreadyExists)
    /// if a document with the same identity is already stored.
    async fn insert_document(
        &self,
        document: Bson,
        collection: &str,
    ) -> DocumentServiceResult<DocumentId>;

    /// Replaces the document stored under `id` with `document`.
    ///
    /// Returns `false` (and writes nothing) when no document has that identity.
    async fn replace_document(
        &self,
        id: &DocumentId,
        document: Bson,
        collection: &str,
    ) -> DocumentServiceResult<bool>;

    /// Deletes the document stored under `id`.
    ///
    /// Returns `false` when no document has that identity.
    async fn delete_document(&self, id: &DocumentId, collection: &str) -> DocumentServiceResult<bool>;

    /// Finds documents matching the query, applying sort keys, offset, limit and
    /// projection in that order.
    ///
    /// A missing collection yields an empty result.
    async fn find_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentServiceResult<Vec<Bson>>;

    /// Counts the documents matching `filter` exactly (`None` counts everything).
    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentServiceResult<u64>;

    /// Releases backend resources. The default implementation does nothing.
    async fn shutdown(self) -> DocumentServiceResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory for backends that need async initialization.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentServiceResult<Self::Backend>;
}
