//! The long-lived store handle.
//!
//! [`DocumentStore`] owns the backend connection and hands out a
//! [`DocumentService`] per document type. All services created from one store share
//! the same backend handle.
//!
//! ```ignore
//! use docservice::{memory::InMemoryStore, store::DocumentStore};
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let tickets = store.service::<Ticket>();
//! let archived = store.service_in::<Ticket>("tickets_archive");
//! ```

use std::sync::Arc;

use tracing::warn;

use crate::{
    backend::StoreBackend,
    document::Document,
    error::DocumentServiceResult,
    service::DocumentService,
};

#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend + ?Sized> {
    backend: Arc<B>,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a store that owns `backend`.
    pub fn new(backend: B) -> Self {
        Self { backend: Arc::new(backend) }
    }

    /// Shuts the backend down.
    ///
    /// If services created from this store are still alive the backend stays
    /// in use and is left running.
    pub async fn shutdown(self) -> DocumentServiceResult<()> {
        match Arc::try_unwrap(self.backend) {
            Ok(backend) => backend.shutdown().await,
            Err(_) => {
                warn!("backend still shared by live services; skipping shutdown");
                Ok(())
            }
        }
    }
}

impl<B: StoreBackend + ?Sized> DocumentStore<B> {
    /// Creates a store over an already shared backend handle.
    pub fn from_shared(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Returns a service for `D` over the collection named by `D::collection_name()`.
    pub fn service<D: Document>(&self) -> DocumentService<D, B> {
        DocumentService::new(Arc::clone(&self.backend))
    }

    /// Returns a service for `D` over an explicitly named collection.
    pub fn service_in<D: Document>(&self, collection: &str) -> DocumentService<D, B> {
        DocumentService::with_collection(Arc::clone(&self.backend), collection)
    }

    /// Returns the shared backend handle.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}

impl<B: StoreBackend + ?Sized> Clone for DocumentStore<B> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend) }
    }
}
