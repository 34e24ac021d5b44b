//! The generic query engine.
//!
//! [`DocumentService`] gives typed CRUD, filtered listing, ordering and offset-based
//! pagination for any [`Document`] type on top of a shared [`StoreBackend`] handle.
//!
//! Every operation takes a [`CancellationToken`]. If the token fires before the
//! operation completes, the operation fails with [`DocumentServiceError::Cancelled`]
//! and all of its in-flight storage calls are dropped; no partial result is returned.
//! A token that is already cancelled fails the operation before any storage call.
//!
//! # Consistency
//!
//! Paginated listings issue the window fetch and the total count concurrently. The
//! store gives no isolation between the two reads, so under concurrent writers
//! `total_rows` may be taken a moment before or after an insert or delete that the
//! fetched window does (or does not) reflect.
//!
//! # Example
//!
//! ```ignore
//! use docservice::prelude::*;
//!
//! let tickets = store.service::<Ticket>();
//! let page = tickets
//!     .list_page(
//!         PaginationRequest::new(2, 10),
//!         Filter::eq("status", true),
//!         OrderQuery::Desc,
//!         Some("ticketNo"),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! ```

use std::{fmt, future::Future, marker::PhantomData, sync::Arc};

use chrono::Utc;
use futures::future::try_join;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    backend::StoreBackend,
    document::{Document, DocumentExt, DocumentId},
    error::{DocumentServiceError, DocumentServiceResult},
    mapper::Mapper,
    page::{PaginationRequest, PaginationResponse},
    query::{Expr, Filter, OrderQuery, Query},
};

/// Runs `operation` unless `cancel` fires first.
///
/// The operation is dropped on cancellation, which drops every storage future it
/// was driving.
pub(crate) async fn run_cancellable<T, F>(
    cancel: &CancellationToken,
    operation: F,
) -> DocumentServiceResult<T>
where
    F: Future<Output = DocumentServiceResult<T>>,
{
    if cancel.is_cancelled() {
        return Err(DocumentServiceError::Cancelled);
    }

    tokio::select! {
        biased;

        () = cancel.cancelled() => Err(DocumentServiceError::Cancelled),
        result = operation => result,
    }
}

/// Typed data-access service for documents of type `D`.
///
/// Cheap to clone; clones share the backend handle.
pub struct DocumentService<D: Document, B: StoreBackend + ?Sized> {
    backend: Arc<B>,
    collection: String,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Document, B: StoreBackend + ?Sized> Clone for DocumentService<D, B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<D: Document, B: StoreBackend + ?Sized> fmt::Debug for DocumentService<D, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentService")
            .field("collection", &self.collection)
            .field("backend", &self.backend)
            .finish()
    }
}

impl<D: Document, B: StoreBackend + ?Sized> DocumentService<D, B> {
    /// Creates a service over `D::collection_name()`.
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_collection(backend, D::collection_name())
    }

    /// Creates a service over an explicitly named collection.
    pub fn with_collection(backend: Arc<B>, collection: impl Into<String>) -> Self {
        Self {
            backend,
            collection: collection.into(),
            _marker: PhantomData,
        }
    }

    /// Returns the name of the collection this service reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the shared backend handle.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Returns the first document matching `filter`, or `None` if nothing matches.
    pub async fn find_one(
        &self,
        filter: Expr,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<Option<D>> {
        debug!(collection = %self.collection, "find one");

        let query = Query::builder()
            .filter(filter)
            .limit(1)
            .build();

        let mut documents = run_cancellable(cancel, self.fetch(query)).await?;

        Ok(documents.pop())
    }

    /// Returns the document with the given identity, or `None` if it does not exist.
    pub async fn find_by_id(
        &self,
        id: &DocumentId,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<Option<D>> {
        self.find_one(Filter::id(id), cancel).await
    }

    /// Persists a new document as-is.
    ///
    /// If the document has no identity the store assigns one; the returned document
    /// carries the identity it was stored under.
    ///
    /// # Errors
    ///
    /// Fails with a storage error if the write fails, e.g.
    /// [`DocumentServiceError::DocumentAlreadyExists`] for a duplicate identity.
    pub async fn insert(
        &self,
        mut document: D,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<D> {
        let bson = document.to_bson()?;

        let id = run_cancellable(
            cancel,
            self.backend.insert_document(bson, &self.collection),
        )
        .await?;

        debug!(collection = %self.collection, id = %id, "document inserted");
        document.set_id(id);

        Ok(document)
    }

    /// Replaces the stored document that has `document`'s identity.
    ///
    /// The audit "last modified" timestamp is overwritten with the current UTC time
    /// before writing, whatever the caller supplied.
    ///
    /// # Errors
    ///
    /// Fails with [`DocumentServiceError::InvalidDocument`] if the document has no
    /// identity and with [`DocumentServiceError::DocumentNotFound`] if no stored
    /// document has it.
    pub async fn replace(
        &self,
        mut document: D,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<D> {
        let id = document.id().cloned().ok_or_else(|| {
            DocumentServiceError::InvalidDocument(format!(
                "cannot replace a document without an id in collection {}",
                self.collection
            ))
        })?;

        document.mark_modified(Utc::now());
        let bson = document.to_bson()?;

        let replaced = run_cancellable(
            cancel,
            self.backend.replace_document(&id, bson, &self.collection),
        )
        .await?;

        if !replaced {
            return Err(DocumentServiceError::DocumentNotFound(
                id.to_string(),
                self.collection.clone(),
            ));
        }

        debug!(collection = %self.collection, id = %id, "document replaced");

        Ok(document)
    }

    /// Deletes the document with the given identity. Deleting a missing document is a
    /// no-op.
    pub async fn delete_by_id(
        &self,
        id: &DocumentId,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<()> {
        let deleted = run_cancellable(
            cancel,
            self.backend.delete_document(id, &self.collection),
        )
        .await?;

        debug!(collection = %self.collection, id = %id, deleted, "delete by id");

        Ok(())
    }

    /// Computes the total row and page counts for `filter` without fetching data.
    ///
    /// The returned response has empty `data`.
    ///
    /// # Errors
    ///
    /// Fails with [`DocumentServiceError::InvalidPagination`] for a non-positive page or
    /// page size.
    pub async fn count_and_paginate(
        &self,
        request: PaginationRequest,
        filter: Expr,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<PaginationResponse<D>> {
        request.validate()?;

        let total_rows = run_cancellable(
            cancel,
            self.backend.count_documents(Some(filter), &self.collection),
        )
        .await?;

        debug!(collection = %self.collection, total_rows, "count and paginate");

        Ok(PaginationResponse::builder(request)
            .with_total_rows(total_rows)
            .build())
    }

    /// Returns one page of the documents matching `filter`.
    ///
    /// The page window is `skip = (page - 1) * page_size`, `limit = page_size`, taken
    /// after ordering. The window fetch and the exact count run concurrently; pages past
    /// the end yield empty data. See the module docs for the consistency caveat.
    ///
    /// # Errors
    ///
    /// Fails with [`DocumentServiceError::InvalidPagination`] or
    /// [`DocumentServiceError::InvalidOrder`] before touching the store.
    pub async fn list_page(
        &self,
        request: PaginationRequest,
        filter: Expr,
        order: OrderQuery,
        sort_field: Option<&str>,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<PaginationResponse<D>> {
        let (documents, total_rows) = self
            .fetch_window(&request, filter, order, sort_field, cancel)
            .await?;

        Ok(PaginationResponse::builder(request)
            .with_total_rows(total_rows)
            .with_data(documents)
            .build())
    }

    /// Like [`list_page`](Self::list_page), mapping the page's documents through
    /// `mapper` once both the fetch and the count have completed.
    pub async fn list_page_mapped<R, M>(
        &self,
        mapper: &M,
        request: PaginationRequest,
        filter: Expr,
        order: OrderQuery,
        sort_field: Option<&str>,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<PaginationResponse<R>>
    where
        M: Mapper<D, R> + ?Sized,
    {
        let (documents, total_rows) = self
            .fetch_window(&request, filter, order, sort_field, cancel)
            .await?;

        Ok(PaginationResponse::builder(request)
            .with_total_rows(total_rows)
            .with_data(mapper.map(documents))
            .build())
    }

    /// Returns every document in the collection in the requested order.
    pub async fn list_all(
        &self,
        order: OrderQuery,
        sort_field: Option<&str>,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<Vec<D>> {
        self.list_filtered(Filter::all(), order, sort_field, cancel).await
    }

    /// Returns every document matching `filter` in the requested order.
    pub async fn list_filtered(
        &self,
        filter: Expr,
        order: OrderQuery,
        sort_field: Option<&str>,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<Vec<D>> {
        let query = Query::builder()
            .filter(filter)
            .sorts(order.sort_by(sort_field)?)
            .build();

        debug!(collection = %self.collection, %order, "list filtered");

        run_cancellable(cancel, self.fetch(query)).await
    }

    /// Returns every document matching `filter`, mapped through `mapper`.
    pub async fn list_filtered_mapped<R, M>(
        &self,
        mapper: &M,
        filter: Expr,
        order: OrderQuery,
        sort_field: Option<&str>,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<Vec<R>>
    where
        M: Mapper<D, R> + ?Sized,
    {
        let documents = self
            .list_filtered(filter, order, sort_field, cancel)
            .await?;

        Ok(mapper.map(documents))
    }

    async fn fetch_window(
        &self,
        request: &PaginationRequest,
        filter: Expr,
        order: OrderQuery,
        sort_field: Option<&str>,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<(Vec<D>, u64)> {
        request.validate()?;
        let sorts = order.sort_by(sort_field)?;

        let query = Query::builder()
            .filter(filter.clone())
            .sorts(sorts)
            .offset(request.offset()?)
            .limit(request.page_size)
            .build();

        debug!(
            collection = %self.collection,
            page = request.page,
            page_size = request.page_size,
            %order,
            "list page"
        );

        let fetch = self.fetch(query);
        let count = self
            .backend
            .count_documents(Some(filter), &self.collection);

        run_cancellable(cancel, try_join(fetch, count)).await
    }

    async fn fetch(&self, query: Query) -> DocumentServiceResult<Vec<D>> {
        self.backend
            .find_documents(query, &self.collection)
            .await?
            .into_iter()
            .map(D::from_bson)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn cancelled_tokens_never_poll_the_operation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let polled = AtomicBool::new(false);
        let result = run_cancellable(&cancel, async {
            polled.store(true, Ordering::SeqCst);
            Ok(1)
        })
        .await;

        assert!(matches!(result, Err(DocumentServiceError::Cancelled)));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn live_tokens_pass_results_through() {
        let cancel = CancellationToken::new();

        assert_eq!(run_cancellable(&cancel, async { Ok(7) }).await.unwrap(), 7);

        let err = run_cancellable::<(), _>(&cancel, async {
            Err(DocumentServiceError::Storage("down".to_string()))
        })
        .await
        .unwrap_err();
        assert!(err.is_storage());
    }
}
