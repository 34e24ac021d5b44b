//! In-memory storage implementation for document stores.
//!
//! Documents are kept as BSON maps in a `collection -> (id -> document)` map behind an
//! async-aware read-write lock. Each collection is a `BTreeMap` keyed by the id
//! string, so unordered listings come back in id order, which for store-assigned
//! ObjectIds is insertion order.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use bson::{Bson, Document};
use mea::rwlock::RwLock;
use tracing::trace;

use docservice_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{DocumentId, ID_FIELD},
    error::{DocumentServiceError, DocumentServiceResult},
    query::{Expr, Query},
};

use crate::evaluator::{DocumentEvaluator, compare_documents};

type CollectionMap = BTreeMap<String, Bson>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, so clones
/// share the same data. Queries scan the whole collection; there are no indexes.
///
/// # Example
///
/// ```ignore
/// use docservice_memory::InMemoryStore;
/// use docservice_core::backend::StoreBackend;
/// use bson::{Bson, doc};
///
/// let store = InMemoryStore::new();
/// let id = store
///     .insert_document(Bson::Document(doc! { "ticketNo": 1 }), "tickets")
///     .await?;
/// assert_eq!(store.count_documents(None, "tickets").await?, 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

fn into_map(document: Bson) -> DocumentServiceResult<Document> {
    match document {
        Bson::Document(doc) => Ok(doc),
        other => Err(DocumentServiceError::InvalidDocument(format!(
            "expected a document, got {:?}",
            other.element_type()
        ))),
    }
}

fn filter_documents<'a>(
    documents: impl Iterator<Item = &'a Bson>,
    filter: Option<&Expr>,
) -> DocumentServiceResult<Vec<&'a Bson>> {
    let mut matched = Vec::new();

    for document in documents {
        let keep = match filter {
            Some(expr) => DocumentEvaluator::matches(document, expr)?,
            None => true,
        };

        if keep {
            matched.push(document);
        }
    }

    Ok(matched)
}

fn project(document: &Bson, fields: &[String]) -> Bson {
    let Some(source) = document.as_document() else {
        return document.clone();
    };

    let mut projected = Document::new();

    if let Some(id) = source.get(ID_FIELD) {
        projected.insert(ID_FIELD, id.clone());
    }

    for field in fields {
        if let Some(value) = source.get(field) {
            projected.insert(field.clone(), value.clone());
        }
    }

    Bson::Document(projected)
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_document(&self, document: Bson, collection: &str) -> DocumentServiceResult<DocumentId> {
        let mut document = into_map(document)?;

        let id = match document.get(ID_FIELD) {
            Some(Bson::String(id)) => DocumentId::new(id.clone()),
            Some(Bson::ObjectId(oid)) => DocumentId::from(*oid),
            Some(Bson::Null) | None => DocumentId::generate(),
            Some(other) => {
                return Err(DocumentServiceError::InvalidDocument(format!(
                    "unsupported id value {other} in collection {collection}"
                )));
            }
        };
        document.insert(ID_FIELD, Bson::from(&id));

        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        if collection_map.contains_key(id.as_str()) {
            return Err(DocumentServiceError::DocumentAlreadyExists(
                id.to_string(),
                collection.to_string(),
            ));
        }

        collection_map.insert(id.to_string(), Bson::Document(document));
        trace!(collection, id = %id, "stored document");

        Ok(id)
    }

    async fn replace_document(
        &self,
        id: &DocumentId,
        document: Bson,
        collection: &str,
    ) -> DocumentServiceResult<bool> {
        let mut document = into_map(document)?;
        document.insert(ID_FIELD, Bson::from(id));

        let mut store = self.store.write().await;
        let Some(slot) = store
            .get_mut(collection)
            .and_then(|collection_map| collection_map.get_mut(id.as_str()))
        else {
            return Ok(false);
        };

        *slot = Bson::Document(document);

        Ok(true)
    }

    async fn delete_document(&self, id: &DocumentId, collection: &str) -> DocumentServiceResult<bool> {
        let mut store = self.store.write().await;

        Ok(store
            .get_mut(collection)
            .and_then(|collection_map| collection_map.remove(id.as_str()))
            .is_some())
    }

    async fn find_documents(&self, query: Query, collection: &str) -> DocumentServiceResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut matched = filter_documents(collection_map.values(), query.filter.as_ref())?;

        if !query.sort.is_empty() {
            // Stable, so equal keys keep id order.
            matched.sort_by(|a, b| compare_documents(a, b, &query.sort));
        }

        let offset = query
            .offset
            .map_or(0, |offset| usize::try_from(offset).unwrap_or(usize::MAX));
        let limit = query
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

        let window = matched
            .into_iter()
            .skip(offset)
            .take(limit);

        Ok(match &query.projection {
            Some(fields) => window.map(|doc| project(doc, fields)).collect(),
            None => window.cloned().collect(),
        })
    }

    async fn count_documents(&self, filter: Option<Expr>, collection: &str) -> DocumentServiceResult<u64> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(0);
        };

        let matched = filter_documents(collection_map.values(), filter.as_ref())?;

        Ok(matched.len() as u64)
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentServiceResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docservice_core::query::{Filter, SortDirection};

    async fn seeded(numbers: &[i32]) -> InMemoryStore {
        let store = InMemoryStore::new();

        for n in numbers {
            store
                .insert_document(Bson::Document(doc! { "ticketNo": *n, "open": n % 2 == 0 }), "tickets")
                .await
                .unwrap();
        }

        store
    }

    fn numbers(documents: &[Bson]) -> Vec<i32> {
        documents
            .iter()
            .map(|doc| doc.as_document().unwrap().get_i32("ticketNo").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn insert_assigns_object_id_and_keeps_supplied_ids() {
        let store = InMemoryStore::new();

        let generated = store
            .insert_document(Bson::Document(doc! { "title": "a" }), "tickets")
            .await
            .unwrap();
        assert!(generated.as_object_id().is_some());

        let supplied = store
            .insert_document(Bson::Document(doc! { "id": "T-1", "title": "b" }), "tickets")
            .await
            .unwrap();
        assert_eq!(supplied.as_str(), "T-1");

        let err = store
            .insert_document(Bson::Document(doc! { "id": "T-1" }), "tickets")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentServiceError::DocumentAlreadyExists(..)));
    }

    #[tokio::test]
    async fn replace_and_delete_report_absence() {
        let store = InMemoryStore::new();
        let missing = DocumentId::new("nope");

        assert!(!store.replace_document(&missing, Bson::Document(doc! {}), "tickets").await.unwrap());
        assert!(!store.delete_document(&missing, "tickets").await.unwrap());

        let id = store
            .insert_document(Bson::Document(doc! { "title": "a" }), "tickets")
            .await
            .unwrap();

        assert!(store.replace_document(&id, Bson::Document(doc! { "title": "b" }), "tickets").await.unwrap());
        let stored = store.find_documents(Query::default(), "tickets").await.unwrap();
        assert_eq!(stored[0].as_document().unwrap().get_str("title").unwrap(), "b");
        assert_eq!(stored[0].as_document().unwrap().get_str("id").unwrap(), id.as_str());

        assert!(store.delete_document(&id, "tickets").await.unwrap());
        assert!(!store.delete_document(&id, "tickets").await.unwrap());
    }

    #[tokio::test]
    async fn find_filters_sorts_and_windows() {
        let store = seeded(&[3, 1, 4, 1, 5, 9, 2, 6]).await;

        let query = Query::builder()
            .filter(Filter::gt("ticketNo", 1))
            .sort("ticketNo", SortDirection::Desc)
            .offset(1)
            .limit(3)
            .build();

        let found = store.find_documents(query, "tickets").await.unwrap();
        assert_eq!(numbers(&found), vec![6, 5, 4]);
    }

    #[tokio::test]
    async fn unsorted_find_follows_insertion_order() {
        let store = seeded(&[3, 1, 2]).await;

        let found = store.find_documents(Query::default(), "tickets").await.unwrap();
        assert_eq!(numbers(&found), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn projection_keeps_id_and_requested_fields() {
        let store = seeded(&[7]).await;

        let query = Query::builder().project(["ticketNo"]).build();
        let found = store.find_documents(query, "tickets").await.unwrap();
        let doc = found[0].as_document().unwrap();

        assert!(doc.contains_key("id"));
        assert!(doc.contains_key("ticketNo"));
        assert!(!doc.contains_key("open"));
    }

    #[tokio::test]
    async fn count_respects_filter_and_missing_collections() {
        let store = seeded(&[1, 2, 3, 4]).await;

        assert_eq!(store.count_documents(None, "tickets").await.unwrap(), 4);
        assert_eq!(store.count_documents(Some(Filter::eq("open", true)), "tickets").await.unwrap(), 2);
        assert_eq!(store.count_documents(Some(Filter::all()), "unknown").await.unwrap(), 0);
        assert!(store.find_documents(Query::default(), "unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_document_inserts_are_rejected() {
        let store = InMemoryStore::new();

        let err = store.insert_document(Bson::Int32(1), "tickets").await.unwrap_err();
        assert!(matches!(err, DocumentServiceError::InvalidDocument(_)));
    }
}
