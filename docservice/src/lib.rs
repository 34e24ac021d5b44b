//! A generic data-access layer over JSON document databases.
//!
//! This crate is the entry point of the docservice project. It re-exports the core
//! types from `docservice-core` and the available storage backends.
//!
//! One generic [`DocumentService`](service::DocumentService) serves every document type:
//! typed lookup, insert, replace and delete, filtered listing with ordering, and
//! offset-based pagination with exact total counts. Responses can be mapped into
//! caller-defined shapes, and a helper derives the next human-facing sequence number
//! of a collection.
//!
//! # Quick Start
//!
//! ```ignore
//! use docservice::{memory::InMemoryStore, prelude::*};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! pub struct Ticket {
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     pub id: Option<DocumentId>,
//!     pub ticket_no: i64,
//!     pub title: String,
//!     #[serde(flatten)]
//!     pub audit: AuditTrail,
//! }
//!
//! impl Document for Ticket {
//!     fn id(&self) -> Option<&DocumentId> { self.id.as_ref() }
//!     fn set_id(&mut self, id: DocumentId) { self.id = Some(id); }
//!     fn collection_name() -> &'static str { "tickets" }
//!     fn mark_modified(&mut self, at: DateTime<Utc>) { self.audit.touch(at); }
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocumentServiceResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::new());
//!     let tickets = store.service::<Ticket>();
//!     let cancel = CancellationToken::new();
//!
//!     let next = tickets.next_sequence_number("ticketNo", &cancel).await?;
//!     tickets
//!         .insert(
//!             Ticket { id: None, ticket_no: next, title: "Printer jam".into(), audit: AuditTrail::created_by("ana") },
//!             &cancel,
//!         )
//!         .await?;
//!
//!     let page = tickets
//!         .list_page(PaginationRequest::default(), Filter::all(), OrderQuery::Desc, Some("ticketNo"), &cancel)
//!         .await?;
//!     println!("{} of {} tickets", page.data.len(), page.total_rows);
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `mongodb` - MongoDB backend (requires the `mongodb` feature)

pub mod prelude;

pub use docservice_core::{
    CancellationToken, backend, document, error, mapper, page, query, sequence, service, store,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docservice_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docservice_mongodb::{MongoDbConfig, MongoDbStore, MongoDbStoreBuilder};
}
