//! In-memory storage backend for docservice.
//!
//! A thread-safe implementation of [`StoreBackend`](docservice_core::backend::StoreBackend)
//! for development, tests and small deployments. Filters are evaluated in process,
//! sorting follows BSON type order and store-assigned identities are fresh ObjectIds.
//!
//! # Quick Start
//!
//! ```ignore
//! use docservice::{memory::InMemoryStore, prelude::*};
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let tickets = store.service::<Ticket>();
//!
//! let ticket = tickets.insert(Ticket::new(1, "Printer jam"), &CancellationToken::new()).await?;
//! assert!(ticket.id().is_some());
//! ```

#[allow(unused_extern_crates)]
extern crate self as docservice_memory;

mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
