//! Core of the docservice project: a generic data-access layer over document databases.
//!
//! One generic [`DocumentService`](service::DocumentService) serves every document type
//! that implements [`Document`](document::Document), offering typed CRUD, filtered
//! listing, ordering and offset-based pagination with exact counts.
//!
//! - **Documents** ([`document`]) - The document contract, identities and audit shapes
//! - **Storage backends** ([`backend`]) - The trait every store implements
//! - **Queries** ([`query`]) - Filters, ordering and find operations
//! - **Pagination** ([`page`]) - Request and response types for page windows
//! - **Mapping** ([`mapper`]) - Conversion of documents into response shapes
//! - **Query engine** ([`service`]) - The generic service itself
//! - **Sequences** ([`sequence`]) - Next human-facing sequence number
//! - **Store handle** ([`store`]) - Shared backend handle handing out services
//! - **Errors** ([`error`])

#[allow(unused_extern_crates)]
extern crate self as docservice_core;

pub mod backend;
pub mod document;
pub mod error;
pub mod mapper;
pub mod page;
pub mod query;
pub mod sequence;
pub mod service;
pub mod store;

pub use tokio_util::sync::CancellationToken;
