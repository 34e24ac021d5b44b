//! MongoDB backend implementation for docservice.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait,
//! delegating filtering, ordering, windowing and counting to the server.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docservice = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! Service documents keep their identity under `id`; the backend stores it as `_id`,
//! using native ObjectIds for ObjectId-shaped identities.
//!
//! # Example
//!
//! ```ignore
//! use docservice::{backend::StoreBackendBuilder, mongodb::{MongoDbConfig, MongoDbStoreBuilder}};
//!
//! let config: MongoDbConfig = serde_json::from_str(settings)?;
//! let store = MongoDbStoreBuilder::from_config(&config).build().await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docservice_mongodb;

pub mod config;
mod convert;
mod query;
pub mod store;

pub use config::MongoDbConfig;
pub use store::{MongoDbStore, MongoDbStoreBuilder};
