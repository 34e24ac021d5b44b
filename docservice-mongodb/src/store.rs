use async_trait::async_trait;
use bson::{Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions},
};
use tracing::{debug, info};

use docservice_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::DocumentId,
    error::{DocumentServiceError, DocumentServiceResult},
    query::{Expr, Query},
};

use crate::{
    config::MongoDbConfig,
    convert::{MONGO_ID_FIELD, document_id, native_id, prepare_document, restore_document},
    query::{MongoQueryTranslator, projection_document, sort_document},
};

const DUPLICATE_KEY: i32 = 11000;

fn storage_error(error: MongoError) -> DocumentServiceError {
    DocumentServiceError::Storage(error.to_string())
}

fn is_duplicate_key(error: &MongoError) -> bool {
    matches!(
        &*error.kind,
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    fn id_filter(id: &DocumentId) -> Document {
        doc! { MONGO_ID_FIELD: native_id(id) }
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_document(&self, document: bson::Bson, collection: &str) -> DocumentServiceResult<DocumentId> {
        let prepared = prepare_document(document, None)?;
        let supplied_id = prepared.get(MONGO_ID_FIELD).and_then(document_id);

        let result = self
            .get_collection(collection)
            .insert_one(prepared)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    DocumentServiceError::DocumentAlreadyExists(
                        supplied_id
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_default(),
                        collection.to_string(),
                    )
                } else {
                    storage_error(e)
                }
            })?;

        document_id(&result.inserted_id).ok_or_else(|| {
            DocumentServiceError::Storage(format!(
                "unsupported inserted id {} in collection {collection}",
                result.inserted_id
            ))
        })
    }

    async fn replace_document(
        &self,
        id: &DocumentId,
        document: bson::Bson,
        collection: &str,
    ) -> DocumentServiceResult<bool> {
        let replacement = prepare_document(document, Some(id))?;

        let previous = self
            .get_collection(collection)
            .find_one_and_replace(Self::id_filter(id), replacement)
            .await
            .map_err(storage_error)?;

        Ok(previous.is_some())
    }

    async fn delete_document(&self, id: &DocumentId, collection: &str) -> DocumentServiceResult<bool> {
        let previous = self
            .get_collection(collection)
            .find_one_and_delete(Self::id_filter(id))
            .await
            .map_err(storage_error)?;

        Ok(previous.is_some())
    }

    async fn find_documents(&self, query: Query, collection: &str) -> DocumentServiceResult<Vec<bson::Bson>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(skip) = query.offset {
            options.skip = Some(skip);
        }
        if !query.sort.is_empty() {
            options.sort = Some(sort_document(&query.sort));
        }
        if let Some(fields) = &query.projection {
            options.projection = Some(projection_document(fields));
        }

        let filter = MongoQueryTranslator::translate(query.filter.as_ref())?;

        Ok(
            self.get_collection(collection)
                .find(filter)
                .with_options(options)
                .await
                .map_err(storage_error)?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(storage_error)?
                .into_iter()
                .map(restore_document)
                .collect()
        )
    }

    async fn count_documents(&self, filter: Option<Expr>, collection: &str) -> DocumentServiceResult<u64> {
        let filter = MongoQueryTranslator::translate(filter.as_ref())?;

        self.get_collection(collection)
            .count_documents(filter)
            .await
            .map_err(storage_error)
    }

    async fn shutdown(self) -> DocumentServiceResult<()> {
        self.client.shutdown().await;
        debug!(database = %self.database, "mongodb client shut down");

        Ok(())
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }

    /// Creates a builder from deserialized settings.
    pub fn from_config(config: &MongoDbConfig) -> Self {
        Self::new(&config.connection_string, &config.database)
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentServiceResult<Self::Backend> {
        if self.database.trim().is_empty() {
            return Err(DocumentServiceError::Initialization(
                "database name must not be empty".to_string(),
            ));
        }

        let client = Client::with_options(
            ClientOptions::parse(&self.dsn)
                .await
                .map_err(|e| DocumentServiceError::Initialization(e.to_string()))?,
        )
        .map_err(|e| DocumentServiceError::Initialization(e.to_string()))?;

        info!(database = %self.database, "mongodb store ready");

        Ok(MongoDbStore::new(client, self.database))
    }
}
