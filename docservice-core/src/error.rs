//! Error types and result types for document service operations.
//!
//! Every fallible operation returns [`DocumentServiceResult<T>`]. Errors raised by the
//! storage backend are propagated unchanged; the service never retries.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document service.
#[derive(Error, Debug)]
pub enum DocumentServiceError {
    /// Serialization/deserialization error when converting between documents and BSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The underlying storage operation failed (connectivity, write conflict, ...).
    #[error("Storage error: {0}")]
    Storage(String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The targeted document does not exist in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// The document has an invalid structure for the requested operation.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The ordering is unrecognized or was requested without a sort field.
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    /// The page number or page size is not positive.
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),
    /// The operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,
}

impl DocumentServiceError {
    /// Returns `true` if the error originated in the storage backend.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            DocumentServiceError::Storage(_) | DocumentServiceError::DocumentAlreadyExists(..)
        )
    }
}

/// A specialized `Result` type for document service operations.
pub type DocumentServiceResult<T> = Result<T, DocumentServiceError>;

impl From<BsonError> for DocumentServiceError {
    fn from(err: BsonError) -> Self {
        DocumentServiceError::Serialization(err.to_string())
    }
}
