//! Core traits and types for document representation and serialization.
//!
//! Every stored entity implements [`Document`]: it carries a store-assigned identity,
//! names its collection, and exposes the audit field that the service overwrites on
//! every replace. [`Timestamps`] and [`AuditTrail`] are ready-made audit shapes that can
//! be flattened into a document struct.

use std::fmt;

use bson::{Bson, de::deserialize_from_bson, oid::ObjectId, ser::serialize_to_bson};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{DocumentServiceError, DocumentServiceResult};

/// Field name under which every document serializes its identity.
pub const ID_FIELD: &str = "id";

/// Field name of the soft-status flag carried by [`AuditTrail`].
pub const STATUS_FIELD: &str = "status";

/// Identity of a stored document.
///
/// This is the string form of the store's internal identifier. Ids assigned by the
/// store are the 24 hex characters of a BSON ObjectId. An id never changes once assigned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh ObjectId-backed identifier.
    pub fn generate() -> Self {
        Self(ObjectId::new().to_hex())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier as an ObjectId if it is one.
    pub fn as_object_id(&self) -> Option<ObjectId> {
        ObjectId::parse_str(&self.0).ok()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<ObjectId> for DocumentId {
    fn from(id: ObjectId) -> Self {
        Self(id.to_hex())
    }
}

impl From<DocumentId> for Bson {
    fn from(id: DocumentId) -> Self {
        Bson::String(id.0)
    }
}

/// Core trait that all documents handled by a document service must implement.
///
/// The identity must serialize under [`ID_FIELD`] and should be skipped when absent so
/// that the store can assign one on insert.
///
/// # Example
///
/// ```ignore
/// use docservice::document::{AuditTrail, Document, DocumentId};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// pub struct Ticket {
///     #[serde(default, skip_serializing_if = "Option::is_none")]
///     pub id: Option<DocumentId>,
///     pub ticket_no: i64,
///     #[serde(flatten)]
///     pub audit: AuditTrail,
/// }
///
/// impl Document for Ticket {
///     fn id(&self) -> Option<&DocumentId> { self.id.as_ref() }
///     fn set_id(&mut self, id: DocumentId) { self.id = Some(id); }
///     fn collection_name() -> &'static str { "tickets" }
///     fn mark_modified(&mut self, at: chrono::DateTime<chrono::Utc>) { self.audit.touch(at); }
///     fn status(&self) -> Option<bool> { Some(self.audit.status) }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Returns this document's identity, or `None` if it has not been stored yet.
    fn id(&self) -> Option<&DocumentId>;

    /// Stores the identity assigned by the backend.
    fn set_id(&mut self, id: DocumentId);

    /// Returns the name of the collection this document type is stored in.
    fn collection_name() -> &'static str;

    /// Overwrites the audit "last modified" timestamp.
    fn mark_modified(&mut self, at: DateTime<Utc>);

    /// Returns the soft-status flag, if this document type has one.
    fn status(&self) -> Option<bool> {
        None
    }
}

/// Extension trait providing BSON conversions for documents.
///
/// Automatically implemented for all types that implement [`Document`].
pub trait DocumentExt: Document {
    /// Converts this document to a BSON document for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the document does not serialize to a map.
    fn to_bson(&self) -> DocumentServiceResult<Bson>;

    /// Creates a document from a stored BSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_bson(bson: Bson) -> DocumentServiceResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_bson(&self) -> DocumentServiceResult<Bson> {
        match serialize_to_bson(self)? {
            bson @ Bson::Document(_) => Ok(bson),
            other => Err(DocumentServiceError::InvalidDocument(format!(
                "{} serialized to {:?} instead of a document",
                D::collection_name(),
                other.element_type()
            ))),
        }
    }

    fn from_bson(bson: Bson) -> DocumentServiceResult<Self> {
        Ok(deserialize_from_bson(bson)?)
    }
}

/// Creation and last-update timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    pub created_date: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Timestamps {
    /// Creates timestamps with both fields set to the current UTC time.
    pub fn now() -> Self {
        let now = Utc::now();
        Self { created_date: now, last_update: now }
    }

    /// Overwrites `last_update`.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_update = at;
    }
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::now()
    }
}

/// Audit trail with author fields and a soft-status flag.
///
/// `status` defaults to `true` (active) and both dates default to the current UTC time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    #[serde(default = "Utc::now")]
    pub modified_date: DateTime<Utc>,
    #[serde(default = "active")]
    pub status: bool,
}

fn active() -> bool {
    true
}

impl AuditTrail {
    /// Creates an audit trail authored by `user`.
    pub fn created_by(user: impl Into<String>) -> Self {
        Self { created_by: Some(user.into()), ..Self::default() }
    }

    /// Overwrites `modified_date`.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.modified_date = at;
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            created_by: None,
            created_date: now,
            modified_by: None,
            modified_date: now,
            status: true,
        }
    }
}
