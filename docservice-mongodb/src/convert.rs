//! Identity translation between service documents and MongoDB documents.
//!
//! Service documents carry their identity under [`ID_FIELD`]; MongoDB stores it under
//! `_id`. Identities that are ObjectId hex strings are stored as native ObjectIds so
//! store-assigned and caller-supplied ids look the same on disk. Any other string is
//! stored as-is.

use bson::{Bson, Document, oid::ObjectId};

use docservice_core::{
    document::{DocumentId, ID_FIELD},
    error::{DocumentServiceError, DocumentServiceResult},
};

pub(crate) const MONGO_ID_FIELD: &str = "_id";

/// Maps a service field name to the stored field name.
pub(crate) fn native_field(field: &str) -> &str {
    if field == ID_FIELD { MONGO_ID_FIELD } else { field }
}

/// Stored representation of an identity.
pub(crate) fn native_id(id: &DocumentId) -> Bson {
    match id.as_object_id() {
        Some(oid) => Bson::ObjectId(oid),
        None => Bson::String(id.to_string()),
    }
}

/// Converts a filter value compared against the identity field.
pub(crate) fn native_id_value(value: &Bson) -> Bson {
    match value {
        Bson::String(s) => match ObjectId::parse_str(s) {
            Ok(oid) => Bson::ObjectId(oid),
            Err(_) => value.clone(),
        },
        Bson::Array(items) => Bson::Array(items.iter().map(native_id_value).collect()),
        _ => value.clone(),
    }
}

/// Reads a stored `_id` back as an identity.
pub(crate) fn document_id(value: &Bson) -> Option<DocumentId> {
    match value {
        Bson::ObjectId(oid) => Some(DocumentId::from(*oid)),
        Bson::String(s) => Some(DocumentId::new(s.clone())),
        Bson::Int32(n) => Some(DocumentId::new(n.to_string())),
        Bson::Int64(n) => Some(DocumentId::new(n.to_string())),
        _ => None,
    }
}

/// Turns a service document into a stored document.
///
/// The `id` field is removed. If `id` is given it is written as `_id`; otherwise the
/// document's own `id` value (when present and not null) is used, and when neither
/// exists `_id` is left for MongoDB to assign.
pub(crate) fn prepare_document(document: Bson, id: Option<&DocumentId>) -> DocumentServiceResult<Document> {
    let Bson::Document(mut document) = document else {
        return Err(DocumentServiceError::InvalidDocument(
            "expected a document".to_string(),
        ));
    };

    let own_id = document.remove(ID_FIELD);

    let stored_id = match (id, own_id) {
        (Some(id), _) => Some(native_id(id)),
        (None, Some(Bson::Null)) | (None, None) => None,
        (None, Some(value)) => Some(native_id_value(&value)),
    };

    let mut prepared = Document::new();
    if let Some(stored_id) = stored_id {
        prepared.insert(MONGO_ID_FIELD, stored_id);
    }
    for (key, value) in document {
        prepared.insert(key, value);
    }

    Ok(prepared)
}

/// Turns a stored document back into a service document.
pub(crate) fn restore_document(mut document: Document) -> Bson {
    let mut restored = Document::new();

    if let Some(stored_id) = document.remove(MONGO_ID_FIELD) {
        let id = match document_id(&stored_id) {
            Some(id) => Bson::from(id),
            None => stored_id,
        };
        restored.insert(ID_FIELD, id);
    }
    for (key, value) in document {
        restored.insert(key, value);
    }

    Bson::Document(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn object_id_strings_become_native_ids() {
        let oid = ObjectId::new();
        let prepared = prepare_document(Bson::Document(doc! { "id": oid.to_hex(), "n": 1 }), None).unwrap();

        assert_eq!(prepared.get("_id"), Some(&Bson::ObjectId(oid)));
        assert!(!prepared.contains_key("id"));
        assert_eq!(prepared.get_i32("n").unwrap(), 1);
    }

    #[test]
    fn explicit_ids_win_and_plain_strings_stay_strings() {
        let prepared = prepare_document(
            Bson::Document(doc! { "id": "stale", "n": 1 }),
            Some(&DocumentId::new("T-1")),
        )
        .unwrap();

        assert_eq!(prepared.get_str("_id").unwrap(), "T-1");
    }

    #[test]
    fn missing_or_null_ids_are_left_to_the_server() {
        let prepared = prepare_document(Bson::Document(doc! { "id": Bson::Null, "n": 1 }), None).unwrap();
        assert!(!prepared.contains_key("_id"));

        let prepared = prepare_document(Bson::Document(doc! { "n": 1 }), None).unwrap();
        assert!(!prepared.contains_key("_id"));
    }

    #[test]
    fn restore_exposes_hex_ids() {
        let oid = ObjectId::new();
        let restored = restore_document(doc! { "_id": oid, "n": 1 });
        let restored = restored.as_document().unwrap();

        assert_eq!(restored.get_str("id").unwrap(), oid.to_hex());
        assert!(!restored.contains_key("_id"));
    }

    #[test]
    fn non_documents_are_rejected() {
        let err = prepare_document(Bson::Int32(3), None).unwrap_err();
        assert!(matches!(err, DocumentServiceError::InvalidDocument(_)));
    }

    #[test]
    fn field_names_map_only_the_identity() {
        assert_eq!(native_field("id"), "_id");
        assert_eq!(native_field("ticketNo"), "ticketNo");
    }
}
