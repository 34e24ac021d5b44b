//! Convenient re-exports of commonly used types from docservice.
//!
//! ```ignore
//! use docservice::prelude::*;
//! ```

pub use chrono::{DateTime, Utc};

pub use docservice_core::{
    CancellationToken,
    backend::{StoreBackend, StoreBackendBuilder},
    document::{AuditTrail, Document, DocumentExt, DocumentId, Timestamps, ID_FIELD, STATUS_FIELD},
    error::{DocumentServiceError, DocumentServiceResult},
    mapper::{FnMapper, IntoMapper, Mapper, map_with},
    page::{PaginationRequest, PaginationRequestBuilder, PaginationResponse, DEFAULT_PAGE_SIZE},
    query::{Expr, FieldOp, Filter, OrderQuery, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    service::DocumentService,
    store::DocumentStore,
};
