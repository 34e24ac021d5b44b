//! Pagination request and response types.
//!
//! [`PaginationRequest`] is the caller's page selection (1-indexed page, page size and a
//! status flag). [`PaginationResponse`] echoes the request and adds the exact total row
//! count, the derived page count and the page's data. Both serialize with camelCase
//! field names (`pageSize`, `totalPages`, `totalRows`).

use serde::{Deserialize, Serialize};

use crate::{
    document::STATUS_FIELD,
    error::{DocumentServiceError, DocumentServiceResult},
    query::{Expr, Filter},
};

/// Default number of documents per page.
pub const DEFAULT_PAGE_SIZE: u64 = 24;

/// Returns `ceil(total_rows / page_size)` in exact integer arithmetic.
///
/// A page size of zero yields zero pages; the service rejects such requests before
/// this is reached.
pub fn total_pages(total_rows: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }

    total_rows.div_ceil(page_size)
}

/// Page selection supplied by the caller.
///
/// Construction performs no validation; the defaults are always valid. Overrides are
/// checked by [`PaginationRequest::validate`] when the request reaches the service.
///
/// # Example
///
/// ```ignore
/// use docservice::page::PaginationRequest;
///
/// let request = PaginationRequest::new(3, 20);
/// assert_eq!(request.offset().unwrap(), 40);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationRequest {
    /// Number of documents per page.
    pub page_size: u64,
    /// The page number (1-indexed).
    pub page: u64,
    /// Status the caller wants to list (`true` for active records).
    pub status: bool,
}

impl PaginationRequest {
    /// Creates a request for `page` with `page_size` documents per page.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size, ..Self::default() }
    }

    pub fn builder() -> PaginationRequestBuilder {
        PaginationRequestBuilder::new()
    }

    /// Checks that both the page and the page size are positive.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentServiceError::InvalidPagination`] for a zero page, a zero page
    /// size, or a window offset that does not fit in 64 bits.
    pub fn validate(&self) -> DocumentServiceResult<()> {
        if self.page_size == 0 {
            return Err(DocumentServiceError::InvalidPagination(
                "page size must be greater than zero".to_string(),
            ));
        }
        if self.page == 0 {
            return Err(DocumentServiceError::InvalidPagination(
                "page must be at least 1".to_string(),
            ));
        }

        self.offset().map(|_| ())
    }

    /// Number of documents to skip before this page's window.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentServiceError::InvalidPagination`] on a zero page or overflow.
    pub fn offset(&self) -> DocumentServiceResult<u64> {
        self.page
            .checked_sub(1)
            .and_then(|previous| previous.checked_mul(self.page_size))
            .ok_or_else(|| {
                DocumentServiceError::InvalidPagination(format!(
                    "page {} with page size {} is out of range",
                    self.page, self.page_size
                ))
            })
    }

    /// Filter selecting documents whose status flag equals this request's status.
    pub fn status_filter(&self) -> Expr {
        Filter::eq(STATUS_FIELD, self.status)
    }
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, page: 1, status: true }
    }
}

/// Builder for [`PaginationRequest`]; unset values take the defaults
/// (page 1, page size 24, status `true`).
#[derive(Debug, Default)]
pub struct PaginationRequestBuilder {
    page: Option<u64>,
    page_size: Option<u64>,
    status: Option<bool>,
}

impl PaginationRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_status(mut self, status: bool) -> Self {
        self.status = Some(status);
        self
    }

    pub fn build(self) -> PaginationRequest {
        let defaults = PaginationRequest::default();

        PaginationRequest {
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            status: self.status.unwrap_or(defaults.status),
        }
    }
}

/// One page of results together with the aggregate counts of the whole listing.
///
/// `total_rows` and `data` come from two independent reads issued concurrently; under
/// concurrent writers they may reflect slightly different snapshots of the collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse<T> {
    pub page_size: u64,
    pub page: u64,
    pub status: bool,
    /// `ceil(total_rows / page_size)`, zero when there are no rows.
    pub total_pages: u64,
    /// Exact number of documents matching the filter.
    pub total_rows: u64,
    /// The page window; empty for pages past the end.
    pub data: Vec<T>,
}

impl<T> PaginationResponse<T> {
    pub fn builder(request: PaginationRequest) -> PaginationResponseBuilder<T> {
        PaginationResponseBuilder::new(request)
    }

    /// Returns `true` if pages follow this one.
    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }

    /// Returns `true` if this is not the first page.
    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    /// Converts the page's data while keeping the counts.
    pub fn map_data<R>(self, f: impl FnOnce(Vec<T>) -> Vec<R>) -> PaginationResponse<R> {
        PaginationResponse {
            page_size: self.page_size,
            page: self.page,
            status: self.status,
            total_pages: self.total_pages,
            total_rows: self.total_rows,
            data: f(self.data),
        }
    }
}

/// Assembles a [`PaginationResponse`] from its request; the page count is derived
/// from the total row count at build time.
pub struct PaginationResponseBuilder<T> {
    request: PaginationRequest,
    total_rows: u64,
    data: Vec<T>,
}

impl<T> PaginationResponseBuilder<T> {
    pub fn new(request: PaginationRequest) -> Self {
        Self { request, total_rows: 0, data: Vec::new() }
    }

    pub fn with_total_rows(mut self, total_rows: u64) -> Self {
        self.total_rows = total_rows;
        self
    }

    pub fn with_data(mut self, data: Vec<T>) -> Self {
        self.data = data;
        self
    }

    pub fn build(self) -> PaginationResponse<T> {
        PaginationResponse {
            page_size: self.request.page_size,
            page: self.request.page,
            status: self.request.status,
            total_pages: total_pages(self.total_rows, self.request.page_size),
            total_rows: self.total_rows,
            data: self.data,
        }
    }
}
