//! Filters, ordering and query construction.
//!
//! A filter is an opaque predicate ([`Expr`]) built by the caller with [`Filter`] and
//! handed to the service as-is. Backends interpret it through [`QueryVisitor`].
//! [`OrderQuery`] is the caller-facing ordering choice; the service resolves it into
//! [`Sort`] keys before any storage call is made.
//!
//! ```ignore
//! use docservice::query::{Filter, OrderQuery, Query, SortDirection};
//!
//! let filter = Filter::eq("status", true).and(Filter::gte("ticketNo", 10));
//! let query = Query::builder()
//!     .filter(filter)
//!     .sort("ticketNo", SortDirection::Desc)
//!     .offset(20)
//!     .limit(10)
//!     .build();
//! ```

use std::{fmt, str::FromStr};

use bson::Bson;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    document::{DocumentId, ID_FIELD},
    error::{DocumentServiceError, DocumentServiceResult},
};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// A single sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self { field: field.into(), direction }
    }
}

/// Caller-facing ordering of a listing.
///
/// `Asc` and `Desc` require a sort field; `None` leaves the store's natural order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderQuery {
    #[default]
    None,
    Asc,
    Desc,
}

impl OrderQuery {
    /// Resolves this ordering against a sort field into concrete sort keys.
    ///
    /// The primary key is followed by a tie-break on the document id in the same
    /// direction so that consecutive page windows never overlap or skip documents
    /// that share a sort value. `None` ignores the field entirely.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentServiceError::InvalidOrder`] if a direction is requested
    /// without a non-blank sort field.
    pub fn sort_by(self, sort_field: Option<&str>) -> DocumentServiceResult<Vec<Sort>> {
        let direction = match self {
            OrderQuery::None => return Ok(Vec::new()),
            OrderQuery::Asc => SortDirection::Asc,
            OrderQuery::Desc => SortDirection::Desc,
        };

        let field = match sort_field.map(str::trim) {
            Some(field) if !field.is_empty() => field,
            _ => {
                return Err(DocumentServiceError::InvalidOrder(format!(
                    "{} ordering requires a sort field",
                    self
                )));
            }
        };

        let mut sorts = vec![Sort::new(field, direction)];
        if field != ID_FIELD {
            sorts.push(Sort::new(ID_FIELD, direction));
        }

        Ok(sorts)
    }
}

impl fmt::Display for OrderQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderQuery::None => "none",
            OrderQuery::Asc => "asc",
            OrderQuery::Desc => "desc",
        })
    }
}

impl FromStr for OrderQuery {
    type Err = DocumentServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(OrderQuery::None),
            "asc" | "ascending" => Ok(OrderQuery::Asc),
            "desc" | "descending" => Ok(OrderQuery::Desc),
            _ => Err(DocumentServiceError::InvalidOrder(format!(
                "unrecognized order `{value}`"
            ))),
        }
    }
}

impl Serialize for OrderQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OrderQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone)]
pub enum FieldOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// String or array contains value.
    Contains,
    /// String or array does not contain value.
    NotContains,
    StartsWith,
    EndsWith,
    /// Field matches any of the values.
    AnyOf,
    /// Field matches none of the values.
    NoneOf,
}

/// A filter expression selecting a subset of documents.
///
/// An empty `And` matches every document.
#[derive(Debug, Clone)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// Checks if a field exists (`true`) or is missing (`false`).
    Exists(String, bool),
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// Appends to an existing AND instead of nesting.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    ///
    /// Appends to an existing OR instead of nesting.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression.
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Returns `true` if this expression matches every document.
    pub fn matches_all(&self) -> bool {
        matches!(self, Expr::And(list) if list.is_empty())
    }
}

/// Constructors for filter expressions.
///
/// ```ignore
/// let expr = Filter::eq("name", "Alice").and(Filter::gt("age", 18));
/// ```
pub struct Filter;

impl Filter {
    /// Matches every document.
    pub fn all() -> Expr {
        Expr::And(Vec::new())
    }

    /// Matches the document with the given identity.
    pub fn id(id: &DocumentId) -> Expr {
        Filter::eq(ID_FIELD, id)
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::StartsWith, value.into())
    }

    pub fn ends_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::EndsWith, value.into())
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Contains, value.into())
    }

    pub fn not_contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::NotContains, value.into())
    }

    /// Matches documents where the field is present.
    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    /// Matches documents where the field is missing.
    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }

    pub fn any_of(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::AnyOf, value.into())
    }

    pub fn none_of(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::NoneOf, value.into())
    }
}

/// A find operation: filter, sort keys, window and projection.
///
/// Sort keys apply in order; `offset` and `limit` are applied after sorting. A
/// projection keeps only the listed fields (plus the identity).
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Option<Expr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub sort: Vec<Sort>,
    pub projection: Option<Vec<String>>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter expression.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Sets the number of documents to skip.
    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Appends a sort key.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort.push(Sort::new(field, direction));
        self
    }

    /// Appends several sort keys.
    pub fn sorts(mut self, sorts: impl IntoIterator<Item = Sort>) -> Self {
        self.query.sort.extend(sorts);
        self
    }

    /// Restricts the returned fields.
    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentServiceError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}
