//! Filter evaluation and ordering for in-memory documents.
//!
//! Filters are evaluated by walking the expression tree with a [`QueryVisitor`].
//! Sorting follows BSON type order: missing and null values sort before booleans,
//! numbers, strings and dates, so a descending sort puts documents lacking the field
//! last.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime};

use docservice_core::{
    error::{DocumentServiceError, DocumentServiceResult},
    query::{Expr, FieldOp, QueryVisitor, Sort, SortDirection},
};

/// Comparable view of a BSON value. Integers and doubles compare as `f64`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            // Remaining BSON types carry no ordering we filter or sort on.
            _ => Comparable::Null,
        }
    }
}

impl Comparable<'_> {
    /// Position of this value's type in the cross-type sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::Bool(_) => 5,
            Comparable::DateTime(_) => 6,
        }
    }

    /// Total order used for sorting. NaN sorts below every other number.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        if let (Comparable::Number(a), Comparable::Number(b)) = (self, other) {
            return match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            };
        }

        self.partial_cmp(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Compares two stored documents by a list of sort keys.
pub(crate) fn compare_documents(left: &Bson, right: &Bson, sorts: &[Sort]) -> Ordering {
    for sort in sorts {
        let a = field_of(left, &sort.field);
        let b = field_of(right, &sort.field);

        let ordering = match sort.direction {
            SortDirection::Asc => a.sort_cmp(&b),
            SortDirection::Desc => b.sort_cmp(&a),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

fn field_of<'a>(document: &'a Bson, field: &str) -> Comparable<'a> {
    document
        .as_document()
        .and_then(|doc| doc.get(field))
        .map(Comparable::from)
        .unwrap_or(Comparable::Null)
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Bson) -> DocumentServiceResult<Self> {
        document
            .as_document()
            .map(|document| Self { document })
            .ok_or_else(|| {
                DocumentServiceError::InvalidDocument("stored value is not a document".to_string())
            })
    }

    /// Returns `true` if `document` satisfies `expr`.
    pub fn matches(document: &'a Bson, expr: &Expr) -> DocumentServiceResult<bool> {
        Self::new(document)?.visit_expr(expr)
    }
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = DocumentServiceError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(self.document.contains_key(field) == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = self.document.get(field) else {
            // Missing fields only satisfy the negative operators.
            return Ok(matches!(op, FieldOp::Ne | FieldOp::NotContains | FieldOp::NoneOf));
        };

        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        Ok(match op {
            FieldOp::Eq => left == right,
            FieldOp::Ne => left != right,
            FieldOp::Gt => left.partial_cmp(&right) == Some(Ordering::Greater),
            FieldOp::Gte => matches!(left.partial_cmp(&right), Some(Ordering::Greater | Ordering::Equal)),
            FieldOp::Lt => left.partial_cmp(&right) == Some(Ordering::Less),
            FieldOp::Lte => matches!(left.partial_cmp(&right), Some(Ordering::Less | Ordering::Equal)),
            FieldOp::Contains => contains(&left, &right),
            FieldOp::NotContains => !contains(&left, &right),
            FieldOp::StartsWith => match (&left, &right) {
                (Comparable::String(l), Comparable::String(r)) => l.starts_with(r),
                _ => false,
            },
            FieldOp::EndsWith => match (&left, &right) {
                (Comparable::String(l), Comparable::String(r)) => l.ends_with(r),
                _ => false,
            },
            FieldOp::AnyOf => any_of(&left, &right),
            FieldOp::NoneOf => !any_of(&left, &right),
        })
    }
}

fn contains(left: &Comparable<'_>, right: &Comparable<'_>) -> bool {
    match (left, right) {
        (Comparable::Array(items), value) => items.iter().any(|item| item == value),
        (Comparable::String(l), Comparable::String(r)) => l.contains(r),
        _ => false,
    }
}

fn any_of(left: &Comparable<'_>, right: &Comparable<'_>) -> bool {
    match (left, right) {
        (Comparable::Array(items), Comparable::Array(values)) => {
            values.iter().any(|value| items.contains(value))
        }
        (Comparable::Array(items), value) => items.contains(value),
        (value, Comparable::Array(values)) => values.contains(value),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docservice_core::query::Filter;

    fn ticket(no: i32, status: bool) -> Bson {
        Bson::Document(doc! { "ticketNo": no, "status": status, "tags": ["a", "b"], "title": "Printer jam" })
    }

    #[test]
    fn comparison_and_logical_operators() {
        let doc = ticket(5, true);

        assert!(DocumentEvaluator::matches(&doc, &Filter::eq("ticketNo", 5)).unwrap());
        assert!(DocumentEvaluator::matches(&doc, &Filter::gte("ticketNo", 5i64)).unwrap());
        assert!(!DocumentEvaluator::matches(&doc, &Filter::gt("ticketNo", 5.0)).unwrap());
        assert!(DocumentEvaluator::matches(
            &doc,
            &Filter::eq("status", true).and(Filter::lt("ticketNo", 10))
        )
        .unwrap());
        assert!(DocumentEvaluator::matches(&doc, &Filter::eq("status", false).not()).unwrap());
        assert!(DocumentEvaluator::matches(&doc, &Filter::all()).unwrap());
    }

    #[test]
    fn string_and_array_operators() {
        let doc = ticket(1, true);

        assert!(DocumentEvaluator::matches(&doc, &Filter::contains("title", "jam")).unwrap());
        assert!(DocumentEvaluator::matches(&doc, &Filter::starts_with("title", "Printer")).unwrap());
        assert!(DocumentEvaluator::matches(&doc, &Filter::contains("tags", "a")).unwrap());
        assert!(DocumentEvaluator::matches(&doc, &Filter::any_of("tags", vec!["z", "b"])).unwrap());
        assert!(DocumentEvaluator::matches(&doc, &Filter::none_of("ticketNo", vec![2, 3])).unwrap());
    }

    #[test]
    fn missing_fields() {
        let doc = ticket(1, true);

        assert!(!DocumentEvaluator::matches(&doc, &Filter::eq("owner", "ana")).unwrap());
        assert!(DocumentEvaluator::matches(&doc, &Filter::ne("owner", "ana")).unwrap());
        assert!(DocumentEvaluator::matches(&doc, &Filter::not_exists("owner")).unwrap());
        assert!(DocumentEvaluator::matches(&doc, &Filter::exists("title")).unwrap());
    }

    #[test]
    fn non_documents_are_rejected() {
        let err = DocumentEvaluator::matches(&Bson::Int32(1), &Filter::all()).unwrap_err();
        assert!(matches!(err, DocumentServiceError::InvalidDocument(_)));
    }

    #[test]
    fn missing_values_sort_first_ascending_and_last_descending() {
        let with = Bson::Document(doc! { "n": 3 });
        let without = Bson::Document(doc! { "other": 1 });

        let asc = [Sort::new("n", SortDirection::Asc)];
        let desc = [Sort::new("n", SortDirection::Desc)];

        assert_eq!(compare_documents(&without, &with, &asc), Ordering::Less);
        assert_eq!(compare_documents(&without, &with, &desc), Ordering::Greater);
    }

    #[test]
    fn nan_sorts_below_every_number() {
        let mut docs: Vec<Bson> = [3.0, f64::NAN, -1.0, f64::NAN, 2.0, f64::NEG_INFINITY]
            .into_iter()
            .map(|n| Bson::Document(doc! { "n": n }))
            .collect();
        docs.push(Bson::Document(doc! { "other": 1 }));

        let asc = [Sort::new("n", SortDirection::Asc)];
        docs.sort_by(|a, b| compare_documents(a, b, &asc));

        let values: Vec<Option<f64>> = docs
            .iter()
            .map(|doc| doc.as_document().unwrap().get_f64("n").ok())
            .collect();

        assert_eq!(values[0], None);
        assert!(values[1].unwrap().is_nan());
        assert!(values[2].unwrap().is_nan());
        assert_eq!(&values[3..], &[Some(f64::NEG_INFINITY), Some(-1.0), Some(2.0), Some(3.0)]);

        let nan = Comparable::Number(f64::NAN);
        let one = Comparable::Number(1.0);
        assert_eq!(nan.sort_cmp(&one), Ordering::Less);
        assert_eq!(one.sort_cmp(&nan), Ordering::Greater);
        assert_eq!(nan.sort_cmp(&Comparable::Number(f64::NAN)), Ordering::Equal);
    }

    #[test]
    fn later_keys_break_ties() {
        let a = Bson::Document(doc! { "n": 1, "id": "a" });
        let b = Bson::Document(doc! { "n": 1, "id": "b" });
        let sorts = [Sort::new("n", SortDirection::Desc), Sort::new("id", SortDirection::Desc)];

        assert_eq!(compare_documents(&a, &b, &sorts), Ordering::Greater);
        assert_eq!(compare_documents(&a, &a, &sorts), Ordering::Equal);
    }
}
