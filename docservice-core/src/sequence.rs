//! Human-facing sequence numbers derived from existing documents.
//!
//! The next number is read from the document holding the current maximum of a numeric
//! field. This is best-effort: the read and the caller's subsequent insert are not
//! atomic, so two concurrent callers can obtain the same number. Callers that need
//! strict uniqueness should back the field with a unique index and retry on conflict.

use bson::Bson;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    backend::StoreBackend,
    document::Document,
    error::{DocumentServiceError, DocumentServiceResult},
    query::{Query, SortDirection},
    service::{DocumentService, run_cancellable},
};

/// `-2^63` and `2^63` as doubles; integral doubles in `[I64_LOWER, I64_UPPER)` fit in `i64`.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Interprets a stored value as an integer sequence number.
///
/// Accepts 32/64-bit integers, doubles without a fractional part and strings holding
/// a decimal integer.
pub fn parse_sequence_value(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(n) if n.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(n) => Some(*n as i64),
        Bson::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl<D: Document, B: StoreBackend + ?Sized> DocumentService<D, B> {
    /// Returns one more than the largest value of `sort_field` in the collection.
    ///
    /// Returns `1` when the collection is empty or when the largest value is missing or
    /// not an integer.
    ///
    /// # Errors
    ///
    /// Fails with [`DocumentServiceError::InvalidOrder`] for a blank field name, and with
    /// [`DocumentServiceError::InvalidDocument`] when the largest value is already
    /// `i64::MAX`. Restarting at `1` there would hand out numbers that are already taken.
    pub async fn next_sequence_number(
        &self,
        sort_field: &str,
        cancel: &CancellationToken,
    ) -> DocumentServiceResult<i64> {
        let field = sort_field.trim();
        if field.is_empty() {
            return Err(DocumentServiceError::InvalidOrder(
                "sequence numbers require a sort field".to_string(),
            ));
        }

        let query = Query::builder()
            .sort(field, SortDirection::Desc)
            .project([field])
            .limit(1)
            .build();

        let latest = run_cancellable(
            cancel,
            self.backend().find_documents(query, self.collection()),
        )
        .await?;

        let Some(document) = latest.first() else {
            debug!(collection = %self.collection(), field, "empty collection, sequence starts at 1");
            return Ok(1);
        };

        let current = document
            .as_document()
            .and_then(|doc| doc.get(field))
            .and_then(parse_sequence_value);

        match current {
            Some(current) => current.checked_add(1).ok_or_else(|| {
                DocumentServiceError::InvalidDocument(format!(
                    "sequence field {field} in collection {} is at its maximum",
                    self.collection()
                ))
            }),
            None => {
                warn!(collection = %self.collection(), field, "latest sequence value is not an integer");
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_like_values_parse() {
        assert_eq!(parse_sequence_value(&Bson::Int32(12)), Some(12));
        assert_eq!(parse_sequence_value(&Bson::Int64(-4)), Some(-4));
        assert_eq!(parse_sequence_value(&Bson::Double(7.0)), Some(7));
        assert_eq!(parse_sequence_value(&Bson::String(" 42 ".into())), Some(42));
    }

    #[test]
    fn other_values_do_not_parse() {
        assert_eq!(parse_sequence_value(&Bson::Double(7.5)), None);
        assert_eq!(parse_sequence_value(&Bson::Double(f64::NAN)), None);
        assert_eq!(parse_sequence_value(&Bson::String("T-12".into())), None);
        assert_eq!(parse_sequence_value(&Bson::Boolean(true)), None);
        assert_eq!(parse_sequence_value(&Bson::Null), None);
    }

    #[test]
    fn doubles_outside_the_integer_range_do_not_parse() {
        assert_eq!(parse_sequence_value(&Bson::Double(I64_UPPER)), None);
        assert_eq!(parse_sequence_value(&Bson::Double(f64::INFINITY)), None);
        assert_eq!(parse_sequence_value(&Bson::Double(-1e19)), None);
        assert_eq!(parse_sequence_value(&Bson::Double(I64_LOWER)), Some(i64::MIN));
        assert_eq!(parse_sequence_value(&Bson::Double(9_007_199_254_740_992.0)), Some(9_007_199_254_740_992));
    }
}
