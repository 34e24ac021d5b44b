//! Query translation from filter expressions to MongoDB query syntax.

use bson::{Bson, Document, doc};

use docservice_core::{
    document::ID_FIELD,
    error::DocumentServiceError,
    query::{Expr, FieldOp, QueryVisitor, Sort, SortDirection},
};

use crate::convert::{native_field, native_id_value};

/// Translates filter expressions into MongoDB filter documents.
///
/// The identity field is rewritten to `_id` with ObjectId values. String operators
/// are case-sensitive, matching the in-memory evaluator.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Translates an optional filter; `None` and the match-all filter become `{}`.
    pub(crate) fn translate(expr: Option<&Expr>) -> Result<Document, DocumentServiceError> {
        match expr {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }
}

/// Builds the sort document for a list of sort keys, preserving key order.
pub(crate) fn sort_document(sorts: &[Sort]) -> Document {
    sorts
        .iter()
        .map(|sort| {
            let direction = match sort.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            };
            (native_field(&sort.field).to_string(), Bson::Int32(direction))
        })
        .collect()
}

/// Builds an inclusion projection. `_id` is always returned by the server.
pub(crate) fn projection_document(fields: &[String]) -> Document {
    fields
        .iter()
        .map(|field| (native_field(field).to_string(), Bson::Int32(1)))
        .collect()
}

fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentServiceError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(doc! {});
        }

        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        // $not is only valid on field operators.
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            native_field(field): { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let value = if field == ID_FIELD {
            native_id_value(value)
        } else {
            value.clone()
        };

        let condition = match op {
            FieldOp::Eq => doc! { "$eq": value },
            FieldOp::Ne => doc! { "$ne": value },
            FieldOp::Gt => doc! { "$gt": value },
            FieldOp::Gte => doc! { "$gte": value },
            FieldOp::Lt => doc! { "$lt": value },
            FieldOp::Lte => doc! { "$lte": value },
            FieldOp::Contains => match value {
                Bson::String(s) => doc! { "$regex": escape_regex(&s) },
                other => doc! { "$elemMatch": { "$eq": other } },
            },
            FieldOp::NotContains => match value {
                Bson::String(s) => doc! { "$not": { "$regex": escape_regex(&s) } },
                other => doc! { "$not": { "$elemMatch": { "$eq": other } } },
            },
            FieldOp::StartsWith => match value {
                Bson::String(s) => doc! { "$regex": format!("^{}", escape_regex(&s)) },
                _ => {
                    return Err(DocumentServiceError::Storage(
                        "StartsWith operator requires a string value".to_string(),
                    ));
                }
            },
            FieldOp::EndsWith => match value {
                Bson::String(s) => doc! { "$regex": format!("{}$", escape_regex(&s)) },
                _ => {
                    return Err(DocumentServiceError::Storage(
                        "EndsWith operator requires a string value".to_string(),
                    ));
                }
            },
            FieldOp::AnyOf => match value {
                Bson::Array(values) => doc! { "$in": values },
                other => doc! { "$in": [other] },
            },
            FieldOp::NoneOf => match value {
                Bson::Array(values) => doc! { "$nin": values },
                other => doc! { "$nin": [other] },
            },
        };

        Ok(doc! { native_field(field): condition })
    }
}
