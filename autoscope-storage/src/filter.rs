//! Filter expressions evaluated against stored records

use crate::record::Record;
use autoscope_core::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Filter operator for field comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equal to
    Eq,
    /// Not equal to
    Ne,
    /// Greater than
    Gt,
    /// Less than
    Lt,
    /// Greater than or equal
    Gte,
    /// Less than or equal
    Lte,
    /// Contains substring (strings) or element (lists)
    Contains,
    /// In list of values
    In,
}

/// One condition on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    /// Field to filter on
    pub field: String,
    /// Operator to apply
    pub operator: FilterOperator,
    /// Value to compare against
    pub value: Value,
}

impl FilterExpr {
    /// Create a new filter expression.
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// Create a membership filter.
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    /// Create a contains filter.
    pub fn contains(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Contains, value)
    }

    /// Evaluate against a record.
    pub fn matches(&self, record: &Record) -> bool {
        let actual = record.field(&self.field);
        match self.operator {
            FilterOperator::Eq => loose_eq(&actual, &self.value),
            FilterOperator::Ne => !loose_eq(&actual, &self.value),
            FilterOperator::Gt => compare(&actual, &self.value) == Some(Ordering::Greater),
            FilterOperator::Lt => compare(&actual, &self.value) == Some(Ordering::Less),
            FilterOperator::Gte => matches!(
                compare(&actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lte => matches!(
                compare(&actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Contains => match (&actual, &self.value) {
                (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
                (Value::Array(items), needle) => items.iter().any(|item| loose_eq(item, needle)),
                _ => false,
            },
            FilterOperator::In => match &self.value {
                Value::Array(candidates) => candidates.iter().any(|c| loose_eq(&actual, c)),
                _ => false,
            },
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Equality that treats `1` and `"1"` as the same value, the way a database
/// casts request strings to column types.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            match (as_number(a), as_number(b)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Bool(flag), Value::String(s)) | (Value::String(s), Value::Bool(flag)) => {
            s.trim() == flag.to_string()
        }
        _ => false,
    }
}

/// Ordering between two values: numeric when both read as numbers,
/// otherwise by string form. `null` sorts first.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => match (a, b) {
                (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
                (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
                _ => None,
            },
        },
    }
}
