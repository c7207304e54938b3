//! Record source types and traits
//!
//! Defines the contract a data layer must meet to be paginated.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, Ordering};

/// A single record that can expose field values
pub trait Record {
    /// Read a field. `None` when the record has no such field.
    fn get(&self, field: &str) -> Option<JsonValue>;

    /// Read a field as position text, failing when it is missing
    fn position(&self, field: &str) -> Result<String> {
        self.get(field)
            .map(|value| position_text(&value))
            .ok_or_else(|| Error::missing_field(field))
    }
}

impl Record for JsonObject {
    fn get(&self, field: &str) -> Option<JsonValue> {
        serde_json::Map::get(self, field).cloned()
    }
}

impl Record for JsonValue {
    fn get(&self, field: &str) -> Option<JsonValue> {
        self.as_object().and_then(|map| map.get(field)).cloned()
    }
}

/// Text form of a field value as stored in a cursor position
///
/// Strings are used verbatim; every other value uses its JSON text.
pub fn position_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Strict comparison applied by a position filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Field value strictly less than the position
    LessThan,
    /// Field value strictly greater than the position
    GreaterThan,
}

impl Comparison {
    /// SQL operator for this comparison
    pub fn sql_operator(self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::GreaterThan => ">",
        }
    }

    /// Check whether a comparison result satisfies this filter
    pub fn accepts(self, ordering: std::cmp::Ordering) -> bool {
        match self {
            Self::LessThan => ordering.is_lt(),
            Self::GreaterThan => ordering.is_gt(),
        }
    }
}

/// A strict inequality filter on one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    /// Field to compare
    pub field: String,
    /// Comparison to apply
    pub comparison: Comparison,
    /// Position text to compare against
    pub value: String,
}

impl FieldFilter {
    /// Create a filter
    pub fn new(field: impl Into<String>, comparison: Comparison, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            comparison,
            value: value.into(),
        }
    }
}

/// An ordered, filterable, countable and sliceable collection of records
///
/// View-building methods return a new source and never modify `self`.
/// `count` and `slice` may do I/O and are the only calls that touch
/// storage.
#[async_trait]
pub trait RecordSource: Send + Sync + Sized {
    /// Record type yielded by [`RecordSource::slice`]
    type Record: Record + Send;

    /// Ordering configured on this source, if any
    fn ordering(&self) -> Option<&Ordering>;

    /// A view of this source in the given order
    fn with_order(&self, ordering: Ordering) -> Self;

    /// A view keeping records whose `field` is strictly less than `value`
    fn filter_lt(&self, field: &str, value: &str) -> Self;

    /// A view keeping records whose `field` is strictly greater than `value`
    fn filter_gt(&self, field: &str, value: &str) -> Self;

    /// Number of matching records, ignoring any slice
    async fn count(&self) -> Result<u64>;

    /// Materialize the window of `take` records after skipping `skip`
    async fn slice(&self, skip: u64, take: u64) -> Result<Vec<Self::Record>>;
}
