//! In-memory record source
//!
//! Holds JSON objects behind an `Arc` so views are cheap to derive.

use async_trait::async_trait;
use std::cmp::Ordering as CmpOrdering;
use std::path::Path;
use std::sync::Arc;

use super::types::{Comparison, FieldFilter, RecordSource};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, Ordering};

/// Record source over a vector of JSON objects
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Arc<Vec<JsonObject>>,
    ordering: Option<Ordering>,
    filters: Vec<FieldFilter>,
}

impl MemorySource {
    /// Create a source over the given records, in insertion order
    pub fn new(records: Vec<JsonObject>) -> Self {
        Self {
            records: Arc::new(records),
            ordering: None,
            filters: Vec::new(),
        }
    }

    /// Create a source from JSON values, each of which must be an object
    pub fn from_values(values: Vec<JsonValue>) -> Result<Self> {
        let records = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match value {
                JsonValue::Object(map) => Ok(map),
                other => Err(Error::config(format!(
                    "Record {index} is not a JSON object: {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(records))
    }

    /// Load records from a file holding a JSON array of objects
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {e}", path.display())))?;

        let values: Vec<JsonValue> = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), records = values.len(), "Loaded records");

        Self::from_values(values)
    }

    /// Return the same source with an ordering configured
    pub fn ordered_by(mut self, ordering: Ordering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    fn with_filter(&self, filter: FieldFilter) -> Self {
        let mut view = self.clone();
        view.filters.push(filter);
        view
    }

    fn matches(&self, record: &JsonObject) -> bool {
        self.filters.iter().all(|filter| {
            record
                .get(&filter.field)
                .and_then(|value| compare_to_position(value, &filter.value))
                .is_some_and(|ordering| filter.comparison.accepts(ordering))
        })
    }

    /// Filtered records in query order
    fn materialize(&self) -> Vec<&JsonObject> {
        let mut records: Vec<&JsonObject> =
            self.records.iter().filter(|r| self.matches(r)).collect();

        if let Some(ordering) = &self.ordering {
            records.sort_by(|a, b| compare_records(a, b, ordering));
        }

        records
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    type Record = JsonObject;

    fn ordering(&self) -> Option<&Ordering> {
        self.ordering.as_ref()
    }

    fn with_order(&self, ordering: Ordering) -> Self {
        let mut view = self.clone();
        view.ordering = Some(ordering);
        view
    }

    fn filter_lt(&self, field: &str, value: &str) -> Self {
        self.with_filter(FieldFilter::new(field, Comparison::LessThan, value))
    }

    fn filter_gt(&self, field: &str, value: &str) -> Self {
        self.with_filter(FieldFilter::new(field, Comparison::GreaterThan, value))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.iter().filter(|r| self.matches(r)).count() as u64)
    }

    async fn slice(&self, skip: u64, take: u64) -> Result<Vec<JsonObject>> {
        Ok(self
            .materialize()
            .into_iter()
            .skip(skip as usize)
            .take(take as usize)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Value Comparison
// ============================================================================

/// Compare two records key by key. Missing fields sort as null.
fn compare_records(a: &JsonObject, b: &JsonObject, ordering: &Ordering) -> CmpOrdering {
    for key in ordering.keys() {
        let left = a.get(&key.field).unwrap_or(&JsonValue::Null);
        let right = b.get(&key.field).unwrap_or(&JsonValue::Null);

        let ordering = compare_values(left, right);
        let ordering = if key.direction.is_descending() {
            ordering.reverse()
        } else {
            ordering
        };

        if ordering.is_ne() {
            return ordering;
        }
    }
    CmpOrdering::Equal
}

fn type_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Bool(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::String(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}

/// Total order over JSON values: null < bool < number < string < array < object
pub(crate) fn compare_values(a: &JsonValue, b: &JsonValue) -> CmpOrdering {
    match (a, b) {
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => compare_numbers(x, y),
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Null, JsonValue::Null) => CmpOrdering::Equal,
        _ if type_rank(a) != type_rank(b) => type_rank(a).cmp(&type_rank(b)),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn compare_numbers(x: &serde_json::Number, y: &serde_json::Number) -> CmpOrdering {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x.cmp(&y);
    }
    let x = x.as_f64().unwrap_or(f64::NAN);
    let y = y.as_f64().unwrap_or(f64::NAN);
    x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal)
}

/// Compare a field value with position text, interpreting the text in the
/// value's own type. `None` when the two cannot be compared; null values
/// never match a position filter.
pub(crate) fn compare_to_position(value: &JsonValue, position: &str) -> Option<CmpOrdering> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.as_str().cmp(position)),
        JsonValue::Number(n) => {
            if let (Some(x), Ok(y)) = (n.as_i64(), position.parse::<i64>()) {
                return Some(x.cmp(&y));
            }
            let x = n.as_f64()?;
            let y = position.parse::<f64>().ok()?;
            x.partial_cmp(&y)
        }
        JsonValue::Bool(b) => position.parse::<bool>().ok().map(|p| b.cmp(&p)),
        other => Some(other.to_string().as_str().cmp(position)),
    }
}
