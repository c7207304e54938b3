//! Common types used throughout Solidafy Pager
//!
//! This module contains shared type definitions, type aliases,
//! limits, and typed orderings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Limits
// ============================================================================

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the caller does not ask for one
pub const DEFAULT_LIMIT: u32 = MAX_PAGE_SIZE;

/// Largest offset a cursor may carry. Guards against crafted cursors that
/// would force the record source to skip arbitrarily far.
pub const MAX_OFFSET: u32 = 100;

// ============================================================================
// Ordering
// ============================================================================

/// Sort direction of a single ordering key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    /// The opposite direction
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Whether this is a descending direction
    pub fn is_descending(self) -> bool {
        matches!(self, Self::Descending)
    }
}

/// One key of an ordering: a field and the direction to sort it in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderKey {
    /// Field name on the record
    pub field: String,
    /// Sort direction
    pub direction: Direction,
}

impl OrderKey {
    /// Ascending key on `field`
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    /// Descending key on `field`
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    /// The same field sorted the other way
    pub fn reversed(&self) -> Self {
        Self {
            field: self.field.clone(),
            direction: self.direction.reversed(),
        }
    }
}

impl FromStr for OrderKey {
    type Err = Error;

    /// Parses the conventional text form, where a leading `-` marks a
    /// descending key (`"-created"`).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (field, direction) = match s.strip_prefix('-') {
            Some(rest) => (rest, Direction::Descending),
            None => (s, Direction::Ascending),
        };

        if field.is_empty() || field.starts_with('-') {
            return Err(Error::config(format!("Invalid ordering key '{s}'")));
        }

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Ascending => write!(f, "{}", self.field),
            Direction::Descending => write!(f, "-{}", self.field),
        }
    }
}

/// An ordered list of keys. The first key is the position key used by
/// cursors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Ordering(Vec<OrderKey>);

impl Ordering {
    /// Create an ordering from keys
    pub fn new(keys: Vec<OrderKey>) -> Self {
        Self(keys)
    }

    /// Parse an ordering from its text form, e.g. `["-created", "id"]`
    pub fn parse<S: AsRef<str>>(keys: &[S]) -> Result<Self> {
        keys.iter()
            .map(|key| key.as_ref().parse())
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// The keys of this ordering
    pub fn keys(&self) -> &[OrderKey] {
        &self.0
    }

    /// The leading (position) key
    pub fn leading(&self) -> Option<&OrderKey> {
        self.0.first()
    }

    /// Check if the ordering has no keys
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The same ordering with every key flipped
    pub fn reversed(&self) -> Self {
        Self(self.0.iter().map(OrderKey::reversed).collect())
    }
}

impl TryFrom<Vec<String>> for Ordering {
    type Error = Error;

    fn try_from(keys: Vec<String>) -> Result<Self> {
        Self::parse(&keys)
    }
}

impl From<Ordering> for Vec<String> {
    fn from(ordering: Ordering) -> Self {
        ordering.0.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", keys.join(","))
    }
}
