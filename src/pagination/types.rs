//! Pagination request and response types

use serde::{Deserialize, Serialize};
use url::Url;

use super::links::replace_query_param;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::types::{DEFAULT_LIMIT, MAX_PAGE_SIZE};

/// Raw pagination parameters as they arrive on a query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationQuery {
    /// Number of results to return per page
    #[serde(default)]
    pub limit: Option<String>,
    /// The pagination cursor value
    #[serde(default)]
    pub cursor: Option<String>,
}

impl PaginationQuery {
    /// Validate into [`PaginationParams`]
    ///
    /// Runs before any record source is touched, so a bad cursor never
    /// costs a query.
    pub fn validate(&self) -> Result<PaginationParams> {
        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_LIMIT,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .and_then(|limit| u32::try_from(limit).ok())
                .ok_or_else(|| Error::invalid_limit(raw))?,
        };

        let cursor = Cursor::decode(self.cursor.as_deref().unwrap_or_default())?;

        PaginationParams::new(limit, cursor)
    }
}

/// Validated pagination parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationParams {
    limit: u32,
    cursor: Cursor,
}

impl PaginationParams {
    /// Create parameters, rejecting limits above [`MAX_PAGE_SIZE`]
    pub fn new(limit: u32, cursor: Cursor) -> Result<Self> {
        if limit > MAX_PAGE_SIZE {
            return Err(Error::invalid_limit(limit));
        }
        Ok(Self { limit, cursor })
    }

    /// First page with the given limit
    pub fn first(limit: u32) -> Result<Self> {
        Self::new(limit, Cursor::start())
    }

    /// Maximum number of records on the page
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Decoded cursor
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            cursor: Cursor::start(),
        }
    }
}

/// One page of records plus the cursors around it
#[derive(Debug, Clone)]
pub struct Page<R> {
    /// Records in logical (forward) order
    pub results: Vec<R>,
    /// Total records in the ordered source, ignoring the cursor
    pub total_count: u64,
    /// Whether a page follows this one
    pub has_next: bool,
    /// Whether a page precedes this one
    pub has_previous: bool,
    /// Cursor for the following page. Present only when `has_next`.
    pub next_cursor: Option<Cursor>,
    /// Cursor for the preceding page. Present only when `has_previous`.
    pub previous_cursor: Option<Cursor>,
}

impl<R> Page<R> {
    /// Maps the results to a different type.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(R) -> U,
    {
        Page {
            results: self.results.into_iter().map(f).collect(),
            total_count: self.total_count,
            has_next: self.has_next,
            has_previous: self.has_previous,
            next_cursor: self.next_cursor,
            previous_cursor: self.previous_cursor,
        }
    }

    /// Build the response envelope, linking each cursor into `base_url`
    pub fn into_envelope(self, base_url: &Url) -> Envelope<R> {
        let link = |cursor: &Cursor| replace_query_param(base_url, "cursor", &cursor.encode());

        Envelope {
            next: self.next_cursor.as_ref().map(&link),
            previous: self.previous_cursor.as_ref().map(&link),
            count: self.total_count,
            results: self.results,
        }
    }
}

/// Response body of a paginated listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The page of objects
    pub results: Vec<T>,
    /// The total number of results across all pages
    pub count: u64,
    /// URL of the next page of results, if there is one
    pub next: Option<String>,
    /// URL of the previous page of results, if there is one
    pub previous: Option<String>,
}
