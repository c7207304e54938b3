//! Pagination module
//!
//! Cursor pagination over any [`RecordSource`], with forward and backward
//! navigation.
//!
//! # Overview
//!
//! A request carries a `limit` and an opaque cursor token. The paginator
//! orders the source (reversing the ordering for backward requests),
//! filters past the cursor's pivot position, skips the cursor's offset and
//! fetches one record more than the page to learn whether another page
//! follows. The next and previous cursors are then derived from the page,
//! walking inward past runs of records that share a leading-key value so
//! the new pivot is unambiguous.
//!
//! [`RecordSource`]: crate::source::RecordSource

mod links;
mod paginator;
mod types;

pub use links::replace_query_param;
pub use paginator::CursorPaginator;
pub use types::{Envelope, Page, PaginationParams, PaginationQuery};

#[cfg(test)]
mod tests;
