//! Record source module
//!
//! Supports: in-memory JSON records, DuckDB tables
//!
//! # Overview
//!
//! The paginator never talks to storage directly. It builds a query view
//! through the [`RecordSource`] trait (ordering plus strict `<`/`>` filters
//! on a single field), then issues one `count` and one `slice` against it.
//! Views are cheap to derive and leave the source they came from untouched.

mod database;
mod memory;
mod types;

pub use database::DuckDbSource;
pub use memory::MemorySource;
pub use types::{position_text, Comparison, FieldFilter, Record, RecordSource};
