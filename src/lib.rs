// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Solidafy Pager
//!
//! Cursor pagination over ordered record sources, with compact opaque
//! cursor tokens and navigation in both directions.
//!
//! ## Features
//!
//! - **Opaque Cursors**: URL-safe base64 tokens carrying offset, direction and position
//! - **Bidirectional Paging**: Next and previous links from any page
//! - **Duplicate Runs**: Stable paging when many records share a leading-key value
//! - **Record Sources**: In-memory JSON and DuckDB tables behind one async trait
//! - **HTTP Mode**: Serve configured collections with axum
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_pager::pagination::{CursorPaginator, PaginationQuery};
//! use solidafy_pager::source::MemorySource;
//!
//! let source = MemorySource::from_json_file("data/categories.json")?;
//! let params = PaginationQuery { limit: Some("2".into()), cursor: None }.validate()?;
//!
//! let page = CursorPaginator::default().paginate(&source, &params).await?;
//! let envelope = page.into_envelope(&url::Url::parse("http://localhost/categories")?);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 HTTP server / CLI  (cli, catalog)               │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────────────┬──────────────────┐
//! │    Cursor    │          Pagination           │  Record Sources  │
//! ├──────────────┼───────────────────────────────┼──────────────────┤
//! │ encode       │ validate query                │ MemorySource     │
//! │ decode       │ order, filter, slice          │ DuckDbSource     │
//! │              │ next / previous links         │                  │
//! └──────────────┴───────────────────────────────┴──────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pager
pub mod error;

/// Common types and type aliases
pub mod types;

/// Cursor token codec
pub mod cursor;

/// Record sources
pub mod source;

/// Cursor pagination
pub mod pagination;

/// Server configuration
pub mod config;

/// Named collections
pub mod catalog;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use catalog::Catalog;
pub use config::{load_config, load_config_from_str, AppConfig};
pub use cursor::Cursor;
pub use pagination::{CursorPaginator, Envelope, Page, PaginationParams, PaginationQuery};
pub use source::{DuckDbSource, MemorySource, Record, RecordSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
