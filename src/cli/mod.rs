//! CLI module
//!
//! Command-line interface for serving and inspecting paginated collections.
//!
//! # Commands
//!
//! - `serve` - Start HTTP server mode
//! - `page` - Fetch one page of a collection
//! - `encode` - Build a cursor token
//! - `decode` - Inspect a cursor token

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands};
pub use runner::Runner;
pub use server::{build_router, serve, ServerConfig};
