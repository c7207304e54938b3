//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Solidafy Pager CLI
#[derive(Parser, Debug)]
#[command(name = "solidafy-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server mode
    Serve {
        /// Server configuration file (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Port to listen on (overrides the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch one page of a collection and print it as JSON
    Page {
        /// Server configuration file (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Collection name
        #[arg(long)]
        collection: String,

        /// Number of results per page
        #[arg(short, long)]
        limit: Option<String>,

        /// Cursor token from a previous page
        #[arg(long)]
        cursor: Option<String>,

        /// URL the page links are built from
        #[arg(long, default_value = "http://localhost/")]
        base_url: String,
    },

    /// Encode a cursor token
    Encode {
        /// Records to skip past the position
        #[arg(short, long, default_value = "0")]
        offset: u32,

        /// Page backwards
        #[arg(short, long)]
        reverse: bool,

        /// Leading-key value to continue from
        #[arg(long)]
        position: Option<String>,
    },

    /// Decode a cursor token and print its fields
    Decode {
        /// Cursor token
        token: String,
    },
}
