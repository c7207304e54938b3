//! CLI runner - executes commands

use serde_json::json;
use std::path::Path;
use url::Url;

use crate::catalog::Catalog;
use crate::cli::commands::{Cli, Commands};
use crate::cli::server::{serve, ServerConfig};
use crate::config::{load_config, AppConfig};
use crate::cursor::Cursor;
use crate::error::{Result, ResultExt};
use crate::pagination::PaginationQuery;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Serve { config, port } => self.serve(config, *port).await,
            Commands::Page {
                config,
                collection,
                limit,
                cursor,
                base_url,
            } => {
                let query = PaginationQuery {
                    limit: limit.clone(),
                    cursor: cursor.clone(),
                };
                self.page(config, collection, &query, base_url).await
            }
            Commands::Encode {
                offset,
                reverse,
                position,
            } => self.encode(*offset, *reverse, position.clone()),
            Commands::Decode { token } => self.decode(token),
        }
    }

    /// Load the server configuration
    fn load_config(&self, path: &Path) -> Result<AppConfig> {
        let config = load_config(path)?;
        if self.cli.verbose {
            eprintln!(
                "Loaded {} collection(s) from {}",
                config.collections.len(),
                path.display()
            );
        }
        Ok(config)
    }

    /// Start HTTP server mode
    async fn serve(&self, path: &Path, port: Option<u16>) -> Result<()> {
        let config = self.load_config(path)?;
        let port = port.unwrap_or(config.server.port);

        serve(ServerConfig::from_app_config(&config)?, port).await
    }

    /// Print one page of a collection
    async fn page(
        &self,
        path: &Path,
        collection: &str,
        query: &PaginationQuery,
        base_url: &str,
    ) -> Result<()> {
        let config = self.load_config(path)?;
        let catalog = Catalog::from_config(&config)?;

        let mut url = Url::parse(base_url).context("Invalid --base-url")?;
        let params = [("limit", &query.limit), ("cursor", &query.cursor)];
        for (key, value) in params {
            if let Some(value) = value {
                url.query_pairs_mut().append_pair(key, value);
            }
        }

        let envelope = catalog.page(collection, query, &url).await?;
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        Ok(())
    }

    /// Print a cursor token
    fn encode(&self, offset: u32, reverse: bool, position: Option<String>) -> Result<()> {
        let cursor = Cursor::new(offset, reverse, position)?;
        println!("{}", cursor.encode());
        Ok(())
    }

    /// Print the fields of a cursor token
    fn decode(&self, token: &str) -> Result<()> {
        let cursor = Cursor::decode(token)?;
        let output = json!({
            "offset": cursor.offset(),
            "reverse": cursor.reverse(),
            "position": cursor.position(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
