//! Configuration types for the pagination server
//!
//! This module contains the structures used to describe served collections
//! in YAML format, and the loaders that turn them into record sources.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::source::{DuckDbSource, MemorySource};
use crate::types::{OrderKey, Ordering};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete server configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Ordering for collections that do not declare one
    #[serde(default = "default_ordering")]
    pub default_ordering: Ordering,

    /// Served collections
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

fn default_ordering() -> Ordering {
    Ordering::new(vec![OrderKey::desc("created")])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            default_ordering: default_ordering(),
            collections: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Find a collection by name
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Resolve relative data paths against `dir`
    pub fn resolve_paths(&mut self, dir: &Path) {
        for collection in &mut self.collections {
            match &mut collection.source {
                SourceConfig::Json { path } => resolve(path, dir),
                SourceConfig::Duckdb {
                    database: Some(path),
                    ..
                } => resolve(path, dir),
                SourceConfig::Duckdb { database: None, .. } => {}
            }
        }
    }
}

fn resolve(path: &mut PathBuf, dir: &Path) {
    if path.is_relative() {
        *path = dir.join(&*path);
    }
}

// ============================================================================
// Server Settings
// ============================================================================

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL used for page links. When absent, links are built
    /// from the request's Host header.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            base_url: None,
        }
    }
}

fn default_port() -> u16 {
    8080
}

// ============================================================================
// Collections
// ============================================================================

/// A named, paginated collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// URL name of the collection
    pub name: String,

    /// Ordering of the collection. Falls back to the default ordering.
    #[serde(default)]
    pub ordering: Option<Ordering>,

    /// Where the records come from
    pub source: SourceConfig,
}

/// Record source definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// JSON file holding an array of objects
    Json {
        /// Path to the file
        path: PathBuf,
    },

    /// Table in a DuckDB database
    Duckdb {
        /// Database file; in-memory when absent
        #[serde(default)]
        database: Option<PathBuf>,
        /// Table or view name, optionally schema-qualified
        table: String,
        /// Statements run once after opening (create, load, attach)
        #[serde(default)]
        init_sql: Option<String>,
    },
}

/// An opened record source
#[derive(Clone)]
pub enum CollectionSource {
    /// In-memory JSON records
    Memory(MemorySource),
    /// DuckDB table
    DuckDb(DuckDbSource),
}

impl CollectionConfig {
    /// Open the record source, applying the collection's ordering
    pub fn open(&self) -> Result<CollectionSource> {
        let source = match &self.source {
            SourceConfig::Json { path } => {
                let mut source = MemorySource::from_json_file(path)?;
                if let Some(ordering) = &self.ordering {
                    source = source.ordered_by(ordering.clone());
                }
                CollectionSource::Memory(source)
            }
            SourceConfig::Duckdb {
                database,
                table,
                init_sql,
            } => {
                let mut source = DuckDbSource::open(database.as_deref(), table)?;
                if let Some(sql) = init_sql {
                    source.execute_batch(sql)?;
                }
                if let Some(ordering) = &self.ordering {
                    source = source.ordered_by(ordering.clone());
                }
                CollectionSource::DuckDb(source)
            }
        };

        tracing::debug!(collection = %self.name, "Opened record source");
        Ok(source)
    }
}

// ============================================================================
// Loader Functions
// ============================================================================

/// Load a configuration from a YAML file
///
/// Relative data paths are resolved against the file's directory.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let mut config = load_config_from_str(&content)?;
    if let Some(dir) = path.parent() {
        config.resolve_paths(dir);
    }
    Ok(config)
}

/// Load a configuration from a YAML string
pub fn load_config_from_str(yaml: &str) -> Result<AppConfig> {
    let config: AppConfig = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse config YAML: {e}")))?;

    validate_config(&config)?;
    Ok(config)
}

/// Validate a configuration
fn validate_config(config: &AppConfig) -> Result<()> {
    if config.default_ordering.is_empty() {
        return Err(Error::config("default_ordering cannot be empty"));
    }

    let names: HashSet<_> = config.collections.iter().map(|c| &c.name).collect();
    if names.len() != config.collections.len() {
        return Err(Error::config("Duplicate collection names found"));
    }

    for collection in &config.collections {
        validate_collection(collection)?;
    }

    if let Some(base_url) = &config.server.base_url {
        url::Url::parse(base_url)
            .map_err(|e| Error::config(format!("Invalid server base_url '{base_url}': {e}")))?;
    }

    Ok(())
}

/// Validate a collection definition
fn validate_collection(collection: &CollectionConfig) -> Result<()> {
    let name = &collection.name;
    if name.is_empty() {
        return Err(Error::config("Collection name cannot be empty"));
    }

    if name.contains('/') {
        return Err(Error::config(format!(
            "Collection name '{name}' cannot contain '/'"
        )));
    }

    if collection.ordering.as_ref().is_some_and(Ordering::is_empty) {
        return Err(Error::config(format!(
            "Collection '{name}' ordering cannot be empty"
        )));
    }

    if let SourceConfig::Duckdb { table, .. } = &collection.source {
        if table.trim().is_empty() {
            return Err(Error::config(format!(
                "Collection '{name}' table cannot be empty"
            )));
        }
    }

    Ok(())
}
