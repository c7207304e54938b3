//! Collection catalog
//!
//! Owns the opened record sources and pages them by name.

use std::collections::BTreeMap;
use url::Url;

use crate::config::{AppConfig, CollectionSource};
use crate::error::{Error, Result};
use crate::pagination::{CursorPaginator, Envelope, PaginationParams, PaginationQuery};
use crate::types::{JsonObject, JsonValue};

/// Named collections served by the pager
#[derive(Clone)]
pub struct Catalog {
    paginator: CursorPaginator,
    collections: BTreeMap<String, CollectionSource>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new(paginator: CursorPaginator) -> Self {
        Self {
            paginator,
            collections: BTreeMap::new(),
        }
    }

    /// Open every collection named in `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut catalog = Self::new(CursorPaginator::new(config.default_ordering.clone()));
        for collection in &config.collections {
            catalog.insert(&collection.name, collection.open()?);
        }

        tracing::info!(collections = catalog.collections.len(), "Catalog ready");
        Ok(catalog)
    }

    /// Add or replace a collection
    pub fn insert(&mut self, name: impl Into<String>, source: CollectionSource) {
        self.collections.insert(name.into(), source);
    }

    /// Collection names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    /// Validate `query` and fetch one page of the named collection
    ///
    /// Links in the envelope are built from `url`.
    pub async fn page(
        &self,
        name: &str,
        query: &PaginationQuery,
        url: &Url,
    ) -> Result<Envelope<JsonValue>> {
        let source = self
            .collections
            .get(name)
            .ok_or_else(|| Error::collection_not_found(name))?;
        let params = query.validate()?;

        self.page_source(source, &params, url).await
    }

    async fn page_source(
        &self,
        source: &CollectionSource,
        params: &PaginationParams,
        url: &Url,
    ) -> Result<Envelope<JsonValue>> {
        let page = match source {
            CollectionSource::Memory(source) => self.paginator.paginate(source, params).await?,
            CollectionSource::DuckDb(source) => self.paginator.paginate(source, params).await?,
        };

        Ok(page.map(object_value).into_envelope(url))
    }
}

fn object_value(record: JsonObject) -> JsonValue {
    JsonValue::Object(record)
}
