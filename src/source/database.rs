//! DuckDB-backed record source
//!
//! Pages through a single table (or view) of a DuckDB database. The
//! database may be a file or in-memory; other engines can be reached
//! through DuckDB's `ATTACH` extensions in the initialisation SQL.

use async_trait::async_trait;
use duckdb::{params_from_iter, Connection};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock, Mutex};

use super::types::{Comparison, FieldFilter, RecordSource};
use crate::error::{Error, Result};
use crate::types::{JsonObject, Ordering};

/// Column name to declared SQL type
type ColumnTypes = HashMap<String, String>;

/// Bare SQL identifier
static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Record source over a DuckDB table
#[derive(Clone)]
pub struct DuckDbSource {
    /// Shared DuckDB connection
    conn: Arc<Mutex<Connection>>,
    /// Quoted table reference
    table: String,
    ordering: Option<Ordering>,
    filters: Vec<FieldFilter>,
}

impl DuckDbSource {
    /// Open a database file, or an in-memory database when `path` is `None`
    pub fn open(path: Option<&Path>, table: &str) -> Result<Self> {
        let conn = match path {
            Some(path) => Connection::open(path).map_err(|e| {
                Error::config(format!("Failed to open DuckDB {}: {e}", path.display()))
            })?,
            None => Connection::open_in_memory()
                .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?,
        };

        Self::from_connection(conn, table)
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection, table: &str) -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table: quote_table(table)?,
            ordering: None,
            filters: Vec::new(),
        })
    }

    /// Return the same source with an ordering configured
    pub fn ordered_by(mut self, ordering: Ordering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    /// Run setup statements (create tables, load files, attach databases)
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::record_source("DuckDB connection lock poisoned"))
    }

    fn with_filter(&self, filter: FieldFilter) -> Self {
        let mut view = self.clone();
        view.filters.push(filter);
        view
    }

    /// WHERE clause and its bound values
    ///
    /// Position text is cast to the column's type when it is known, so
    /// numbers and timestamps compare in their own type.
    fn where_clause(&self, types: &ColumnTypes) -> Result<(String, Vec<String>)> {
        if self.filters.is_empty() {
            return Ok((String::new(), Vec::new()));
        }

        let conditions = self
            .filters
            .iter()
            .map(|filter| {
                let placeholder = match types.get(&filter.field) {
                    Some(column_type) => format!("CAST(? AS {column_type})"),
                    None => "?".to_string(),
                };
                Ok(format!(
                    "t.{} {} {placeholder}",
                    quote_identifier(&filter.field)?,
                    filter.comparison.sql_operator()
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let values = self.filters.iter().map(|f| f.value.clone()).collect();

        Ok((format!(" WHERE {}", conditions.join(" AND ")), values))
    }

    /// Declared column types of the table, needed only when filtering
    fn column_types(&self, conn: &Connection) -> Result<ColumnTypes> {
        if self.filters.is_empty() {
            return Ok(ColumnTypes::new());
        }

        let query = format!("DESCRIBE SELECT * FROM {}", self.table);
        tracing::debug!("Executing describe query: {}", query);

        let mut stmt = conn.prepare(&query)?;
        let types = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<ColumnTypes, _>>()?;
        Ok(types)
    }

    fn order_clause(&self) -> Result<String> {
        let Some(ordering) = self.ordering.as_ref().filter(|o| !o.is_empty()) else {
            return Ok(String::new());
        };

        let keys = ordering
            .keys()
            .iter()
            .map(|key| {
                let direction = if key.direction.is_descending() {
                    "DESC"
                } else {
                    "ASC"
                };
                Ok(format!("t.{} {direction}", quote_identifier(&key.field)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(format!(" ORDER BY {}", keys.join(", ")))
    }

    fn count_query(&self, types: &ColumnTypes) -> Result<(String, Vec<String>)> {
        let (filter, values) = self.where_clause(types)?;
        Ok((
            format!("SELECT COUNT(*) FROM {} AS t{filter}", self.table),
            values,
        ))
    }

    fn slice_query(
        &self,
        skip: u64,
        take: u64,
        types: &ColumnTypes,
    ) -> Result<(String, Vec<String>)> {
        let (filter, values) = self.where_clause(types)?;
        let order = self.order_clause()?;
        Ok((
            format!(
                "SELECT CAST(to_json(t) AS VARCHAR) FROM {} AS t{filter}{order} LIMIT {take} OFFSET {skip}",
                self.table
            ),
            values,
        ))
    }
}

#[async_trait]
impl RecordSource for DuckDbSource {
    type Record = JsonObject;

    fn ordering(&self) -> Option<&Ordering> {
        self.ordering.as_ref()
    }

    fn with_order(&self, ordering: Ordering) -> Self {
        let mut view = self.clone();
        view.ordering = Some(ordering);
        view
    }

    fn filter_lt(&self, field: &str, value: &str) -> Self {
        self.with_filter(FieldFilter::new(field, Comparison::LessThan, value))
    }

    fn filter_gt(&self, field: &str, value: &str) -> Self {
        self.with_filter(FieldFilter::new(field, Comparison::GreaterThan, value))
    }

    async fn count(&self) -> Result<u64> {
        let view = self.clone();
        let count = tokio::task::spawn_blocking(move || -> Result<i64> {
            let conn = view.lock()?;
            let (query, values) = view.count_query(&view.column_types(&conn)?)?;
            tracing::debug!("Executing count query: {}", query);

            let mut stmt = conn.prepare(&query)?;
            Ok(stmt.query_row(params_from_iter(values), |row| row.get(0))?)
        })
        .await
        .map_err(|e| Error::record_source(format!("Count task failed: {e}")))??;

        Ok(count.max(0) as u64)
    }

    async fn slice(&self, skip: u64, take: u64) -> Result<Vec<JsonObject>> {
        let view = self.clone();
        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            let conn = view.lock()?;
            let (query, values) = view.slice_query(skip, take, &view.column_types(&conn)?)?;
            tracing::debug!("Executing slice query: {}", query);

            let mut stmt = conn.prepare(&query)?;
            let rows = stmt
                .query_map(params_from_iter(values), |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(|e| Error::record_source(format!("Slice task failed: {e}")))??;

        rows.iter()
            .map(|row| serde_json::from_str::<JsonObject>(row).map_err(Error::from))
            .collect()
    }
}

/// Double-quote a bare identifier after validating it
fn quote_identifier(name: &str) -> Result<String> {
    if IDENTIFIER_REGEX.is_match(name) {
        Ok(format!("\"{name}\""))
    } else {
        Err(Error::invalid_identifier(name))
    }
}

/// Quote a table reference, allowing `schema.table` and `db.schema.table`
fn quote_table(table: &str) -> Result<String> {
    let parts = table
        .split('.')
        .map(quote_identifier)
        .collect::<Result<Vec<_>>>()
        .map_err(|_| Error::invalid_identifier(table))?;

    if parts.len() > 3 {
        return Err(Error::invalid_identifier(table));
    }

    Ok(parts.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderKey;

    fn source() -> DuckDbSource {
        DuckDbSource::open(None, "categories").unwrap()
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("title").unwrap(), "\"title\"");
        assert!(quote_identifier("title; DROP TABLE x").is_err());
        assert!(quote_identifier("\"quoted\"").is_err());
        assert!(quote_identifier("").is_err());
    }

    #[test]
    fn test_quote_table() {
        assert_eq!(quote_table("events").unwrap(), "\"events\"");
        assert_eq!(quote_table("main.events").unwrap(), "\"main\".\"events\"");
        assert!(quote_table("a.b.c.d").is_err());
        assert!(quote_table("a..b").is_err());
    }

    #[test]
    fn test_slice_query_shape() {
        let view = source()
            .with_order(Ordering::new(vec![OrderKey::desc("created"), OrderKey::asc("id")]))
            .filter_lt("created", "2024-01-01");

        let types = ColumnTypes::from([("created".to_string(), "TIMESTAMP".to_string())]);

        let (query, values) = view.slice_query(3, 11, &types).unwrap();
        assert_eq!(
            query,
            "SELECT CAST(to_json(t) AS VARCHAR) FROM \"categories\" AS t \
             WHERE t.\"created\" < CAST(? AS TIMESTAMP) ORDER BY t.\"created\" DESC, t.\"id\" ASC LIMIT 11 OFFSET 3"
        );
        assert_eq!(values, vec!["2024-01-01".to_string()]);
    }

    #[test]
    fn test_count_query_ignores_ordering() {
        let view = source()
            .with_order(Ordering::new(vec![OrderKey::asc("title")]))
            .filter_gt("title", "B");

        let (query, values) = view.count_query(&ColumnTypes::new()).unwrap();
        assert_eq!(
            query,
            "SELECT COUNT(*) FROM \"categories\" AS t WHERE t.\"title\" > ?"
        );
        assert_eq!(values, vec!["B".to_string()]);
    }

    #[test]
    fn test_column_types_described_only_when_filtering() {
        let source = source();
        source
            .execute_batch("CREATE TABLE categories (title VARCHAR, created TIMESTAMP)")
            .unwrap();
        let conn_source = source.clone();
        let conn = conn_source.lock().unwrap();

        assert!(source.column_types(&conn).unwrap().is_empty());

        let types = source
            .filter_gt("created", "2024-01-01 00:00:00")
            .column_types(&conn)
            .unwrap();
        assert_eq!(types.get("title").map(String::as_str), Some("VARCHAR"));
        assert_eq!(types.get("created").map(String::as_str), Some("TIMESTAMP"));
    }

    #[test]
    fn test_invalid_field_is_rejected_at_query_time() {
        let view = source().filter_gt("title\" OR 1=1 --", "B");
        assert!(matches!(
            view.count_query(&ColumnTypes::new()),
            Err(Error::InvalidIdentifier { .. })
        ));
    }
}
