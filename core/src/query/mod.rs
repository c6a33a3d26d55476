//! Query catalog
//!
//! A fixed list of read-only statements over the entity tables. Results are
//! returned with column names exactly as the statement projects them.

mod catalog;
mod timer;

pub use catalog::{CatalogEntry, ChartKind, ChartSpec};
pub use timer::{QueryTimer, SLOW_QUERY_THRESHOLD};

use rusqlite::{params_from_iter, Connection};
use serde::Serialize;

use crate::error::{to_query_error, Result, StoreError};
use crate::models::Value;

/// Tabular result of a catalog statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column names from the statement's projection
    pub columns: Vec<String>,

    /// Rows, one value per column
    pub rows: Vec<Vec<Value>>,

    /// Execution time in milliseconds
    pub elapsed_ms: u64,
}

impl QueryResult {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|row| row.get(index)).collect())
    }

    /// Render as CSV with a header row, for report downloads
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| StoreError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(to_query_error)
    }
}

/// Lookup and execution of catalog entries
#[derive(Debug, Clone, Copy)]
pub struct QueryCatalog;

impl QueryCatalog {
    /// The numbered questions, in order
    pub fn entries() -> &'static [CatalogEntry] {
        &catalog::QUESTIONS
    }

    /// The analysis reports, in order
    pub fn reports() -> &'static [CatalogEntry] {
        &catalog::REPORTS
    }

    /// A question by number
    pub fn find(number: u32) -> Option<&'static CatalogEntry> {
        catalog::QUESTIONS.iter().find(|e| e.number == number)
    }

    /// A question by label. A leading "N. " numbering prefix is ignored.
    pub fn find_by_label(label: &str) -> Option<&'static CatalogEntry> {
        let label = label.trim();
        let label = match label.split_once(". ") {
            Some((prefix, rest)) if prefix.chars().all(|c| c.is_ascii_digit()) => rest,
            _ => label,
        };
        catalog::QUESTIONS.iter().find(|e| e.label == label)
    }

    /// A report by number
    pub fn report(number: u32) -> Option<&'static CatalogEntry> {
        catalog::REPORTS.iter().find(|e| e.number == number)
    }

    /// Run an entry. The parameter must be given exactly when the entry takes one.
    pub fn execute(conn: &Connection, entry: &CatalogEntry, param: Option<&str>) -> Result<QueryResult> {
        let params: Vec<&str> = match (entry.parameter, param) {
            (Some(_), Some(value)) => vec![value],
            (None, None) => Vec::new(),
            (Some(name), None) => {
                return Err(StoreError::Query(format!(
                    "query {} needs a {} parameter",
                    entry.number, name
                )))
            }
            (None, Some(_)) => {
                return Err(StoreError::Query(format!(
                    "query {} takes no parameter",
                    entry.number
                )))
            }
        };

        let timer = QueryTimer::start(format!("query {}", entry.number));
        let mut stmt = conn.prepare(entry.sql).map_err(to_query_error)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query(params_from_iter(params)).map_err(to_query_error)?;
        while let Some(row) = cursor.next().map_err(to_query_error)? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(row.get::<_, Value>(i).map_err(to_query_error)?);
            }
            rows.push(values);
        }

        let elapsed_ms = timer.finish(rows.len());
        Ok(QueryResult {
            columns,
            rows,
            elapsed_ms,
        })
    }

    /// Sorted distinct cities of providers and receivers
    pub fn cities(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT City FROM providers WHERE City IS NOT NULL \
             UNION SELECT City FROM receivers WHERE City IS NOT NULL \
             ORDER BY City",
        )?;
        let cities = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cities)
    }
}
