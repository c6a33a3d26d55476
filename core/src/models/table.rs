//! Entity table representation
//!
//! This module provides the schema description a record store is built from:
//! column types, required and unique columns, foreign keys and the optional
//! status rule.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Deserialize};

use crate::error::{Result, StoreError};
use super::row::Value;

/// Date format used by `Date` columns
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format used by `Timestamp` columns
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Type of column in a table schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// 64-bit integer
    Integer,

    /// Text (unlimited length)
    Text,

    /// Calendar date stored as `YYYY-MM-DD` text
    Date,

    /// Local timestamp stored as `YYYY-MM-DD HH:MM:SS` text
    Timestamp,
}

impl ColumnType {
    /// SQLite storage class for the column
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text | ColumnType::Date | ColumnType::Timestamp => "TEXT",
        }
    }

    /// Decode a cell read from a mirror or seed file.
    ///
    /// Empty cells become `Null`. Date and timestamp cells are kept as text
    /// without format checks, matching a raw bulk load.
    pub fn decode(&self, cell: &str) -> Result<Value> {
        if cell.is_empty() {
            return Ok(Value::Null);
        }
        match self {
            ColumnType::Integer => parse_integer(cell),
            ColumnType::Text | ColumnType::Date | ColumnType::Timestamp => {
                Ok(Value::Text(cell.to_string()))
            }
        }
    }

    /// Parse user input for this column, checking the format strictly
    pub fn parse(&self, input: &str) -> Result<Value> {
        let input = input.trim();
        match self {
            ColumnType::Integer => parse_integer(input),
            ColumnType::Text => Ok(Value::Text(input.to_string())),
            ColumnType::Date => {
                NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|e| {
                    StoreError::Validation(format!("{:?} is not a YYYY-MM-DD date: {}", input, e))
                })?;
                Ok(Value::Text(input.to_string()))
            }
            ColumnType::Timestamp => {
                NaiveDateTime::parse_from_str(input, TIMESTAMP_FORMAT).map_err(|e| {
                    StoreError::Validation(format!(
                        "{:?} is not a YYYY-MM-DD HH:MM:SS timestamp: {}",
                        input, e
                    ))
                })?;
                Ok(Value::Text(input.to_string()))
            }
        }
    }
}

fn parse_integer(cell: &str) -> Result<Value> {
    if let Ok(v) = cell.parse::<i64>() {
        return Ok(Value::Integer(v));
    }
    // Spreadsheet exports sometimes write integral columns as "12.0"
    match cell.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(Value::Integer(v as i64)),
        _ => Err(StoreError::Validation(format!("{:?} is not an integer", cell))),
    }
}

/// Reference from a column to another table's identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced table
    pub table: String,

    /// Referenced column
    pub column: String,
}

/// Definition of a column in a table schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Name of the column
    pub name: String,

    /// Type of the column
    pub column_type: ColumnType,

    /// Whether `create` requires a non-empty value
    pub required: bool,

    /// Whether the value must be unique across live rows
    pub unique: bool,

    /// Accepted values, empty when unrestricted
    pub allowed_values: Vec<String>,

    /// Smallest accepted integer
    pub min_value: Option<i64>,

    /// Foreign key reference
    pub references: Option<ForeignKeyRef>,
}

impl ColumnDefinition {
    /// Create an optional, unconstrained column
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        ColumnDefinition {
            name: name.to_string(),
            column_type,
            required: false,
            unique: false,
            allowed_values: Vec::new(),
            min_value: None,
            references: None,
        }
    }

    /// Mark the column as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the column as unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Restrict the column to a fixed set of values
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed_values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Set the smallest accepted integer
    pub fn min(mut self, min_value: i64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    /// Reference another table's column
    pub fn references(mut self, table: &str, column: &str) -> Self {
        self.references = Some(ForeignKeyRef {
            table: table.to_string(),
            column: column.to_string(),
        });
        self
    }

    /// Check a value against the column's type and constraints, returning
    /// the value to store.
    ///
    /// Text is trimmed and blank text becomes `Null`; presence is checked by
    /// the validator.
    pub fn check(&self, value: &Value) -> Result<Value> {
        if value.is_blank() {
            return Ok(Value::Null);
        }
        let value = match (self.column_type, value) {
            (ColumnType::Integer, Value::Integer(v)) => {
                if let Some(min) = self.min_value {
                    if *v < min {
                        return Err(StoreError::Validation(format!(
                            "{} must be at least {}, got {}",
                            self.name, min, v
                        )));
                    }
                }
                Value::Integer(*v)
            }
            (ColumnType::Integer, other) => {
                return Err(StoreError::Validation(format!(
                    "{} must be an integer, got {:?}",
                    self.name, other
                )));
            }
            // Re-parse to enforce date and timestamp formats
            (column_type, Value::Text(text)) => column_type.parse(text).map_err(|e| match e {
                StoreError::Validation(msg) => {
                    StoreError::Validation(format!("{}: {}", self.name, msg))
                }
                other => other,
            })?,
            (_, other) => {
                return Err(StoreError::Validation(format!(
                    "{} must be text, got {:?}",
                    self.name, other
                )));
            }
        };
        if !self.allowed_values.is_empty() {
            let text = value.to_string();
            if !self.allowed_values.iter().any(|allowed| allowed == &text) {
                return Err(StoreError::Validation(format!(
                    "{} must be one of [{}], got {:?}",
                    self.name,
                    self.allowed_values.join(", "),
                    text
                )));
            }
        }
        Ok(value)
    }
}

/// Permitted status transitions for one column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRule {
    /// Column holding the status
    pub column: String,

    /// Status every new row starts in
    pub initial: String,

    /// Allowed (from, to) pairs
    pub transitions: Vec<(String, String)>,
}

impl StatusRule {
    /// Whether moving from `from` to `to` is allowed. Staying put always is.
    pub fn allows(&self, from: &str, to: &str) -> bool {
        from == to || self.transitions.iter().any(|(f, t)| f == from && t == to)
    }
}

/// Schema of an entity table
#[derive(Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Name of the table
    pub name: String,

    /// Auto-incrementing identifier column
    pub id_column: String,

    /// Data columns, identifier excluded
    pub columns: Vec<ColumnDefinition>,

    /// Status lifecycle enforced on create and update
    pub status_rule: Option<StatusRule>,
}

impl Debug for TableSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TableSchema")
            .field("name", &self.name)
            .field("id_column", &self.id_column)
            .field("columns", &self.column_names())
            .finish()
    }
}

impl TableSchema {
    /// Create a new table schema
    pub fn new(name: &str, id_column: &str, columns: Vec<ColumnDefinition>) -> Self {
        TableSchema {
            name: name.to_string(),
            id_column: id_column.to_string(),
            columns,
            status_rule: None,
        }
    }

    /// Attach a status rule
    pub fn with_status_rule(mut self, rule: StatusRule) -> Self {
        self.status_rule = Some(rule);
        self
    }

    /// Get a data column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// Check if the schema has a column, identifier included
    pub fn has_column(&self, name: &str) -> bool {
        name == self.id_column || self.get_column(name).is_some()
    }

    /// Data column names in order
    pub fn data_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.name.as_str()).collect()
    }

    /// All column names, identifier first. This is also the mirror header.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names = vec![self.id_column.as_str()];
        names.extend(self.data_column_names());
        names
    }

    /// Columns with a uniqueness constraint
    pub fn unique_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|col| col.unique)
    }

    /// Columns referencing another table
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&ColumnDefinition, &ForeignKeyRef)> {
        self.columns
            .iter()
            .filter_map(|col| col.references.as_ref().map(|fk| (col, fk)))
    }

    /// Type of a column, identifier included
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        if name == self.id_column {
            Some(ColumnType::Integer)
        } else {
            self.get_column(name).map(|col| col.column_type)
        }
    }
}
