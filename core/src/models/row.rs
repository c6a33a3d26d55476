//! Record and value representation
//!
//! This module provides the value type stored in table cells and the
//! ordered record handed back to callers.

use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Serialize, Deserialize};

/// Field values supplied to `create` and `update`, keyed by column name
pub type Fields = HashMap<String, Value>;

/// Exact-match predicates for `list`, applied in order
pub type Filter = Vec<(String, Value)>;

/// Type of value in a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    /// 64-bit integer
    Integer,

    /// Floating point (64-bit)
    Real,

    /// Text string
    Text,

    /// Null value
    Null,
}

/// Value in a cell
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit integer
    Integer(i64),

    /// Floating point (64-bit)
    Real(f64),

    /// Text string
    Text(String),

    /// Null value
    Null,
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Integer(v) => write!(f, "Integer({})", v),
            Value::Real(v) => write!(f, "Real({})", v),
            Value::Text(v) => {
                if v.chars().count() > 20 {
                    let head: String = v.chars().take(20).collect();
                    write!(f, "Text(\"{}...\")", head)
                } else {
                    write!(f, "Text(\"{}\")", v)
                }
            }
            Value::Null => write!(f, "Null"),
        }
    }
}

/// Mirror encoding: nulls become empty cells
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Null => Ok(()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => {
                // Special handling for NaN
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Get the type of the value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Real(_) => ValueType::Real,
            Value::Text(_) => ValueType::Text,
            Value::Null => ValueType::Null,
        }
    }

    /// Whether the value counts as "not provided"
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Integer view of the value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view of the value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Integer(v) => ToSqlOutput::from(*v),
            Value::Real(v) => ToSqlOutput::from(*v),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Value::Null),
            ValueRef::Integer(v) => Ok(Value::Integer(v)),
            ValueRef::Real(v) => Ok(Value::Real(v)),
            ValueRef::Text(_) => value.as_str().map(|s| Value::Text(s.to_string())),
            ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

/// A row of an entity table, with columns in schema order
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Table name this record belongs to
    pub table: String,

    /// Store-assigned identifier
    pub id: i64,

    /// Column values in schema order, identifier column first
    pub values: Vec<(String, Value)>,
}

impl Debug for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Record {{ table: {}, id: {}, values: {:?} }}", self.table, self.id, self.values)
    }
}

impl Record {
    /// Create a new record
    pub fn new(table: String, id: i64, values: Vec<(String, Value)>) -> Self {
        Record { table, id, values }
    }

    /// Get a value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Text value of a column, if the column holds text
    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    /// Integer value of a column, if the column holds an integer
    pub fn integer(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }

    /// Overwrite an existing column. Returns false if the column is unknown.
    pub fn set(&mut self, column: &str, value: Value) -> bool {
        match self.values.iter_mut().find(|(name, _)| name == column) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Column names in order
    pub fn columns(&self) -> Vec<&str> {
        self.values.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Cells encoded for the mirror file
    pub fn to_cells(&self) -> Vec<String> {
        self.values.iter().map(|(_, value)| value.to_string()).collect()
    }

    /// The record as a column → value map
    pub fn to_fields(&self) -> Fields {
        self.values.iter().cloned().collect()
    }
}
