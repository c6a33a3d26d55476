//! Error types for the core crate
//!
//! This module provides a consolidated error type for the record stores,
//! the CSV mirrors and the query catalog.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field is missing, empty or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness constraint would be violated
    #[error("Duplicate key: {table}.{column} = {value:?} already exists")]
    DuplicateKey {
        /// Table the write targeted
        table: String,
        /// Column carrying the uniqueness constraint
        column: String,
        /// Offending value
        value: String,
    },

    /// No row with the given identifier
    #[error("Not found: {table} has no row with id {id}")]
    NotFound {
        /// Table that was searched
        table: String,
        /// Requested identifier
        id: i64,
    },

    /// A foreign key does not resolve, or a referenced parent would be orphaned
    #[error("Foreign key violation: {table}.{column} = {value}")]
    ForeignKey {
        /// Table holding the reference
        table: String,
        /// Referencing column
        column: String,
        /// Referenced value
        value: String,
    },

    /// Illegal status transition
    #[error("Invalid state transition for {table} id {id}: {from} -> {to}")]
    InvalidTransition {
        /// Table of the record
        table: String,
        /// Record identifier
        id: i64,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// The table write committed but the mirror write did not
    #[error("Partial write: {table} id {id} stored in the database but not mirrored: {reason}")]
    PartialWrite {
        /// Table that was written
        table: String,
        /// Identifier of the affected row
        id: i64,
        /// Why the mirror write failed
        reason: String,
    },

    /// The relational store or a mirror file cannot be opened
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// CSV mirror error
    #[error("Mirror error: {0}")]
    Mirror(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Query catalog error
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Static asset could not be found
    #[error("Asset not found: {0}")]
    AssetNotFound(String),
}

/// Broad classification of a [`StoreError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input rejected before any write
    Validation,
    /// Uniqueness violation
    DuplicateKey,
    /// Missing record or asset
    NotFound,
    /// Referential integrity violation
    ForeignKey,
    /// Illegal status transition
    InvalidTransition,
    /// Stores diverged after a committed table write
    PartialWrite,
    /// Database or mirror cannot be used
    StorageUnavailable,
    /// Catalog query failure
    Query,
    /// Bad configuration
    Config,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::DuplicateKey => "duplicate-key",
            ErrorKind::NotFound => "not-found",
            ErrorKind::ForeignKey => "foreign-key",
            ErrorKind::InvalidTransition => "invalid-transition",
            ErrorKind::PartialWrite => "partial-write",
            ErrorKind::StorageUnavailable => "storage-unavailable",
            ErrorKind::Query => "query",
            ErrorKind::Config => "config",
        };
        write!(f, "{}", name)
    }
}

impl StoreError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            StoreError::NotFound { .. } | StoreError::AssetNotFound(_) => ErrorKind::NotFound,
            StoreError::ForeignKey { .. } => ErrorKind::ForeignKey,
            StoreError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            StoreError::PartialWrite { .. } => ErrorKind::PartialWrite,
            StoreError::StorageUnavailable(_)
            | StoreError::Database(_)
            | StoreError::Mirror(_)
            | StoreError::Io(_)
            | StoreError::Json(_) => ErrorKind::StorageUnavailable,
            StoreError::Query(_) => ErrorKind::Query,
            StoreError::Config(_) => ErrorKind::Config,
        }
    }

    /// Message suitable for showing to the person who submitted the operation
    pub fn user_message(&self) -> String {
        match self {
            StoreError::Validation(msg) => format!("Please fix the form: {}", msg),
            StoreError::DuplicateKey { column, .. } => {
                format!("{} must be unique. This record already exists.", column)
            }
            StoreError::NotFound { table, id } => {
                format!("No {} record with ID {} exists.", table, id)
            }
            StoreError::ForeignKey { column, value, .. } => {
                format!("{} {} does not match an existing record, or is still in use.", column, value)
            }
            StoreError::InvalidTransition { id, from, to, .. } => {
                format!("Claim {} is {} and cannot be changed to {}.", id, from, to)
            }
            StoreError::PartialWrite { id, .. } => format!(
                "Record {} was saved, but its file copy could not be updated. Run a resync.",
                id
            ),
            StoreError::Query(msg) => format!("Error running query: {}", msg),
            other => format!("Operation failed: {}", other),
        }
    }
}

/// Result type for the core crate
pub type Result<T> = std::result::Result<T, StoreError>;

/// Convert a displayable error to a Validation error
pub fn to_validation_error<E: std::fmt::Display>(err: E) -> StoreError {
    StoreError::Validation(err.to_string())
}

/// Convert a displayable error to a Query error
pub fn to_query_error<E: std::fmt::Display>(err: E) -> StoreError {
    StoreError::Query(err.to_string())
}

/// Convert a displayable error to a Config error
pub fn to_config_error<E: std::fmt::Display>(err: E) -> StoreError {
    StoreError::Config(err.to_string())
}

/// Convert a displayable error to a StorageUnavailable error
pub fn to_storage_error<E: std::fmt::Display>(err: E) -> StoreError {
    StoreError::StorageUnavailable(err.to_string())
}
