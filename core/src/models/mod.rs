//! Data models for the record stores
//!
//! This module provides data structures for representing entity tables,
//! their rows and the claim lifecycle.

mod table;
mod row;
mod claim;
mod entity;

pub use table::{
    TableSchema, ColumnType, ColumnDefinition, ForeignKeyRef, StatusRule, DATE_FORMAT,
    TIMESTAMP_FORMAT,
};
pub use row::{Record, Value, ValueType, Fields, Filter};
pub use claim::ClaimStatus;
pub use entity::{EntityKind, Provider, Receiver, FoodListing, Claim};
