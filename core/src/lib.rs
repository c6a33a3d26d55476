//! # Food Waste Hub Core
//!
//! Record stores for providers, receivers, food listings and claims.
//! Every entity lives in a SQLite table with a CSV mirror kept in step after
//! each write. A fixed query catalog answers the reporting questions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod assets;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod schema;
pub mod store;

/// Re-export common types for ease of use
pub use config::StoreConfig;
pub use error::{ErrorKind, Result, StoreError};
pub use models::{
    Claim, ClaimStatus, EntityKind, Fields, Filter, FoodListing, Provider, Receiver, Record, Value,
};
pub use query::{CatalogEntry, QueryCatalog, QueryResult};
pub use store::{ClaimStore, Database, FoodListingStore, RecordStore};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
