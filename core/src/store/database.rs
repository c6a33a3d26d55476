//! Database handle
//!
//! Opens the SQLite file, initializes the four entity tables in dependency
//! order and hands out per-entity stores.

use std::fs;
use std::path::Path;
use log::info;
use rusqlite::Connection;

use super::{ClaimStore, CsvMirror, FoodListingStore, RecordStore, SeedOutcome, SeedSource};
use crate::config::StoreConfig;
use crate::error::{to_storage_error, Result, StoreError};
use crate::models::EntityKind;
use crate::query::{QueryCatalog, QueryResult};
use crate::schema::table_schema;

/// An open store: one SQLite connection plus the mirror layout
pub struct Database {
    conn: Connection,
    config: StoreConfig,
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir)
        .map_err(|e| to_storage_error(format!("cannot create {}: {}", dir.display(), e)))
}

impl Database {
    /// Open the store described by `config`, creating and seeding tables on first use
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        if let Some(parent) = config.database_path.parent() {
            ensure_dir(parent)?;
        }
        ensure_dir(&config.data_dir)?;

        let conn = Connection::open(&config.database_path).map_err(|e| {
            to_storage_error(format!("cannot open {}: {}", config.database_path.display(), e))
        })?;
        conn.pragma_update(None, "foreign_keys", config.enforce_foreign_keys)?;

        let db = Database { conn, config };
        for kind in EntityKind::ALL {
            let seed = SeedSource {
                path: db.config.seed_path(kind),
                delimiter: db.config.delimiter_byte(),
                is_mirror: db.config.seed_dir.is_none(),
            };
            let store = db.store(kind);
            match store.initialize(Some(&seed))? {
                SeedOutcome::Seeded(_) | SeedOutcome::AlreadySeeded => {}
                outcome => info!("{} initialized: {:?}", kind, outcome),
            }
        }

        info!("Opened store at {}", db.config.database_path.display());
        Ok(db)
    }

    /// Configuration the store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Record store of an entity
    pub fn store(&self, kind: EntityKind) -> RecordStore<'_> {
        RecordStore::new(
            &self.conn,
            table_schema(kind),
            CsvMirror::new(self.config.mirror_path(kind), self.config.delimiter_byte()),
        )
        .with_foreign_keys(self.config.enforce_foreign_keys)
    }

    /// Providers
    pub fn providers(&self) -> RecordStore<'_> {
        self.store(EntityKind::Provider)
    }

    /// Receivers
    pub fn receivers(&self) -> RecordStore<'_> {
        self.store(EntityKind::Receiver)
    }

    /// Food listings
    pub fn food_listings(&self) -> FoodListingStore<'_> {
        FoodListingStore::new(self.store(EntityKind::FoodListing), self.providers())
    }

    /// Claims
    pub fn claims(&self) -> ClaimStore<'_> {
        ClaimStore::new(self.store(EntityKind::Claim))
    }

    /// Run a catalog entry by number
    pub fn run_query(&self, number: u32, param: Option<&str>) -> Result<QueryResult> {
        let entry = QueryCatalog::find(number)
            .ok_or_else(|| StoreError::Query(format!("no query numbered {}", number)))?;
        QueryCatalog::execute(&self.conn, entry, param)
    }

    /// Cities known from providers and receivers
    pub fn cities(&self) -> Result<Vec<String>> {
        QueryCatalog::cities(&self.conn)
    }
}
