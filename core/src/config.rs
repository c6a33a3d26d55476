//! Configuration for the record stores
//!
//! This module provides the paths and options a [`crate::store::Database`]
//! is opened with.

use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};

use crate::error::{to_config_error, Result, StoreError};
use crate::models::EntityKind;

/// Mirror file names, one per entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorFiles {
    /// Providers mirror
    pub providers: String,

    /// Receivers mirror
    pub receivers: String,

    /// Food listings mirror
    pub food_listings: String,

    /// Claims mirror
    pub claims: String,
}

impl Default for MirrorFiles {
    fn default() -> Self {
        MirrorFiles {
            providers: "providers_data.csv".to_string(),
            receivers: "receivers_data.csv".to_string(),
            food_listings: "food_listings_data.csv".to_string(),
            claims: "claims_data.csv".to_string(),
        }
    }
}

impl MirrorFiles {
    /// File name for an entity
    pub fn file_name(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Provider => &self.providers,
            EntityKind::Receiver => &self.receivers,
            EntityKind::FoodListing => &self.food_listings,
            EntityKind::Claim => &self.claims,
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Directory holding the mirror files
    pub data_dir: PathBuf,

    /// Mirror file names
    #[serde(default)]
    pub mirror_files: MirrorFiles,

    /// Directory holding seed files; the mirror files seed the tables when unset
    #[serde(default)]
    pub seed_dir: Option<PathBuf>,

    /// Mirror field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Whether SQLite enforces foreign keys
    #[serde(default = "default_true")]
    pub enforce_foreign_keys: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database_path: PathBuf::from("data/food_waste.db"),
            data_dir: PathBuf::from("data"),
            mirror_files: MirrorFiles::default(),
            seed_dir: None,
            delimiter: default_delimiter(),
            enforce_foreign_keys: true,
            log_level: default_log_level(),
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration keeping the database and mirrors together in `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        StoreConfig {
            database_path: dir.join("food_waste.db"),
            data_dir: dir.to_path_buf(),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: StoreConfig = serde_json::from_reader(file).map_err(to_config_error)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Create a development configuration
    pub fn development() -> Self {
        let mut config = Self::default();
        config.log_level = "debug".to_string();
        config
    }

    /// Create a testing configuration rooted at `dir`
    pub fn testing(dir: impl AsRef<Path>) -> Self {
        let mut config = Self::in_dir(dir);
        config.log_level = "debug".to_string();
        config
    }

    /// Check the configuration for values the stores cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(StoreError::Config("database_path is empty".to_string()));
        }
        if self.database_path == Path::new(":memory:") {
            return Err(StoreError::Config(
                "database_path must be a file; an in-memory database cannot back persistent mirrors"
                    .to_string(),
            ));
        }
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '"' | '\n' | '\r') {
            return Err(StoreError::Config(format!(
                "delimiter {:?} must be a single ASCII character other than a quote or newline",
                self.delimiter
            )));
        }
        for kind in EntityKind::ALL {
            if self.mirror_files.file_name(kind).is_empty() {
                return Err(StoreError::Config(format!("mirror file for {} is empty", kind)));
            }
        }
        Ok(())
    }

    /// Mirror file of an entity
    pub fn mirror_path(&self, kind: EntityKind) -> PathBuf {
        self.data_dir.join(self.mirror_files.file_name(kind))
    }

    /// Seed file of an entity
    pub fn seed_path(&self, kind: EntityKind) -> PathBuf {
        match &self.seed_dir {
            Some(dir) => dir.join(self.mirror_files.file_name(kind)),
            None => self.mirror_path(kind),
        }
    }

    /// Mirror delimiter as a byte
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }
}
