//! One-time population of empty tables
//!
//! Whether a table has been seeded is remembered in `store_meta`, so a table
//! emptied by deletions stays empty across restarts.

use std::path::PathBuf;
use chrono::Local;
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension};

use super::{read_rows, RecordMirror, RecordStore};
use crate::error::Result;
use crate::models::{TableSchema, TIMESTAMP_FORMAT};
use crate::schema::{create_table_sql, insert_sql, META_TABLE_SQL};

/// Where initial rows come from
#[derive(Debug, Clone)]
pub struct SeedSource {
    /// Seed file
    pub path: PathBuf,

    /// Field delimiter of the seed file
    pub delimiter: u8,

    /// Whether the seed file is also the table's mirror
    pub is_mirror: bool,
}

/// What `initialize` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Seeded on an earlier open
    AlreadySeeded,

    /// Rows loaded from the seed file
    Seeded(usize),

    /// No seed file to load from
    NoSeedFile,

    /// The table already had rows
    TableNotEmpty,
}

fn seed_key(schema: &TableSchema) -> String {
    format!("seeded:{}", schema.name)
}

/// Rows loaded, and whether any of them was given an id by the table
fn bulk_load(conn: &Connection, schema: &TableSchema, seed: &SeedSource) -> Result<(usize, bool)> {
    let rows = read_rows(&seed.path, seed.delimiter, schema, false)?;
    let columns = schema.column_names();
    let sql = insert_sql(schema, &columns);
    let mut stmt = conn.prepare(&sql)?;
    let mut assigned_ids = false;
    for row in &rows {
        assigned_ids |= row.first().and_then(|(_, id)| id.as_i64()).is_none();
        stmt.execute(rusqlite::params_from_iter(row.iter().map(|(_, v)| v)))?;
    }
    Ok((rows.len(), assigned_ids))
}

/// Whether the file's header lists the schema's columns in schema order
fn has_schema_header(seed: &SeedSource, schema: &TableSchema) -> Result<bool> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(seed.delimiter)
        .from_path(&seed.path)?;
    Ok(reader.headers()?.iter().eq(schema.column_names()))
}

impl<'a, M: RecordMirror> RecordStore<'a, M> {
    /// Create the table if absent and seed it on first use.
    ///
    /// Loading and setting the seeded flag happen in one transaction. The
    /// mirror is exported from the table when it was not the seed file, when
    /// the seed left it out of step (blank ids or a reordered header), or
    /// when it is missing while the table has rows.
    pub fn initialize(&self, seed: Option<&SeedSource>) -> Result<SeedOutcome> {
        let conn = self.connection();
        let schema = self.schema();
        conn.execute(META_TABLE_SQL, [])?;
        conn.execute(&create_table_sql(schema), [])?;

        let key = seed_key(schema);
        let flagged: Option<String> = conn
            .query_row("SELECT value FROM store_meta WHERE key = ?1", [&key], |row| row.get(0))
            .optional()?;

        let mut stale_mirror = false;
        let outcome = match flagged {
            Some(at) => {
                debug!("{} was seeded at {}", schema.name, at);
                SeedOutcome::AlreadySeeded
            }
            None => {
                let tx = conn.unchecked_transaction()?;
                let outcome = if self.count()? > 0 {
                    SeedOutcome::TableNotEmpty
                } else {
                    match seed.filter(|s| s.path.is_file()) {
                        Some(source) => {
                            let (loaded, assigned_ids) = bulk_load(&tx, schema, source)?;
                            stale_mirror = assigned_ids
                                || (source.is_mirror && !has_schema_header(source, schema)?);
                            SeedOutcome::Seeded(loaded)
                        }
                        None => SeedOutcome::NoSeedFile,
                    }
                };
                tx.execute(
                    "INSERT OR REPLACE INTO store_meta (key, value) VALUES (?1, ?2)",
                    params![key, Local::now().format(TIMESTAMP_FORMAT).to_string()],
                )?;
                tx.commit()?;
                outcome
            }
        };

        if let (SeedOutcome::Seeded(n), Some(source)) = (outcome, seed) {
            info!("Seeded {} rows into {} from {}", n, schema.name, source.path.display());
        }

        let seeded_elsewhere = matches!(
            (outcome, seed),
            (SeedOutcome::Seeded(_), Some(SeedSource { is_mirror: false, .. }))
        );
        if stale_mirror {
            warn!("{} seed file does not match the mirror layout; re-exporting", schema.name);
        }
        if seeded_elsewhere || stale_mirror || (!self.mirror().exists() && self.count()? > 0) {
            let written = self.resync_mirror()?;
            info!("Exported {} rows of {} to its mirror", written, schema.name);
        }

        Ok(outcome)
    }
}
