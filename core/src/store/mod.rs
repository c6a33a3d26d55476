//! Dual-persistence record stores
//!
//! A [`RecordStore`] owns one entity table. The SQLite table is the source of
//! truth; after every committed mutation the change is mirrored to a flat
//! file through a [`RecordMirror`].

mod mirror;
mod seed;
mod database;
mod claims;
mod listings;

pub use mirror::{RecordMirror, CsvMirror, read_rows};
pub use seed::{SeedOutcome, SeedSource};
pub use database::Database;
pub use claims::ClaimStore;
pub use listings::FoodListingStore;

#[cfg(test)]
pub use mirror::MockRecordMirror;

use log::{debug, warn};
use rusqlite::{params_from_iter, Connection, ErrorCode, OptionalExtension, Row};

use crate::error::{Result, StoreError};
use crate::models::{Fields, Filter, Record, TableSchema, Value};
use crate::schema::{self, quote, SchemaValidator, ValidatedFields};

/// Build a record from a row selected with [`schema::select_sql`]
pub(crate) fn row_to_record(schema: &TableSchema, row: &Row<'_>) -> rusqlite::Result<Record> {
    let mut values = Vec::with_capacity(schema.columns.len() + 1);
    for (i, name) in schema.column_names().into_iter().enumerate() {
        values.push((name.to_string(), row.get::<_, Value>(i)?));
    }
    let id = values.first().and_then(|(_, v)| v.as_i64()).unwrap_or_default();
    Ok(Record::new(schema.name.clone(), id, values))
}

/// Fetch one row by identifier
pub(crate) fn fetch_record(conn: &Connection, schema: &TableSchema, id: i64) -> Result<Option<Record>> {
    let sql = schema::select_sql(schema, &[schema.id_column.as_str()]);
    let record = conn
        .query_row(&sql, [id], |row| row_to_record(schema, row))
        .optional()?;
    Ok(record)
}

/// Translate SQLite constraint failures into store errors
fn map_constraint_error(schema: &TableSchema, err: rusqlite::Error, values: &[(String, Value)]) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            if message.contains("UNIQUE") {
                let column = message
                    .rsplit('.')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                let value = values
                    .iter()
                    .find(|(name, _)| *name == column)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default();
                return StoreError::DuplicateKey {
                    table: schema.name.clone(),
                    column,
                    value,
                };
            }
            if message.contains("FOREIGN KEY") {
                return StoreError::ForeignKey {
                    table: schema.name.clone(),
                    column: schema.id_column.clone(),
                    value: message.clone(),
                };
            }
        }
    }
    StoreError::Database(err)
}

/// Create/read/update/delete for one entity table plus its mirror
pub struct RecordStore<'a, M: RecordMirror = CsvMirror> {
    conn: &'a Connection,
    schema: TableSchema,
    mirror: M,
    enforce_foreign_keys: bool,
}

impl<'a, M: RecordMirror> RecordStore<'a, M> {
    /// Create a store over an open connection
    pub fn new(conn: &'a Connection, schema: TableSchema, mirror: M) -> Self {
        RecordStore {
            conn,
            schema,
            mirror,
            enforce_foreign_keys: true,
        }
    }

    /// Enable or disable foreign key checks
    pub fn with_foreign_keys(mut self, enforce: bool) -> Self {
        self.enforce_foreign_keys = enforce;
        self
    }

    /// Schema of the table
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// The mirror
    pub fn mirror(&self) -> &M {
        &self.mirror
    }

    pub(crate) fn connection(&self) -> &'a Connection {
        self.conn
    }

    /// Identifier the next `create` will be assigned.
    ///
    /// Read from SQLite's AUTOINCREMENT counter, so deleted ids are never offered again.
    pub fn next_id(&self) -> Result<i64> {
        let seq: Option<i64> = self
            .conn
            .query_row(
                "SELECT seq FROM sqlite_sequence WHERE name = ?1",
                [&self.schema.name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seq.map(|s| s + 1).unwrap_or(1))
    }

    /// Insert a record and mirror it. Returns the assigned identifier.
    pub fn create(&self, fields: &Fields) -> Result<i64> {
        let validated = SchemaValidator::validate_create(&self.schema, fields)?;
        self.check_unique(&validated, None)?;
        self.check_references(&validated)?;

        let columns: Vec<&str> = validated.iter().map(|(name, _)| name.as_str()).collect();
        let sql = schema::insert_sql(&self.schema, &columns);
        self.conn
            .execute(&sql, params_from_iter(validated.iter().map(|(_, v)| v)))
            .map_err(|e| map_constraint_error(&self.schema, e, &validated))?;
        let id = self.conn.last_insert_rowid();

        let mut values = vec![(self.schema.id_column.clone(), Value::Integer(id))];
        values.extend(validated);
        let record = Record::new(self.schema.name.clone(), id, values);

        debug!("Created {} id {}", self.schema.name, id);
        self.mirror
            .append(&self.schema, &record)
            .map_err(|e| self.partial_write(id, e))?;
        Ok(id)
    }

    /// Get a record by identifier
    pub fn get(&self, id: i64) -> Result<Option<Record>> {
        fetch_record(self.conn, &self.schema, id)
    }

    fn require(&self, id: i64) -> Result<Record> {
        self.get(id)?.ok_or_else(|| StoreError::NotFound {
            table: self.schema.name.clone(),
            id,
        })
    }

    /// Overwrite the given fields of a record, then the same fields in the mirror
    pub fn update(&self, id: i64, fields: &Fields) -> Result<()> {
        let current = self.require(id)?;
        let validated = SchemaValidator::validate_update(&self.schema, fields)?;
        self.check_transition(&current, &validated)?;
        self.check_unique(&validated, Some(id))?;
        self.check_references(&validated)?;

        let columns: Vec<&str> = validated.iter().map(|(name, _)| name.as_str()).collect();
        let sql = schema::update_sql(&self.schema, &columns);
        let mut params: Vec<Value> = validated.iter().map(|(_, v)| v.clone()).collect();
        params.push(Value::Integer(id));
        let changed = self
            .conn
            .execute(&sql, params_from_iter(params.iter()))
            .map_err(|e| map_constraint_error(&self.schema, e, &validated))?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                table: self.schema.name.clone(),
                id,
            });
        }

        debug!("Updated {} id {}: {:?}", self.schema.name, id, columns);
        self.mirror_update(id, &validated)
            .map_err(|e| self.partial_write(id, e))
    }

    fn mirror_update(&self, id: i64, validated: &ValidatedFields) -> Result<()> {
        let mut rows = self.mirror.load(&self.schema)?;
        match rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                for (column, value) in validated {
                    row.set(column, value.clone());
                }
                self.mirror.rewrite(&self.schema, &rows)
            }
            None => {
                warn!(
                    "{} id {} missing from mirror; exporting the whole table",
                    self.schema.name, id
                );
                self.resync_mirror().map(|_| ())
            }
        }
    }

    /// Remove a record from the table and the mirror
    pub fn delete(&self, id: i64) -> Result<()> {
        self.require(id)?;

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote(&self.schema.name),
            quote(&self.schema.id_column)
        );
        self.conn.execute(&sql, [id]).map_err(|e| {
            match map_constraint_error(&self.schema, e, &[]) {
                StoreError::ForeignKey { table, column, .. } => StoreError::ForeignKey {
                    table,
                    column,
                    value: format!("{} is still referenced", id),
                },
                other => other,
            }
        })?;

        debug!("Deleted {} id {}", self.schema.name, id);
        self.mirror_delete(id).map_err(|e| self.partial_write(id, e))
    }

    fn mirror_delete(&self, id: i64) -> Result<()> {
        let mut rows = self.mirror.load(&self.schema)?;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            warn!("{} id {} was not in the mirror", self.schema.name, id);
        }
        self.mirror.rewrite(&self.schema, &rows)
    }

    /// Most recently created record
    pub fn latest(&self) -> Result<Option<Record>> {
        let sql = format!(
            "{} ORDER BY {} DESC LIMIT 1",
            schema::select_sql(&self.schema, &[]),
            quote(&self.schema.id_column)
        );
        let record = self
            .conn
            .query_row(&sql, [], |row| row_to_record(&self.schema, row))
            .optional()?;
        Ok(record)
    }

    /// Records matching every predicate, in table scan order
    pub fn list(&self, filter: &Filter) -> Result<Vec<Record>> {
        SchemaValidator::validate_filter(&self.schema, filter)?;
        let columns: Vec<&str> = filter.iter().map(|(name, _)| name.as_str()).collect();
        let sql = schema::select_sql(&self.schema, &columns);
        self.query_records(&sql, filter.iter().map(|(_, v)| v))
    }

    /// Number of rows in the table
    pub fn count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote(&self.schema.name));
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// Rows currently in the mirror
    pub fn mirror_rows(&self) -> Result<Vec<Record>> {
        self.mirror.load(&self.schema)
    }

    /// Rewrite the mirror from the table, ordered by identifier.
    ///
    /// Recovery path after a [`StoreError::PartialWrite`]. Returns the number of rows written.
    pub fn resync_mirror(&self) -> Result<usize> {
        let sql = format!(
            "{} ORDER BY {}",
            schema::select_sql(&self.schema, &[]),
            quote(&self.schema.id_column)
        );
        let rows = self.query_records(&sql, std::iter::empty::<&Value>())?;
        self.mirror.rewrite(&self.schema, &rows)?;
        debug!("Exported {} rows of {} to the mirror", rows.len(), self.schema.name);
        Ok(rows.len())
    }

    fn query_records<'v>(&self, sql: &str, params: impl Iterator<Item = &'v Value>) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| row_to_record(&self.schema, row))?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn check_unique(&self, validated: &[(String, Value)], exclude: Option<i64>) -> Result<()> {
        for column in self.schema.unique_columns() {
            let value = match validated.iter().find(|(name, _)| *name == column.name) {
                Some((_, value)) if !value.is_blank() => value,
                _ => continue,
            };
            let sql = format!(
                "SELECT {id} FROM {table} WHERE {col} = ?1 AND {id} != ?2 LIMIT 1",
                id = quote(&self.schema.id_column),
                table = quote(&self.schema.name),
                col = quote(&column.name)
            );
            let clash: Option<i64> = self
                .conn
                .query_row(&sql, rusqlite::params![value, exclude.unwrap_or(0)], |row| row.get(0))
                .optional()?;
            if clash.is_some() {
                return Err(StoreError::DuplicateKey {
                    table: self.schema.name.clone(),
                    column: column.name.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_references(&self, validated: &[(String, Value)]) -> Result<()> {
        if !self.enforce_foreign_keys {
            return Ok(());
        }
        for (column, fk) in self.schema.foreign_keys() {
            let value = match validated.iter().find(|(name, _)| *name == column.name) {
                Some((_, value)) if !value.is_blank() => value,
                _ => continue,
            };
            let sql = format!(
                "SELECT 1 FROM {} WHERE {} = ?1",
                quote(&fk.table),
                quote(&fk.column)
            );
            let found: Option<i64> = self
                .conn
                .query_row(&sql, [value], |row| row.get(0))
                .optional()?;
            if found.is_none() {
                return Err(StoreError::ForeignKey {
                    table: self.schema.name.clone(),
                    column: column.name.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_transition(&self, current: &Record, validated: &[(String, Value)]) -> Result<()> {
        let rule = match &self.schema.status_rule {
            Some(rule) => rule,
            None => return Ok(()),
        };
        let next = match validated.iter().find(|(name, _)| *name == rule.column) {
            Some((_, value)) => value.to_string(),
            None => return Ok(()),
        };
        let from = current.get(&rule.column).map(|v| v.to_string()).unwrap_or_default();
        if rule.allows(&from, &next) {
            Ok(())
        } else {
            Err(StoreError::InvalidTransition {
                table: self.schema.name.clone(),
                id: current.id,
                from,
                to: next,
            })
        }
    }

    fn partial_write(&self, id: i64, err: StoreError) -> StoreError {
        warn!(
            "{} id {} committed to the database but the mirror write failed: {}",
            self.schema.name, id, err
        );
        StoreError::PartialWrite {
            table: self.schema.name.clone(),
            id,
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityKind, Provider};
    use crate::schema::{create_table_sql, table_schema};
    use proptest::prelude::*;
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, Connection) {
        let dir = tempdir().unwrap();
        let conn = Connection::open(dir.path().join("test.db")).unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON").unwrap();
        for kind in EntityKind::ALL {
            conn.execute(&create_table_sql(&table_schema(kind)), []).unwrap();
        }
        (dir, conn)
    }

    fn providers<'a>(dir: &TempDir, conn: &'a Connection) -> RecordStore<'a> {
        RecordStore::new(
            conn,
            table_schema(EntityKind::Provider),
            CsvMirror::new(dir.path().join("providers.csv"), b','),
        )
    }

    fn acme(contact: &str) -> Fields {
        Provider::fields("Acme Foods", "Restaurant", "1 Main St", "Springfield", contact)
    }

    fn table_rows(store: &RecordStore<'_, impl RecordMirror>) -> Vec<Record> {
        let mut rows = store.list(&Filter::new()).unwrap();
        rows.sort_by_key(|r| r.id);
        rows
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let (dir, conn) = setup();
        let store = providers(&dir, &conn);

        assert_eq!(store.next_id().unwrap(), 1);
        assert_eq!(store.create(&acme("555-0100")).unwrap(), 1);
        assert_eq!(store.next_id().unwrap(), 2);
        assert_eq!(store.create(&acme("555-0101")).unwrap(), 2);

        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest.id, 2);
        assert_eq!(latest.text("Contact"), Some("555-0101"));
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let (dir, conn) = setup();
        let store = providers(&dir, &conn);

        store.create(&acme("555-0100")).unwrap();
        let id = store.create(&acme("555-0101")).unwrap();
        store.delete(id).unwrap();

        assert_eq!(store.next_id().unwrap(), 3);
        assert_eq!(store.create(&acme("555-0102")).unwrap(), 3);
    }

    #[test]
    fn test_duplicate_contact_writes_nothing() {
        let (dir, conn) = setup();
        let store = providers(&dir, &conn);
        store.create(&acme("555-0100")).unwrap();

        let err = store.create(&acme("555-0100")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { ref column, .. } if column == "Contact"));
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.mirror_rows().unwrap().len(), 1);
    }

    #[test]
    fn test_update_rejects_collision_with_other_record() {
        let (dir, conn) = setup();
        let store = providers(&dir, &conn);
        let first = store.create(&acme("555-0100")).unwrap();
        let second = store.create(&acme("555-0101")).unwrap();

        let mut fields = Fields::new();
        fields.insert("Contact".to_string(), Value::from("555-0100"));
        assert!(matches!(store.update(second, &fields), Err(StoreError::DuplicateKey { .. })));

        // Re-submitting a record's own contact is not a collision
        assert!(store.update(first, &fields).is_ok());
        assert_eq!(table_rows(&store), store.mirror_rows().unwrap());
    }

    #[test]
    fn test_update_and_delete_keep_mirror_in_sync() {
        let (dir, conn) = setup();
        let store = providers(&dir, &conn);
        let a = store.create(&acme("555-0100")).unwrap();
        let b = store.create(&acme("555-0101")).unwrap();

        let mut fields = Fields::new();
        fields.insert("City".to_string(), Value::from("Shelbyville"));
        store.update(a, &fields).unwrap();
        assert_eq!(store.get(a).unwrap().unwrap().text("City"), Some("Shelbyville"));
        assert_eq!(table_rows(&store), store.mirror_rows().unwrap());

        store.delete(b).unwrap();
        assert_eq!(table_rows(&store), store.mirror_rows().unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_missing_ids() {
        let (dir, conn) = setup();
        let store = providers(&dir, &conn);
        let id = store.create(&acme("555-0100")).unwrap();
        store.delete(id).unwrap();

        let mut fields = Fields::new();
        fields.insert("City".to_string(), Value::from("Shelbyville"));
        assert!(matches!(store.update(id, &fields), Err(StoreError::NotFound { id: 1, .. })));
        assert!(matches!(store.delete(id), Err(StoreError::NotFound { .. })));
        assert!(store.latest().unwrap().is_none());
    }

    #[test]
    fn test_list_filters_exact_match() {
        let (dir, conn) = setup();
        let store = providers(&dir, &conn);
        store.create(&acme("555-0100")).unwrap();
        store
            .create(&Provider::fields("Bo's Deli", "Grocery Store", "2 Elm", "Capital City", "555-0200"))
            .unwrap();

        let filter = vec![("City".to_string(), Value::from("Capital City"))];
        let rows = store.list(&filter).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("Name"), Some("Bo's Deli"));

        assert_eq!(store.list(&Filter::new()).unwrap().len(), 2);
        assert!(store.list(&vec![("Town".to_string(), Value::from("x"))]).is_err());
    }

    #[test]
    fn test_mirror_update_falls_back_to_export_on_drift() {
        let (dir, conn) = setup();
        let store = providers(&dir, &conn);
        let id = store.create(&acme("555-0100")).unwrap();
        store.mirror().rewrite(store.schema(), &[]).unwrap();

        let mut fields = Fields::new();
        fields.insert("Name".to_string(), Value::from("Acme Fresh"));
        store.update(id, &fields).unwrap();

        assert_eq!(table_rows(&store), store.mirror_rows().unwrap());
    }

    #[test]
    fn test_mirror_failure_reports_partial_write() {
        let (_dir, conn) = setup();
        let mut mirror = MockRecordMirror::new();
        mirror
            .expect_append()
            .returning(|_, _| Err(StoreError::StorageUnavailable("disk full".to_string())));
        let store = RecordStore::new(&conn, table_schema(EntityKind::Provider), mirror);

        let err = store.create(&acme("555-0100")).unwrap_err();
        assert!(matches!(err, StoreError::PartialWrite { id: 1, .. }));
        // The table write is not rolled back; the stores have diverged
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_update_reports_partial_write_when_rewrite_fails() {
        let (dir, conn) = setup();
        let id = providers(&dir, &conn).create(&acme("555-0100")).unwrap();
        let row = providers(&dir, &conn).get(id).unwrap().unwrap();

        let mut mirror = MockRecordMirror::new();
        mirror.expect_load().returning(move |_| Ok(vec![row.clone()]));
        mirror
            .expect_rewrite()
            .returning(|_, _| Err(StoreError::StorageUnavailable("read-only file".to_string())));
        let store = RecordStore::new(&conn, table_schema(EntityKind::Provider), mirror);

        let mut fields = Fields::new();
        fields.insert("City".to_string(), Value::from("Shelbyville"));
        let err = store.update(id, &fields).unwrap_err();
        assert!(matches!(err, StoreError::PartialWrite { id: 1, .. }));
        // The table keeps the new value while the mirror still has the old one
        assert_eq!(store.get(id).unwrap().unwrap().text("City"), Some("Shelbyville"));
        assert_eq!(providers(&dir, &conn).mirror_rows().unwrap()[0].text("City"), Some("Springfield"));
    }

    #[test]
    fn test_delete_reports_partial_write_when_mirror_unreadable() {
        let (dir, conn) = setup();
        let id = providers(&dir, &conn).create(&acme("555-0100")).unwrap();

        let mut mirror = MockRecordMirror::new();
        mirror
            .expect_load()
            .returning(|_| Err(StoreError::StorageUnavailable("permission denied".to_string())));
        mirror.expect_rewrite().never();
        let store = RecordStore::new(&conn, table_schema(EntityKind::Provider), mirror);

        let err = store.delete(id).unwrap_err();
        assert!(matches!(err, StoreError::PartialWrite { id: 1, .. }));
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(providers(&dir, &conn).mirror_rows().unwrap().len(), 1);
    }

    #[test]
    fn test_padded_contact_is_still_a_duplicate() {
        let (dir, conn) = setup();
        let store = providers(&dir, &conn);
        store.create(&acme("555-0100")).unwrap();

        assert!(matches!(
            store.create(&acme("555-0100 ")),
            Err(StoreError::DuplicateKey { .. })
        ));
        let id = store.create(&acme(" 555-0101")).unwrap();
        assert_eq!(store.get(id).unwrap().unwrap().text("Contact"), Some("555-0101"));
        assert_eq!(table_rows(&store), store.mirror_rows().unwrap());
    }

    #[test]
    fn test_validation_failure_never_touches_mirror() {
        let (_dir, conn) = setup();
        let mut mirror = MockRecordMirror::new();
        mirror.expect_append().never();
        let store = RecordStore::new(&conn, table_schema(EntityKind::Provider), mirror);

        let mut fields = acme("555-0100");
        fields.insert("Name".to_string(), Value::from(""));
        assert!(matches!(store.create(&fields), Err(StoreError::Validation(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_resync_repairs_mirror() {
        let (dir, conn) = setup();
        let store = providers(&dir, &conn);
        store.create(&acme("555-0100")).unwrap();
        store.create(&acme("555-0101")).unwrap();
        std::fs::remove_file(store.mirror().path()).unwrap();

        assert_eq!(store.resync_mirror().unwrap(), 2);
        assert_eq!(table_rows(&store), store.mirror_rows().unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_create_ids_increase_by_one(count in 1usize..12) {
            let (dir, conn) = setup();
            let store = providers(&dir, &conn);

            let mut previous = 0;
            for i in 0..count {
                let id = store.create(&acme(&format!("555-{:04}", i))).unwrap();
                prop_assert_eq!(id, previous + 1);
                previous = id;
            }
            prop_assert_eq!(store.latest().unwrap().map(|r| r.id), Some(previous));
            prop_assert_eq!(store.mirror_rows().unwrap().len(), count);
        }
    }
}
