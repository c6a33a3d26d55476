//! Flat-file mirror of an entity table
//!
//! The mirror is a delimited file whose header matches the table's column
//! names. Creates append one row; updates and deletes rewrite the file.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use log::debug;

use crate::error::{Result, StoreError};
use crate::models::{Record, TableSchema, Value};

/// Secondary copy of an entity table
#[cfg_attr(test, mockall::automock)]
pub trait RecordMirror {
    /// Whether the mirror has been created
    fn exists(&self) -> bool;

    /// Read every mirrored row
    fn load(&self, schema: &TableSchema) -> Result<Vec<Record>>;

    /// Append one row, creating the mirror with a header if absent
    fn append(&self, schema: &TableSchema, record: &Record) -> Result<()>;

    /// Replace the mirror's content with `records`
    fn rewrite(&self, schema: &TableSchema, records: &[Record]) -> Result<()>;
}

/// CSV-backed mirror
#[derive(Debug, Clone)]
pub struct CsvMirror {
    path: PathBuf,
    delimiter: u8,
}

impl CsvMirror {
    /// Create a mirror at `path`
    pub fn new(path: impl Into<PathBuf>, delimiter: u8) -> Self {
        CsvMirror {
            path: path.into(),
            delimiter,
        }
    }

    /// Path of the mirror file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn is_empty_file(&self) -> bool {
        fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true)
    }

    /// Whether a non-empty file lacks a trailing newline
    fn lacks_final_newline(&self) -> Result<bool> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] != b'\n')
    }
}

impl RecordMirror for CsvMirror {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self, schema: &TableSchema) -> Result<Vec<Record>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let rows = read_rows(&self.path, self.delimiter, schema, false)?;
        rows.into_iter()
            .map(|values| {
                let id = values
                    .first()
                    .and_then(|(_, v)| v.as_i64())
                    .ok_or_else(|| {
                        StoreError::Validation(format!(
                            "{} row without {}",
                            self.path.display(),
                            schema.id_column
                        ))
                    })?;
                Ok(Record::new(schema.name.clone(), id, values))
            })
            .collect()
    }

    fn append(&self, schema: &TableSchema, record: &Record) -> Result<()> {
        self.ensure_parent()?;
        let write_header = self.is_empty_file();
        let unterminated = !write_header && self.lacks_final_newline()?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if unterminated {
            file.write_all(b"\n")?;
        }
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(schema.column_names())?;
        }
        writer.write_record(record.to_cells())?;
        writer.flush()?;

        debug!("Appended {} id {} to {}", schema.name, record.id, self.path.display());
        Ok(())
    }

    fn rewrite(&self, schema: &TableSchema, records: &[Record]) -> Result<()> {
        self.ensure_parent()?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(self.delimiter)
                .from_path(&tmp)?;
            writer.write_record(schema.column_names())?;
            for record in records {
                writer.write_record(record.to_cells())?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!("Rewrote {} with {} rows", self.path.display(), records.len());
        Ok(())
    }
}

/// Read a delimited file into rows of (column, value) in schema order.
///
/// Columns are matched by header name; columns absent from the header come
/// back as `Null`. With `strict`, header names unknown to the schema are an
/// error, otherwise they are ignored.
pub fn read_rows(
    path: &Path,
    delimiter: u8,
    schema: &TableSchema,
    strict: bool,
) -> Result<Vec<Vec<(String, Value)>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();

    if strict {
        if let Some(unknown) = headers.iter().find(|h| !schema.has_column(h)) {
            return Err(StoreError::Validation(format!(
                "{}: column {:?} is not part of {}",
                path.display(),
                unknown,
                schema.name
            )));
        }
    }

    let layout: Vec<(String, Option<usize>)> = schema
        .column_names()
        .into_iter()
        .map(|name| (name.to_string(), headers.iter().position(|h| h == name)))
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut values = Vec::with_capacity(layout.len());
        for (name, index) in &layout {
            let value = match index.and_then(|i| record.get(i)) {
                Some(cell) => schema
                    .column_type(name)
                    .map(|t| t.decode(cell))
                    .unwrap_or_else(|| Ok(Value::Text(cell.to_string())))?,
                None => Value::Null,
            };
            values.push((name.clone(), value));
        }
        rows.push(values);
    }
    Ok(rows)
}
