//! SQL generation
//!
//! Statements are built from a [`TableSchema`]; values are always bound as
//! parameters, only schema-defined identifiers are spliced into the text.

use crate::models::TableSchema;

/// Bookkeeping table holding per-table flags such as the seeding marker
pub const META_TABLE_SQL: &str =
    "CREATE TABLE IF NOT EXISTS store_meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)";

pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// `CREATE TABLE IF NOT EXISTS` statement for a schema
pub fn create_table_sql(schema: &TableSchema) -> String {
    let mut lines = vec![format!(
        "    {} INTEGER PRIMARY KEY AUTOINCREMENT",
        quote(&schema.id_column)
    )];

    for column in &schema.columns {
        let mut line = format!("    {} {}", quote(&column.name), column.column_type.sql_type());
        if column.unique {
            line.push_str(" UNIQUE");
        }
        if let Some(fk) = &column.references {
            line.push_str(&format!(" REFERENCES {}({})", quote(&fk.table), quote(&fk.column)));
        }
        lines.push(line);
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        quote(&schema.name),
        lines.join(",\n")
    )
}

/// `INSERT` statement binding `columns` as `?1..?n`
pub fn insert_sql(schema: &TableSchema, columns: &[&str]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote(c)).collect();
    let params: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(&schema.name),
        names.join(", "),
        params.join(", ")
    )
}

/// `UPDATE` statement binding `columns` as `?1..?n` and the id as `?n+1`
pub fn update_sql(schema: &TableSchema, columns: &[&str]) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", quote(c), i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        quote(&schema.name),
        assignments.join(", "),
        quote(&schema.id_column),
        columns.len() + 1
    )
}

/// `SELECT` of every column in schema order, with optional equality predicates
pub fn select_sql(schema: &TableSchema, predicates: &[&str]) -> String {
    let names: Vec<String> = schema.column_names().iter().map(|c| quote(c)).collect();
    let mut sql = format!("SELECT {} FROM {}", names.join(", "), quote(&schema.name));
    if !predicates.is_empty() {
        let conditions: Vec<String> = predicates
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = ?{}", quote(c), i + 1))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql
}
