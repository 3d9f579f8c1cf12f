//! Conversions between the Cellar value model and SQLite.
//!
//! Identifiers come from source file headers and file names, so they are
//! always quoted. Column types map to SQLite storage classes one to one.

use cellar_core::{Column, ColumnType, TableSchema, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Double-quote an identifier, doubling any embedded quotes.
pub fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

// ─── Values ──────────────────────────────────────────────────────────────────

pub fn encode_value(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Integer(i) => SqlValue::Integer(*i),
    Value::Real(r) => SqlValue::Real(*r),
    Value::Text(s) => SqlValue::Text(s.clone()),
  }
}

pub fn decode_value(value: ValueRef<'_>) -> Value {
  match value {
    ValueRef::Null => Value::Null,
    ValueRef::Integer(i) => Value::Integer(i),
    ValueRef::Real(r) => Value::Real(r),
    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
      Value::Text(String::from_utf8_lossy(bytes).into_owned())
    }
  }
}

// ─── Types ───────────────────────────────────────────────────────────────────

/// Column type for a declared SQL type, following SQLite's affinity rules.
pub fn decode_decl_type(decl: &str) -> ColumnType {
  let decl = decl.to_ascii_uppercase();
  if decl.contains("INT") {
    ColumnType::Integer
  } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
    ColumnType::Text
  } else {
    // REAL or NUMERIC affinity, or no declared type at all.
    ColumnType::Real
  }
}

// ─── Statements ──────────────────────────────────────────────────────────────

pub fn create_table_sql(table: &str, schema: &TableSchema) -> String {
  let columns: Vec<String> = schema
    .columns
    .iter()
    .map(|Column { name, ty }| format!("{} {ty}", quote_ident(name)))
    .collect();
  format!("CREATE TABLE {} ({})", quote_ident(table), columns.join(", "))
}

pub fn insert_sql(table: &str, schema: &TableSchema) -> String {
  let names: Vec<String> = schema.names().map(quote_ident).collect();
  let params: Vec<String> = (1..=schema.len()).map(|i| format!("?{i}")).collect();
  format!(
    "INSERT INTO {} ({}) VALUES ({})",
    quote_ident(table),
    names.join(", "),
    params.join(", ")
  )
}

/// Copy every row of `from` into `to`, in rowid order.
pub fn copy_rows_sql(from: &str, to: &str, schema: &TableSchema) -> String {
  let names: Vec<String> = schema.names().map(quote_ident).collect();
  let names = names.join(", ");
  format!(
    "INSERT INTO {} ({names}) SELECT {names} FROM {} ORDER BY rowid",
    quote_ident(to),
    quote_ident(from)
  )
}
