//! [`SqliteStore`], the SQLite implementation of [`TableStore`].

use std::{borrow::Cow, path::Path};

use cellar_core::{
  Batch, Column, ColumnType, TableSchema, TableStore, Value, WriteMode,
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Error, Result,
  encode::{
    copy_rows_sql, create_table_sql, decode_decl_type, decode_value, encode_value,
    insert_sql, quote_ident,
  },
};

/// Suffix of the temporary name a table takes while it is rebuilt.
const STAGING_SUFFIX: &str = "__cellar_widening";

const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Cellar table store backed by a single SQLite file.
///
/// Owns its connection; callers pass the store explicitly to each stage and
/// drop it to release the database.
pub struct SqliteStore {
  conn: Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = Connection::open(path).map_err(|source| Error::Open {
      path: path.to_path_buf(),
      source,
    })?;
    conn.execute_batch(PRAGMAS)?;
    Ok(Self { conn })
  }

  /// Open an in-memory store, used by tests.
  pub fn open_in_memory() -> Result<Self> {
    Ok(Self { conn: Connection::open_in_memory()? })
  }
}

/// Declared schema of `table`, read from `pragma_table_info`.
fn stored_schema(conn: &Connection, table: &str) -> Result<Option<TableSchema>> {
  let exists = conn
    .query_row(
      "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
      [table],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if !exists {
    return Ok(None);
  }

  let mut stmt =
    conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
  let columns = stmt
    .query_map([table], |row| {
      let name: String = row.get(0)?;
      let decl: String = row.get(1)?;
      Ok(Column::new(name, decode_decl_type(&decl)))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(TableSchema::new(columns)))
}

/// Recreate `table` with the wider `schema`, keeping its rows in order.
///
/// SQLite cannot change a column's declared type in place. The old rows are
/// copied across and converted by the new columns' affinity.
fn rebuild_table(conn: &Connection, table: &str, schema: &TableSchema) -> Result<()> {
  let staging = format!("{table}{STAGING_SUFFIX}");
  conn.execute(
    &format!("ALTER TABLE {} RENAME TO {}", quote_ident(table), quote_ident(&staging)),
    [],
  )?;
  conn.execute(&create_table_sql(table, schema), [])?;
  conn.execute(&copy_rows_sql(&staging, table, schema), [])?;
  conn.execute(&format!("DROP TABLE {}", quote_ident(&staging)), [])?;
  Ok(())
}

fn insert_rows(conn: &Connection, table: &str, batch: &Batch) -> Result<usize> {
  let mut stmt = conn.prepare_cached(&insert_sql(table, &batch.schema))?;
  for row in &batch.rows {
    stmt.execute(rusqlite::params_from_iter(row.iter().map(encode_value)))?;
  }
  Ok(batch.len())
}

// ─── TableStore impl ─────────────────────────────────────────────────────────

impl TableStore for SqliteStore {
  type Error = Error;

  fn write_table(
    &mut self,
    table: &str,
    batch: &Batch,
    mode: WriteMode,
  ) -> Result<usize> {
    if batch.schema.is_empty() {
      return Err(Error::NoColumns(table.to_owned()));
    }

    let tx = self.conn.transaction()?;

    let rows: Cow<'_, Batch> = match mode {
      WriteMode::Replace => {
        tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)), [])?;
        tx.execute(&create_table_sql(table, &batch.schema), [])?;
        Cow::Borrowed(batch)
      }
      WriteMode::Append => match stored_schema(&tx, table)? {
        Some(stored) => {
          let widened = batch.widened_schema(table, &stored)?;
          if widened != stored {
            rebuild_table(&tx, table, &widened)?;
            tracing::debug!(table, "widened column types");
          }
          Cow::Owned(batch.conform_to(table, &widened)?)
        }
        None => {
          tx.execute(&create_table_sql(table, &batch.schema), [])?;
          Cow::Borrowed(batch)
        }
      },
    };

    let inserted = insert_rows(&tx, table, &rows)?;
    tx.commit()?;

    tracing::debug!(table, %mode, rows = inserted, "wrote table");
    Ok(inserted)
  }

  fn table_schema(&self, table: &str) -> Result<Option<TableSchema>> {
    stored_schema(&self.conn, table)
  }

  fn row_count(&self, table: &str) -> Result<u64> {
    if stored_schema(&self.conn, table)?.is_none() {
      return Err(Error::TableNotFound(table.to_owned()));
    }
    let count: i64 = self.conn.query_row(
      &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
      [],
      |row| row.get(0),
    )?;
    Ok(count as u64)
  }

  fn read_table(&self, table: &str) -> Result<Batch> {
    let schema = stored_schema(&self.conn, table)?
      .ok_or_else(|| Error::TableNotFound(table.to_owned()))?;

    let mut stmt = self
      .conn
      .prepare(&format!("SELECT * FROM {} ORDER BY rowid", quote_ident(table)))?;
    let width = schema.len();
    let rows = stmt
      .query_map([], |row| {
        (0..width)
          .map(|idx| row.get_ref(idx).map(decode_value))
          .collect::<rusqlite::Result<Vec<_>>>()
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Batch::new(schema, rows))
  }

  fn query(&self, sql: &str) -> Result<Batch> {
    let mut stmt = self.conn.prepare(sql)?;
    let names: Vec<String> =
      stmt.column_names().into_iter().map(str::to_owned).collect();
    let width = names.len();

    let rows: Vec<Vec<Value>> = stmt
      .query_map([], |row| {
        (0..width)
          .map(|idx| row.get_ref(idx).map(decode_value))
          .collect::<rusqlite::Result<Vec<_>>>()
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    let columns = names
      .into_iter()
      .enumerate()
      .map(|(idx, name)| {
        let ty = ColumnType::of_values(rows.iter().filter_map(|row| row.get(idx)));
        Column::new(name, ty)
      })
      .collect();

    Ok(Batch::new(TableSchema::new(columns), rows))
  }
}
