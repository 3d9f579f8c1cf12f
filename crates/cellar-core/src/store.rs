//! The `TableStore` trait.
//!
//! Implemented by storage backends (e.g. `cellar-store-sqlite`). The loader
//! and the summary engine depend on this abstraction and receive the store
//! handle explicitly; there is no process-wide connection.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Batch, TableSchema};

/// How [`TableStore::write_table`] treats an existing table.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
  /// Drop any existing table, recreate it from the batch schema, then insert.
  Replace,
  /// Insert into the existing table, conforming rows to its stored schema.
  /// Creates the table when it does not exist yet.
  Append,
}

/// A SQL-capable relational store holding whole named tables.
///
/// Exactly one writer uses a store at a time; methods that write take
/// `&mut self`.
pub trait TableStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Write `batch` into `table`. Each call is all-or-nothing: either every
  /// row lands or the table is left as it was. Returns the number of rows
  /// inserted.
  fn write_table(
    &mut self,
    table: &str,
    batch: &Batch,
    mode: WriteMode,
  ) -> Result<usize, Self::Error>;

  /// Schema a table was created with, or `None` if there is no such table.
  fn table_schema(&self, table: &str) -> Result<Option<TableSchema>, Self::Error>;

  /// Number of rows currently in `table`.
  fn row_count(&self, table: &str) -> Result<u64, Self::Error>;

  /// Every row of `table`, in insertion order.
  fn read_table(&self, table: &str) -> Result<Batch, Self::Error>;

  /// Run a read-only SQL query and collect the result set.
  fn query(&self, sql: &str) -> Result<Batch, Self::Error>;

  fn table_exists(&self, table: &str) -> Result<bool, Self::Error> {
    Ok(self.table_schema(table)?.is_some())
  }
}
