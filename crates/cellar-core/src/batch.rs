//! In-memory relations.
//!
//! A [`Batch`] is a schema plus rows of [`Value`]s. The loader produces one per
//! chunk of a source file, the store returns one per query, and the summary
//! engine publishes its result as one.

use std::fmt;

use crate::{Column, ColumnType, Error, Result, TableSchema, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
  pub schema: TableSchema,
  pub rows:   Vec<Vec<Value>>,
}

impl Batch {
  pub fn new(schema: TableSchema, rows: Vec<Vec<Value>>) -> Self {
    Self { schema, rows }
  }

  /// Parse raw records against `schema`.
  ///
  /// `first_row` is the 1-based position of `records[0]` in its source and is
  /// only used in error messages. Fails on the first record that has the wrong
  /// field count or a field that does not fit its column type.
  pub fn from_records<R: AsRef<[String]>>(
    table: &str,
    schema: TableSchema,
    records: &[R],
    first_row: usize,
  ) -> Result<Self> {
    let rows = records
      .iter()
      .enumerate()
      .map(|(offset, record)| {
        let record = record.as_ref();
        let row = first_row + offset;
        if record.len() != schema.len() {
          return Err(Error::FieldCount {
            table: table.to_owned(),
            row,
            expected: schema.len(),
            found: record.len(),
          });
        }
        schema
          .columns
          .iter()
          .zip(record)
          .map(|(column, raw)| {
            column.ty.parse(raw).ok_or_else(|| Error::Coercion {
              table: table.to_owned(),
              row,
              column: column.name.clone(),
              value: format!("{raw:?}"),
              expected: column.ty,
            })
          })
          .collect::<Result<Vec<_>>>()
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Self { schema, rows })
  }

  fn check_names(&self, table: &str, stored: &TableSchema) -> Result<()> {
    if self.schema.same_names(stored) {
      return Ok(());
    }
    Err(Error::ColumnMismatch {
      table:  table.to_owned(),
      stored: stored.names().map(str::to_owned).collect(),
      batch:  self.schema.names().map(str::to_owned).collect(),
    })
  }

  /// `stored` with each column widened just enough to hold this batch's
  /// values. Column names must match in order.
  pub fn widened_schema(&self, table: &str, stored: &TableSchema) -> Result<TableSchema> {
    self.check_names(table, stored)?;
    let columns = stored
      .columns
      .iter()
      .enumerate()
      .map(|(idx, column)| {
        let ty = self
          .rows
          .iter()
          .filter_map(|row| row.get(idx))
          .filter_map(ColumnType::of_value)
          .fold(column.ty, ColumnType::widen);
        Column::new(column.name.clone(), ty)
      })
      .collect();
    Ok(TableSchema::new(columns))
  }

  /// Re-type every row to `stored`, the schema an existing table was created
  /// with. Column names must match in order.
  pub fn conform_to(&self, table: &str, stored: &TableSchema) -> Result<Self> {
    self.check_names(table, stored)?;

    let rows = self
      .rows
      .iter()
      .enumerate()
      .map(|(idx, row)| {
        stored
          .columns
          .iter()
          .zip(row)
          .map(|(column, value)| {
            value.conform(column.ty).ok_or_else(|| Error::Coercion {
              table: table.to_owned(),
              row: idx + 1,
              column: column.name.clone(),
              value: format!("{value:?}"),
              expected: column.ty,
            })
          })
          .collect::<Result<Vec<_>>>()
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Self { schema: stored.clone(), rows })
  }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Cell at `row`, looked up by column name.
  pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
    let idx = self.schema.index_of(column)?;
    self.rows.get(row)?.get(idx)
  }

  /// Text rendering of the first `n` rows, for log snapshots.
  pub fn head(&self, n: usize) -> Preview<'_> { Preview { batch: self, n } }
}

/// Column-aligned table of a batch's leading rows. See [`Batch::head`].
pub struct Preview<'a> {
  batch: &'a Batch,
  n:     usize,
}

impl fmt::Display for Preview<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let header: Vec<String> =
      self.batch.schema.names().map(str::to_owned).collect();
    let body: Vec<Vec<String>> = self
      .batch
      .rows
      .iter()
      .take(self.n)
      .map(|row| row.iter().map(ToString::to_string).collect())
      .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
      for (w, cell) in widths.iter_mut().zip(row) {
        *w = (*w).max(cell.chars().count());
      }
    }

    let line = |cells: &[String], f: &mut fmt::Formatter<'_>| -> fmt::Result {
      let rendered: Vec<String> = cells
        .iter()
        .zip(&widths)
        .map(|(cell, &w)| format!("{cell:>w$}"))
        .collect();
      writeln!(f, "{}", rendered.join("  ").trim_end())
    };

    line(&header, f)?;
    for row in &body {
      line(row, f)?;
    }
    write!(f, "[{} rows x {} columns]", self.batch.len(), self.batch.schema.len())
  }
}
