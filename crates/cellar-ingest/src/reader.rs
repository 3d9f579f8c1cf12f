//! Chunked reading of header-bearing CSV files.

use std::{fs::File, io, path::Path};

use cellar_core::{Batch, TableSchema};
use csv::StringRecord;

use crate::Result;

/// Reads a CSV source in chunks of at most `chunk_size` records.
///
/// Column names come from the header row. Column types are inferred from each
/// chunk's own values; reconciling them with what earlier chunks stored is the
/// store's job, which widens a column when a later chunk needs it.
///
/// A file with a header but no records still yields one empty chunk, so its
/// table is recreated empty.
pub struct ChunkedCsvReader<R> {
  table:      String,
  reader:     csv::Reader<R>,
  header:     Vec<String>,
  chunk_size: usize,
  chunks:     usize,
  rows_read:  usize,
  done:       bool,
}

impl ChunkedCsvReader<File> {
  pub fn open(
    path: impl AsRef<Path>,
    table: impl Into<String>,
    chunk_size: usize,
  ) -> Result<Self> {
    Self::from_reader(File::open(path).map_err(csv::Error::from)?, table, chunk_size)
  }
}

impl<R: io::Read> ChunkedCsvReader<R> {
  pub fn from_reader(
    source: R,
    table: impl Into<String>,
    chunk_size: usize,
  ) -> Result<Self> {
    let mut reader = csv::ReaderBuilder::new()
      .has_headers(true)
      .flexible(true)
      .from_reader(source);
    let header: Vec<String> =
      reader.headers()?.iter().map(str::to_owned).collect();

    Ok(Self {
      table: table.into(),
      reader,
      header,
      chunk_size: chunk_size.max(1),
      chunks: 0,
      rows_read: 0,
      done: false,
    })
  }

  /// Records consumed so far, header excluded.
  pub fn rows_read(&self) -> usize { self.rows_read }

  /// Read the next chunk, or `None` once the source is exhausted.
  pub fn next_chunk(&mut self) -> Result<Option<Batch>> {
    if self.done {
      return Ok(None);
    }

    let mut records: Vec<Vec<String>> = Vec::with_capacity(self.chunk_size);
    let mut record = StringRecord::new();
    while records.len() < self.chunk_size {
      if !self.reader.read_record(&mut record)? {
        self.done = true;
        break;
      }
      records.push(record.iter().map(str::to_owned).collect());
    }

    if records.is_empty() && self.chunks > 0 {
      return Ok(None);
    }

    let schema = TableSchema::infer(&self.header, &records);
    let batch = Batch::from_records(&self.table, schema, &records, self.rows_read + 1)?;
    self.chunks += 1;
    self.rows_read += records.len();

    Ok(Some(batch))
  }
}

impl<R: io::Read> Iterator for ChunkedCsvReader<R> {
  type Item = Result<Batch>;

  fn next(&mut self) -> Option<Self::Item> {
    match self.next_chunk() {
      Ok(chunk) => chunk.map(Ok),
      Err(err) => {
        self.done = true;
        Some(Err(err))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use cellar_core::{ColumnType, Value};

  use super::*;

  const SALES: &str = "\
VendorNo,Brand,SalesQuantity,SalesDollars
1,A,1,15
1,B,2,9.5
2,A,3,4
";

  #[test]
  fn splits_into_bounded_chunks() {
    let reader = ChunkedCsvReader::from_reader(SALES.as_bytes(), "sales", 2).unwrap();
    let chunks: Vec<Batch> = reader.collect::<Result<_>>().unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].len(), 2);
    assert_eq!(chunks[1].len(), 1);
  }

  #[test]
  fn each_chunk_infers_its_own_types() {
    let mut reader =
      ChunkedCsvReader::from_reader(SALES.as_bytes(), "sales", 1).unwrap();
    let first = reader.next_chunk().unwrap().unwrap();
    assert_eq!(first.schema.columns[3].ty, ColumnType::Integer);

    let second = reader.next_chunk().unwrap().unwrap();
    assert_eq!(second.schema.columns[3].ty, ColumnType::Real);
    assert_eq!(second.rows[0][3], Value::Real(9.5));
  }

  #[test]
  fn whole_file_in_one_chunk_widens() {
    let mut reader =
      ChunkedCsvReader::from_reader(SALES.as_bytes(), "sales", 10).unwrap();
    let batch = reader.next_chunk().unwrap().unwrap();
    assert_eq!(batch.schema.columns[3].ty, ColumnType::Real);
    assert_eq!(batch.rows[0][3], Value::Real(15.0));
    assert!(reader.next_chunk().unwrap().is_none());
    assert_eq!(reader.rows_read(), 3);
  }

  #[test]
  fn header_only_yields_one_empty_chunk() {
    let mut reader =
      ChunkedCsvReader::from_reader("Brand,Price\n".as_bytes(), "prices", 10).unwrap();
    let batch = reader.next_chunk().unwrap().unwrap();
    assert!(batch.is_empty());
    assert_eq!(batch.schema.len(), 2);
    assert!(reader.next_chunk().unwrap().is_none());
  }

  #[test]
  fn ragged_record_is_a_schema_error() {
    let src = "Brand,Price\nA,1\nB\n";
    let mut reader = ChunkedCsvReader::from_reader(src.as_bytes(), "prices", 10).unwrap();
    assert!(matches!(
      reader.next_chunk(),
      Err(crate::Error::Schema(cellar_core::Error::FieldCount { row: 2, .. }))
    ));
  }
}
