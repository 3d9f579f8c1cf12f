//! Replace-then-append loading of a single table.

use std::time::Instant;

use cellar_core::{Batch, TableStore, WriteMode};
use serde::Serialize;

use crate::{Error, Result};

/// Outcome of loading one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableLoad {
  pub table:        String,
  pub file:         String,
  pub rows:         usize,
  pub chunks:       usize,
  pub elapsed_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  /// Nothing written yet; the next push recreates the table.
  Fresh,
  /// The table has been recreated; later pushes append to it.
  Established,
}

/// Two-phase writer for a full refresh of one table.
///
/// The first [`push`](Self::push) replaces the table, dropping whatever a
/// previous run left behind; every later push appends. The phase is tracked
/// here rather than by the caller, so the result does not depend on how the
/// rows were split into batches.
pub struct TableLoader<'s, S: TableStore> {
  store:   &'s mut S,
  table:   String,
  file:    String,
  phase:   Phase,
  rows:    usize,
  chunks:  usize,
  started: Instant,
}

impl<'s, S: TableStore> TableLoader<'s, S> {
  pub fn new(store: &'s mut S, table: impl Into<String>, file: impl Into<String>) -> Self {
    Self {
      store,
      table: table.into(),
      file: file.into(),
      phase: Phase::Fresh,
      rows: 0,
      chunks: 0,
      started: Instant::now(),
    }
  }

  /// Write mode the next push will use.
  pub fn next_mode(&self) -> WriteMode {
    match self.phase {
      Phase::Fresh => WriteMode::Replace,
      Phase::Established => WriteMode::Append,
    }
  }

  /// Write one batch. A failed push leaves the phase unchanged.
  pub fn push(&mut self, batch: &Batch) -> Result<usize> {
    let mode = self.next_mode();
    let written = self
      .store
      .write_table(&self.table, batch, mode)
      .map_err(Error::store)?;

    self.phase = Phase::Established;
    self.rows += written;
    self.chunks += 1;
    tracing::debug!(
      table = %self.table,
      %mode,
      rows = written,
      total = self.rows,
      "chunk ingested"
    );
    Ok(written)
  }

  pub fn finish(self) -> TableLoad {
    TableLoad {
      table:        self.table,
      file:         self.file,
      rows:         self.rows,
      chunks:       self.chunks,
      elapsed_secs: self.started.elapsed().as_secs_f64(),
    }
  }
}
