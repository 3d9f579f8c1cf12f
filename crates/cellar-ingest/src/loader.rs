//! [`BulkLoader`] loads every source file in a directory.

use std::{
  path::{Path, PathBuf},
  time::Instant,
};

use cellar_core::TableStore;
use serde::Serialize;

use crate::{ChunkedCsvReader, Error, Result, TableLoad, TableLoader};

/// Records per chunk unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Only files with this suffix are loaded.
pub const SOURCE_EXTENSION: &str = ".csv";

// ─── Report ──────────────────────────────────────────────────────────────────

/// A file whose ingestion was abandoned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFailure {
  pub file:  String,
  pub table: String,
  pub error: String,
}

/// Summary of one loader run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
  pub tables:       Vec<TableLoad>,
  pub failures:     Vec<FileFailure>,
  pub elapsed_secs: f64,
}

impl LoadReport {
  pub fn is_clean(&self) -> bool { self.failures.is_empty() }

  pub fn total_rows(&self) -> usize { self.tables.iter().map(|t| t.rows).sum() }
}

// ─── Discovery ───────────────────────────────────────────────────────────────

/// Source files in `dir` paired with their table names, sorted by file name.
///
/// The table name is the file name with [`SOURCE_EXTENSION`] stripped.
/// Subdirectories and non-UTF-8 names are skipped.
pub fn source_files(dir: &Path) -> Result<Vec<(PathBuf, String)>> {
  let to_err =
    |source: std::io::Error| Error::SourceDirectory { path: dir.to_path_buf(), source };

  let mut files = Vec::new();
  for entry in std::fs::read_dir(dir).map_err(to_err)? {
    let entry = entry.map_err(to_err)?;
    if !entry.file_type().map_err(to_err)?.is_file() {
      continue;
    }
    let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
      continue;
    };
    if let Some(table) = name.strip_suffix(SOURCE_EXTENSION)
      && !table.is_empty()
    {
      files.push((entry.path(), table.to_owned()));
    }
  }
  files.sort();
  Ok(files)
}

fn file_label(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string())
}

// ─── Loader ──────────────────────────────────────────────────────────────────

/// Loads a directory of CSV files into a [`TableStore`], one table per file.
#[derive(Debug, Clone, Copy)]
pub struct BulkLoader {
  chunk_size: usize,
}

impl Default for BulkLoader {
  fn default() -> Self { Self::new(DEFAULT_CHUNK_SIZE) }
}

impl BulkLoader {
  pub fn new(chunk_size: usize) -> Self { Self { chunk_size: chunk_size.max(1) } }

  /// Load every source file in `source_dir`.
  ///
  /// Only an unreadable directory is an error. A file that fails part way is
  /// recorded in the report and left with whatever its last successful chunk
  /// wrote; the remaining files are still loaded.
  pub fn load<S: TableStore>(&self, store: &mut S, source_dir: &Path) -> Result<LoadReport> {
    let started = Instant::now();
    let files = source_files(source_dir)?;
    tracing::info!(dir = %source_dir.display(), files = files.len(), "starting ingestion");

    let mut report = LoadReport::default();
    for (path, table) in files {
      match self.load_file(store, &path, &table) {
        Ok(load) => report.tables.push(load),
        Err(err) => {
          let file = file_label(&path);
          tracing::error!(%file, %table, error = %err, "ingestion failed");
          report.failures.push(FileFailure { file, table, error: err.to_string() });
        }
      }
    }

    report.elapsed_secs = started.elapsed().as_secs_f64();
    tracing::info!(
      tables = report.tables.len(),
      failures = report.failures.len(),
      rows = report.total_rows(),
      "---------------ingestion complete----------------"
    );
    tracing::info!("Total time taken: {:.2} minutes", report.elapsed_secs / 60.0);
    Ok(report)
  }

  /// Load one file into `table`, replacing its previous contents.
  pub fn load_file<S: TableStore>(
    &self,
    store: &mut S,
    path: &Path,
    table: &str,
  ) -> Result<TableLoad> {
    let file = file_label(path);
    tracing::info!(%file, %table, "starting ingestion for file");

    let reader = ChunkedCsvReader::open(path, table, self.chunk_size)?;
    let mut sink = TableLoader::new(store, table, file.clone());
    for chunk in reader {
      sink.push(&chunk?)?;
    }

    let load = sink.finish();
    tracing::info!(
      %file,
      %table,
      rows = load.rows,
      chunks = load.chunks,
      elapsed_secs = load.elapsed_secs,
      "finished ingestion for file"
    );
    Ok(load)
  }
}
