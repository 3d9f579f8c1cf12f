//! The two pipeline stages, as run by the binaries.

use std::process::ExitCode;

use anyhow::Context as _;
use cellar_ingest::{BulkLoader, LoadReport};
use cellar_store_sqlite::SqliteStore;
use cellar_summary::SummaryReport;

use crate::PipelineConfig;

/// How a stage ended, as reported to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Success,
  /// The stage ran to the end but some sources were not loaded.
  Incomplete,
}

impl Status {
  pub fn of_load(report: &LoadReport) -> Self {
    if report.is_clean() { Self::Success } else { Self::Incomplete }
  }
}

impl From<Status> for ExitCode {
  fn from(status: Status) -> Self {
    match status {
      Status::Success => ExitCode::SUCCESS,
      Status::Incomplete => ExitCode::FAILURE,
    }
  }
}

fn open_store(cfg: &PipelineConfig) -> anyhow::Result<SqliteStore> {
  SqliteStore::open(&cfg.database_path)
    .with_context(|| format!("failed to open store at {:?}", cfg.database_path))
}

/// Load every source file into the database.
///
/// Only fatal errors are returned; per-file failures are in the report.
pub fn ingest(cfg: &PipelineConfig) -> anyhow::Result<LoadReport> {
  let mut store = open_store(cfg)?;
  let report = BulkLoader::new(cfg.chunk_size)
    .load(&mut store, &cfg.source_dir)
    .with_context(|| format!("failed to load {:?}", cfg.source_dir))?;

  if !report.is_clean() {
    tracing::warn!(failed = report.failures.len(), "some files were not loaded");
  }
  Ok(report)
}

/// Rebuild `vendor_sales_summary` from the loaded tables.
pub fn summarize(cfg: &PipelineConfig) -> anyhow::Result<SummaryReport> {
  let mut store = open_store(cfg)?;
  cellar_summary::run(&mut store).context("vendor summary failed")
}
