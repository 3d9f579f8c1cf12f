//! Vendor profitability summary.
//!
//! Reads the loaded `purchases`, `purchase_prices`, `sales` and
//! `vendor_invoice` tables, aggregates them per vendor and brand, derives
//! profitability ratios, and publishes the result as `vendor_sales_summary`.

mod aggregate;
mod enrich;

pub mod error;

use std::time::Instant;

use cellar_core::{Batch, TableStore, WriteMode};
use serde::Serialize;

pub use aggregate::{
  FREIGHT_TABLE, OPTIONAL_TABLES, PRICES_TABLE, PURCHASES_TABLE,
  REQUIRED_TABLES, SALES_TABLE, VendorAggregate, summarize, summary_batch,
  summary_query,
};
pub use enrich::{DerivedMetrics, SUMMARY_COLUMNS, VendorSummaryRow, enrich, to_batch};
pub use error::{Error, Result};

/// Name of the published table.
pub const SUMMARY_TABLE: &str = "vendor_sales_summary";

/// Rows shown in each log preview.
const PREVIEW_ROWS: usize = 5;

/// Outcome of a summary run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
  pub table:        &'static str,
  pub rows:         usize,
  pub elapsed_secs: f64,
}

/// Replace `vendor_sales_summary` with `cleaned`, a batch laid out by
/// [`to_batch`].
pub fn publish<S: TableStore>(store: &mut S, cleaned: &Batch) -> Result<usize> {
  store
    .write_table(SUMMARY_TABLE, cleaned, WriteMode::Replace)
    .map_err(Error::store)
}

/// Run the whole summary stage: aggregate, enrich, publish.
///
/// Any failure aborts the stage before the previous summary table is touched.
pub fn run<S: TableStore>(store: &mut S) -> Result<SummaryReport> {
  let started = Instant::now();

  tracing::info!("Creating vendor summary table...");
  let raw = summary_batch(store)?;
  tracing::info!("Preview:\n{}", raw.head(PREVIEW_ROWS));

  tracing::info!("Cleaning vendor summary data...");
  let rows = enrich(VendorAggregate::from_batch(&raw)?)?;
  let cleaned = to_batch(&rows);
  tracing::info!("Preview after cleaning:\n{}", cleaned.head(PREVIEW_ROWS));

  tracing::info!("Ingesting cleaned data into DB...");
  let written = publish(store, &cleaned)?;
  tracing::info!(table = SUMMARY_TABLE, rows = written, "Ingestion completed successfully.");

  let elapsed_secs = started.elapsed().as_secs_f64();
  tracing::info!("Total execution time: {elapsed_secs:.2} seconds");

  Ok(SummaryReport { table: SUMMARY_TABLE, rows: written, elapsed_secs })
}

#[cfg(test)]
mod tests;
