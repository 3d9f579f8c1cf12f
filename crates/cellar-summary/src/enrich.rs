//! Cleaning and derived metrics for the vendor summary.

use cellar_core::{Batch, Column, ColumnType, TableSchema, Value};
use crate::{Error, Result, VendorAggregate};

/// Profitability ratios derived from the aggregated totals.
///
/// Computed with plain IEEE-754 division: a zero denominator yields `inf`,
/// `-inf` or `NaN` instead of an error, and the raw result is kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
  pub gross_profit:            f64,
  pub profit_margin:           f64,
  pub stock_turnover:          f64,
  pub sales_to_purchase_ratio: f64,
}

impl DerivedMetrics {
  pub fn compute(
    total_sales_dollars: f64,
    total_purchase_dollars: f64,
    total_sales_quantity: f64,
    total_purchase_quantity: f64,
  ) -> Self {
    let gross_profit = total_sales_dollars - total_purchase_dollars;
    Self {
      gross_profit,
      profit_margin: gross_profit / total_sales_dollars * 100.0,
      stock_turnover: total_sales_quantity / total_purchase_quantity,
      sales_to_purchase_ratio: total_sales_dollars / total_purchase_dollars,
    }
  }
}

/// A finished row of `vendor_sales_summary`.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorSummaryRow {
  pub vendor_number:           Value,
  pub vendor_name:             String,
  pub brand:                   Value,
  pub description:             String,
  pub purchase_price:          f64,
  pub actual_price:            f64,
  pub volume:                  f64,
  pub total_purchase_quantity: f64,
  pub total_purchase_dollars:  f64,
  pub total_sales_quantity:    f64,
  pub total_sales_dollars:     f64,
  pub total_sales_price:       f64,
  pub total_excise_tax:        f64,
  pub freight_cost:            f64,
  pub metrics:                 DerivedMetrics,
}

/// Missing keys become the number zero.
fn fill_key(value: Value) -> Value {
  if value.is_null() { Value::Integer(0) } else { value }
}

/// Missing text becomes the empty string; present text is trimmed.
fn fill_text(value: Option<String>) -> String {
  value.map(|s| s.trim().to_owned()).unwrap_or_default()
}

/// Coerce, zero-fill, trim, and derive the ratios for each aggregate row.
///
/// Order is preserved. The only failure is a Volume that is present but not a
/// number.
pub fn enrich(rows: Vec<VendorAggregate>) -> Result<Vec<VendorSummaryRow>> {
  rows
    .into_iter()
    .enumerate()
    .map(|(idx, row)| enrich_row(idx + 1, row))
    .collect()
}

fn enrich_row(n: usize, row: VendorAggregate) -> Result<VendorSummaryRow> {
  let volume = row
    .volume
    .coerce_f64()
    .map_err(|_| Error::Coercion {
      row:    n,
      column: "Volume",
      value:  row.volume.to_string(),
    })?
    .unwrap_or(0.0);

  let zero = |v: Option<f64>| v.unwrap_or(0.0);
  let total_purchase_quantity = zero(row.total_purchase_quantity);
  let total_purchase_dollars = zero(row.total_purchase_dollars);
  let total_sales_quantity = zero(row.total_sales_quantity);
  let total_sales_dollars = zero(row.total_sales_dollars);

  Ok(VendorSummaryRow {
    vendor_number: fill_key(row.vendor_number),
    vendor_name: fill_text(row.vendor_name),
    brand: fill_key(row.brand),
    description: fill_text(row.description),
    purchase_price: zero(row.purchase_price),
    actual_price: zero(row.actual_price),
    volume,
    total_purchase_quantity,
    total_purchase_dollars,
    total_sales_quantity,
    total_sales_dollars,
    total_sales_price: zero(row.total_sales_price),
    total_excise_tax: zero(row.total_excise_tax),
    freight_cost: zero(row.freight_cost),
    metrics: DerivedMetrics::compute(
      total_sales_dollars,
      total_purchase_dollars,
      total_sales_quantity,
      total_purchase_quantity,
    ),
  })
}

// ─── Output table ────────────────────────────────────────────────────────────

/// Output column names, in table order.
pub const SUMMARY_COLUMNS: [&str; 18] = [
  "VendorNumber",
  "VendorName",
  "Brand",
  "Description",
  "PurchasePrice",
  "ActualPrice",
  "Volume",
  "TotalPurchaseQuantity",
  "TotalPurchaseDollars",
  "TotalSalesQuantity",
  "TotalSalesDollars",
  "TotalSalesPrice",
  "TotalExciseTax",
  "FreightCost",
  "GrossProfit",
  "ProfitMargin",
  "StockTurnover",
  "SalesToPurchaseRatio",
];

impl VendorSummaryRow {
  fn values(&self) -> Vec<Value> {
    let m = &self.metrics;
    let mut values = vec![
      self.vendor_number.clone(),
      Value::from(self.vendor_name.as_str()),
      self.brand.clone(),
      Value::from(self.description.as_str()),
    ];
    values.extend(
      [
        self.purchase_price,
        self.actual_price,
        self.volume,
        self.total_purchase_quantity,
        self.total_purchase_dollars,
        self.total_sales_quantity,
        self.total_sales_dollars,
        self.total_sales_price,
        self.total_excise_tax,
        self.freight_cost,
        m.gross_profit,
        m.profit_margin,
        m.stock_turnover,
        m.sales_to_purchase_ratio,
      ]
      .map(Value::Real),
    );
    values
  }
}

/// Lay the rows out as the `vendor_sales_summary` relation.
///
/// The key columns take whatever type the source tables gave them.
pub fn to_batch(rows: &[VendorSummaryRow]) -> Batch {
  let rows: Vec<Vec<Value>> = rows.iter().map(VendorSummaryRow::values).collect();

  let columns = SUMMARY_COLUMNS
    .iter()
    .enumerate()
    .map(|(idx, name)| {
      let ty = match idx {
        0 | 2 => ColumnType::of_values(rows.iter().map(|r| &r[idx])),
        1 | 3 => ColumnType::Text,
        _ => ColumnType::Real,
      };
      Column::new(*name, ty)
    })
    .collect();

  Batch::new(TableSchema::new(columns), rows)
}
