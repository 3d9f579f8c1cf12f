//! The three-way vendor/brand aggregation.
//!
//! Purchases are joined to the price catalog and grouped per vendor, brand and
//! price point; sales are grouped per vendor and brand; freight is grouped per
//! vendor. The purchase side drives the result: sales and freight are attached
//! with left joins, so a purchase group without sales or freight still
//! appears, with those totals absent.

use cellar_core::{Batch, TableStore, Value};

use crate::{Error, Result};

pub const PURCHASES_TABLE: &str = "purchases";
pub const PRICES_TABLE: &str = "purchase_prices";
pub const SALES_TABLE: &str = "sales";
pub const FREIGHT_TABLE: &str = "vendor_invoice";

/// Relations the purchase-side join cannot do without.
pub const REQUIRED_TABLES: [&str; 2] = [PURCHASES_TABLE, PRICES_TABLE];

/// Left-joined relations; when absent their totals are simply missing.
pub const OPTIONAL_TABLES: [&str; 2] = [SALES_TABLE, FREIGHT_TABLE];

const FREIGHT_SUMMARY: &str = "
FreightSummary AS (
    SELECT VendorNumber, SUM(Freight) AS FreightCost
    FROM vendor_invoice
    GROUP BY VendorNumber
)";

const EMPTY_FREIGHT_SUMMARY: &str = "
FreightSummary AS (
    SELECT NULL AS VendorNumber, NULL AS FreightCost
    WHERE 0
)";

/// Purchase rows with a non-positive or missing price are left out, and so are
/// purchases whose brand has no catalog entry (inner join). The price is
/// compared as a number whatever type its column was stored with.
const PURCHASE_SUMMARY: &str = "
PurchaseSummary AS (
    SELECT
        p.VendorNumber,
        p.VendorName,
        p.Brand,
        p.Description,
        p.PurchasePrice,
        pp.Price AS ActualPrice,
        pp.Volume,
        SUM(p.Quantity) AS TotalPurchaseQuantity,
        SUM(p.Dollars) AS TotalPurchaseDollars
    FROM purchases p
    JOIN purchase_prices pp ON p.Brand = pp.Brand
    WHERE CAST(p.PurchasePrice AS REAL) > 0
    GROUP BY p.VendorNumber, p.VendorName, p.Brand, p.Description,
             p.PurchasePrice, pp.Price, pp.Volume
)";

const SALES_SUMMARY: &str = "
SalesSummary AS (
    SELECT
        VendorNo,
        Brand,
        SUM(SalesQuantity) AS TotalSalesQuantity,
        SUM(SalesDollars) AS TotalSalesDollars,
        SUM(SalesPrice) AS TotalSalesPrice,
        SUM(ExciseTax) AS TotalExciseTax
    FROM sales
    GROUP BY VendorNo, Brand
)";

const EMPTY_SALES_SUMMARY: &str = "
SalesSummary AS (
    SELECT NULL AS VendorNo, NULL AS Brand,
           NULL AS TotalSalesQuantity, NULL AS TotalSalesDollars,
           NULL AS TotalSalesPrice, NULL AS TotalExciseTax
    WHERE 0
)";

/// Rows are ordered by purchase dollars, largest first. Ties fall back to the
/// grouping key in ascending order so reruns produce the same order.
const SUMMARY_SELECT: &str = "
SELECT
    ps.VendorNumber,
    ps.VendorName,
    ps.Brand,
    ps.Description,
    ps.PurchasePrice,
    ps.ActualPrice,
    ps.Volume,
    ps.TotalPurchaseQuantity,
    ps.TotalPurchaseDollars,
    ss.TotalSalesQuantity,
    ss.TotalSalesDollars,
    ss.TotalSalesPrice,
    ss.TotalExciseTax,
    fs.FreightCost
FROM PurchaseSummary ps
LEFT JOIN SalesSummary ss
    ON ps.VendorNumber = ss.VendorNo AND ps.Brand = ss.Brand
LEFT JOIN FreightSummary fs
    ON ps.VendorNumber = fs.VendorNumber
ORDER BY ps.TotalPurchaseDollars DESC,
         ps.VendorNumber, ps.Brand, ps.PurchasePrice, ps.ActualPrice,
         ps.Volume, ps.VendorName, ps.Description
";

/// Build the summary query. An absent sales or freight relation is replaced
/// by an empty one of the same shape.
pub fn summary_query(has_sales: bool, has_freight: bool) -> String {
  let freight = if has_freight { FREIGHT_SUMMARY } else { EMPTY_FREIGHT_SUMMARY };
  let sales = if has_sales { SALES_SUMMARY } else { EMPTY_SALES_SUMMARY };
  format!("WITH{freight},{PURCHASE_SUMMARY},{sales}{SUMMARY_SELECT}")
}

// ─── Aggregate rows ──────────────────────────────────────────────────────────

/// One row of the summary query, before enrichment.
///
/// Sales and freight totals are `None` when the vendor/brand had no matching
/// rows on that side. Volume is kept as stored; the catalog often holds it as
/// text.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorAggregate {
  pub vendor_number:           Value,
  pub vendor_name:             Option<String>,
  pub brand:                   Value,
  pub description:             Option<String>,
  pub purchase_price:          Option<f64>,
  pub actual_price:            Option<f64>,
  pub volume:                  Value,
  pub total_purchase_quantity: Option<f64>,
  pub total_purchase_dollars:  Option<f64>,
  pub total_sales_quantity:    Option<f64>,
  pub total_sales_dollars:     Option<f64>,
  pub total_sales_price:       Option<f64>,
  pub total_excise_tax:        Option<f64>,
  pub freight_cost:            Option<f64>,
}

/// Column positions of the query result, resolved once per batch.
struct Layout([usize; 14]);

impl Layout {
  const COLUMNS: [&'static str; 14] = [
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
  ];

  fn resolve(batch: &Batch) -> Result<Self> {
    let mut idx = [0; 14];
    for (slot, name) in idx.iter_mut().zip(Self::COLUMNS) {
      *slot = batch.schema.index_of(name).ok_or(Error::MissingColumn(name))?;
    }
    Ok(Self(idx))
  }
}

fn text(value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::Text(s) => Some(s.clone()),
    other => Some(other.to_string()),
  }
}

fn number(value: &Value, row: usize, column: &'static str) -> Result<Option<f64>> {
  value.coerce_f64().map_err(|_| Error::Coercion {
    row,
    column,
    value: value.to_string(),
  })
}

impl VendorAggregate {
  /// Decode the rows of a [`summary_query`] result.
  pub fn from_batch(batch: &Batch) -> Result<Vec<Self>> {
    let Layout(at) = Layout::resolve(batch)?;
    let cols = Layout::COLUMNS;

    batch
      .rows
      .iter()
      .enumerate()
      .map(|(idx, row)| -> Result<Self> {
        let n = idx + 1;
        let num = |i: usize| number(&row[at[i]], n, cols[i]);
        Ok(Self {
          vendor_number:           row[at[0]].clone(),
          vendor_name:             text(&row[at[1]]),
          brand:                   row[at[2]].clone(),
          description:             text(&row[at[3]]),
          purchase_price:          num(4)?,
          actual_price:            num(5)?,
          volume:                  row[at[6]].clone(),
          total_purchase_quantity: num(7)?,
          total_purchase_dollars:  num(8)?,
          total_sales_quantity:    num(9)?,
          total_sales_dollars:     num(10)?,
          total_sales_price:       num(11)?,
          total_excise_tax:        num(12)?,
          freight_cost:            num(13)?,
        })
      })
      .collect()
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Run the summary query and return the raw result set.
///
/// Fails if purchases or the price catalog are missing. Missing sales or
/// freight relations, and empty relations of any kind, only mean fewer rows
/// or missing totals.
pub fn summary_batch<S: TableStore>(store: &S) -> Result<Batch> {
  let exists = |table: &str| store.table_exists(table).map_err(Error::store);

  for table in REQUIRED_TABLES {
    if !exists(table)? {
      return Err(Error::MissingTable(table.to_owned()));
    }
  }

  let has_sales = exists(SALES_TABLE)?;
  let has_freight = exists(FREIGHT_TABLE)?;
  for (table, present) in OPTIONAL_TABLES.into_iter().zip([has_sales, has_freight]) {
    if !present {
      tracing::warn!(table, "table missing, its totals will be zero");
    }
  }

  store
    .query(&summary_query(has_sales, has_freight))
    .map_err(Error::store)
}

/// Aggregate purchases, sales and freight into one row per vendor/brand
/// grouping key, ordered by total purchase dollars.
pub fn summarize<S: TableStore>(store: &S) -> Result<Vec<VendorAggregate>> {
  VendorAggregate::from_batch(&summary_batch(store)?)
}
