//! Summary tests against an in-memory SQLite store.

use cellar_core::{
  Batch, Column, ColumnType, TableSchema, TableStore, Value, WriteMode,
};
use cellar_ingest::{ChunkedCsvReader, TableLoader};
use cellar_store_sqlite::SqliteStore;

use crate::{
  DerivedMetrics, Error, SUMMARY_COLUMNS, SUMMARY_TABLE, VendorAggregate,
  VendorSummaryRow, enrich, publish, run, summarize, to_batch,
};

fn store() -> SqliteStore {
  SqliteStore::open_in_memory().expect("in-memory store")
}

/// Load CSV text into `table` the way the ingestion stage would.
fn load(store: &mut SqliteStore, table: &str, csv: &str) {
  load_chunked(store, table, csv, 10_000);
}

fn load_chunked(store: &mut SqliteStore, table: &str, csv: &str, chunk_size: usize) {
  let reader = ChunkedCsvReader::from_reader(csv.as_bytes(), table, chunk_size).unwrap();
  let mut sink = TableLoader::new(store, table, format!("{table}.csv"));
  for chunk in reader {
    sink.push(&chunk.unwrap()).unwrap();
  }
}

fn summary(store: &SqliteStore) -> Vec<VendorSummaryRow> {
  enrich(summarize(store).unwrap()).unwrap()
}

const PURCHASE_HEADER: &str =
  "VendorNumber,VendorName,Brand,Description,PurchasePrice,Quantity,Dollars\n";
const PRICE_HEADER: &str = "Brand,Price,Volume\n";
const SALES_HEADER: &str =
  "VendorNo,Brand,SalesQuantity,SalesDollars,SalesPrice,ExciseTax\n";
const FREIGHT_HEADER: &str = "VendorNumber,Freight\n";

// ─── End to end ──────────────────────────────────────────────────────────────

#[test]
fn three_file_scenario() {
  let mut s = store();
  load(&mut s, "purchases", &format!("{PURCHASE_HEADER}1,ACME,A,Gin,10,2,20\n"));
  load(&mut s, "purchase_prices", &format!("{PRICE_HEADER}A,12,\"750\"\n"));
  load(&mut s, "sales", &format!("{SALES_HEADER}1,A,1,15,15,1\n"));

  let report = run(&mut s).unwrap();
  assert_eq!(report.rows, 1);

  let rows = summary(&s);
  assert_eq!(rows.len(), 1);
  let row = &rows[0];
  assert_eq!(row.vendor_number, Value::Integer(1));
  assert_eq!(row.brand, Value::from("A"));
  assert_eq!(row.total_purchase_dollars, 20.0);
  assert_eq!(row.total_sales_dollars, 15.0);
  assert_eq!(row.metrics.gross_profit, -5.0);
  assert_eq!(row.volume, 750.0);
  assert_eq!(row.actual_price, 12.0);
  assert_eq!(row.freight_cost, 0.0);

  let table = s.read_table(SUMMARY_TABLE).unwrap();
  assert_eq!(table.len(), 1);
  assert_eq!(table.get(0, "GrossProfit"), Some(&Value::Real(-5.0)));
  assert_eq!(table.get(0, "Volume"), Some(&Value::Real(750.0)));
}

#[test]
fn published_table_has_the_output_columns() {
  let mut s = store();
  load(&mut s, "purchases", &format!("{PURCHASE_HEADER}1,ACME,A,Gin,10,2,20\n"));
  load(&mut s, "purchase_prices", &format!("{PRICE_HEADER}A,12,750\n"));
  run(&mut s).unwrap();

  let schema = s.table_schema(SUMMARY_TABLE).unwrap().unwrap();
  assert!(schema.names().eq(SUMMARY_COLUMNS));
}

#[test]
fn rerun_replaces_the_previous_summary() {
  let mut s = store();
  load(
    &mut s,
    "purchases",
    &format!("{PURCHASE_HEADER}1,ACME,A,Gin,10,2,20\n2,BOLD,B,Rum,5,1,5\n"),
  );
  load(&mut s, "purchase_prices", &format!("{PRICE_HEADER}A,12,750\nB,6,1000\n"));

  run(&mut s).unwrap();
  run(&mut s).unwrap();
  assert_eq!(s.row_count(SUMMARY_TABLE).unwrap(), 2);

  load(&mut s, "purchases", &format!("{PURCHASE_HEADER}1,ACME,A,Gin,10,2,20\n"));
  run(&mut s).unwrap();
  assert_eq!(s.row_count(SUMMARY_TABLE).unwrap(), 1);
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

fn fixture() -> SqliteStore {
  let mut s = store();
  load(&mut s, "purchases", &format!(
    "{PURCHASE_HEADER}\
     1,ACME ,A, Gin ,10.0,2,20.0\n\
     1,ACME ,A, Gin ,10.0,3,30.0\n\
     1,ACME ,B,Vodka,5.0,1,5.0\n\
     2,BOLD,A, Gin ,0.0,9,0.0\n\
     2,BOLD,C,Rum,4.0,5,20.0\n\
     3,CASK,Z,Unlisted,7.0,1,7.0\n"
  ));
  load(&mut s, "purchase_prices", &format!(
    "{PRICE_HEADER}A,12.0,750\nB,6.5,1000\nC,5.0,750\n"
  ));
  load(&mut s, "sales", &format!(
    "{SALES_HEADER}\
     1,A,2,30.0,15.0,1.5\n\
     1,A,1,15.0,15.0,0.5\n\
     2,A,4,60.0,15.0,2.0\n"
  ));
  load(&mut s, "vendor_invoice", &format!(
    "{FREIGHT_HEADER}1,3.5\n1,1.5\n2,2.0\n"
  ));
  s
}

#[test]
fn groups_sum_purchases_per_key() {
  let s = fixture();
  let rows = summary(&s);

  let gin = rows
    .iter()
    .find(|r| r.vendor_number == Value::Integer(1) && r.brand == Value::from("A"))
    .unwrap();
  assert_eq!(gin.total_purchase_quantity, 5.0);
  assert_eq!(gin.total_purchase_dollars, 50.0);
  assert_eq!(gin.total_sales_quantity, 3.0);
  assert_eq!(gin.total_sales_dollars, 45.0);
  assert_eq!(gin.total_sales_price, 30.0);
  assert_eq!(gin.total_excise_tax, 2.0);
  // Freight is per vendor, so every brand of vendor 1 carries the full sum.
  assert_eq!(gin.freight_cost, 5.0);
}

#[test]
fn every_filtered_pair_appears_exactly_once() {
  let s = fixture();
  let rows = summary(&s);

  let mut pairs: Vec<(String, String)> = rows
    .iter()
    .map(|r| (r.vendor_number.to_string(), r.brand.to_string()))
    .collect();
  pairs.sort();
  assert_eq!(pairs, vec![
    ("1".to_owned(), "A".to_owned()),
    ("1".to_owned(), "B".to_owned()),
    ("2".to_owned(), "C".to_owned()),
  ]);
}

#[test]
fn zero_price_purchases_never_contribute() {
  let s = fixture();
  let rows = summary(&s);
  // Vendor 2 sold brand A, but only bought it at price zero.
  assert!(
    !rows
      .iter()
      .any(|r| r.vendor_number == Value::Integer(2) && r.brand == Value::from("A"))
  );
}

#[test]
fn zero_price_after_empty_leading_chunk_is_filtered() {
  let purchases = format!(
    "{PURCHASE_HEADER}\
     1,ACME,A,Gin,,2,20\n\
     1,ACME,A,Gin,,1,10\n\
     1,ACME,A,Gin,,1,10\n\
     2,BOLD,A,Gin,0.00,9,0\n"
  );
  for chunk_size in [3, 10_000] {
    let mut s = store();
    load_chunked(&mut s, "purchases", &purchases, chunk_size);
    load(&mut s, "purchase_prices", &format!("{PRICE_HEADER}A,12,750\n"));
    assert!(summary(&s).is_empty(), "chunk size {chunk_size}");
  }
}

#[test]
fn price_filter_compares_numbers_not_text() {
  let mut s = store();
  let purchases = Batch::new(
    TableSchema::new(
      [
        "VendorNumber",
        "VendorName",
        "Brand",
        "Description",
        "PurchasePrice",
        "Quantity",
        "Dollars",
      ]
      .into_iter()
      .map(|name| Column::new(name, ColumnType::Text))
      .collect(),
    ),
    vec![
      ["2", "BOLD", "A", "Gin", "0.00", "9", "0"].map(Value::from).to_vec(),
      ["1", "ACME", "A", "Gin", "10.5", "2", "21"].map(Value::from).to_vec(),
    ],
  );
  s.write_table("purchases", &purchases, WriteMode::Replace).unwrap();
  load(&mut s, "purchase_prices", &format!("{PRICE_HEADER}A,12,750\n"));

  let rows = summary(&s);
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].vendor_number, Value::from("1"));
  assert_eq!(rows[0].total_purchase_dollars, 21.0);
}

#[test]
fn purchases_without_catalog_entry_are_dropped() {
  let s = fixture();
  let rows = summary(&s);
  assert!(!rows.iter().any(|r| r.brand == Value::from("Z")));
}

#[test]
fn unmatched_sales_and_freight_are_zero_filled() {
  let s = fixture();
  let raw = summarize(&s).unwrap();
  let rum = raw.iter().find(|r| r.brand == Value::from("C")).unwrap();
  assert_eq!(rum.total_sales_dollars, None);

  let rows = enrich(raw).unwrap();
  let rum = rows.iter().find(|r| r.brand == Value::from("C")).unwrap();
  assert_eq!(rum.total_sales_quantity, 0.0);
  assert_eq!(rum.total_sales_dollars, 0.0);
  assert_eq!(rum.total_sales_price, 0.0);
  assert_eq!(rum.total_excise_tax, 0.0);
  assert_eq!(rum.freight_cost, 2.0);

  let vodka = summary(&s)
    .into_iter()
    .find(|r| r.brand == Value::from("B"))
    .unwrap();
  assert_eq!(vodka.total_sales_dollars, 0.0);
  assert_eq!(vodka.freight_cost, 5.0);
}

#[test]
fn rows_ordered_by_purchase_dollars() {
  let s = fixture();
  let dollars: Vec<f64> = summary(&s)
    .iter()
    .map(|r| r.total_purchase_dollars)
    .collect();
  assert_eq!(dollars, vec![50.0, 20.0, 5.0]);
}

#[test]
fn ties_break_on_vendor_then_brand() {
  let mut s = store();
  load(&mut s, "purchases", &format!(
    "{PURCHASE_HEADER}\
     2,BOLD,B,Rum,5,2,10\n\
     1,ACME,B,Rum,5,2,10\n\
     1,ACME,A,Gin,5,2,10\n\
     3,CASK,A,Gin,5,4,20\n"
  ));
  load(&mut s, "purchase_prices", &format!("{PRICE_HEADER}A,6,750\nB,6,750\n"));

  let keys: Vec<String> = summary(&s)
    .iter()
    .map(|r| format!("{}{}", r.vendor_number, r.brand))
    .collect();
  assert_eq!(keys, vec!["3A", "1A", "1B", "2B"]);
}

#[test]
fn missing_required_table_is_fatal() {
  let mut s = store();
  load(&mut s, "purchase_prices", &format!("{PRICE_HEADER}A,12,750\n"));
  assert!(matches!(summarize(&s), Err(Error::MissingTable(t)) if t == "purchases"));
  assert!(matches!(run(&mut s), Err(Error::MissingTable(_))));
  assert!(!s.table_exists(SUMMARY_TABLE).unwrap());
}

#[test]
fn empty_purchases_yield_an_empty_summary() {
  let mut s = store();
  load(&mut s, "purchases", PURCHASE_HEADER);
  load(&mut s, "purchase_prices", &format!("{PRICE_HEADER}A,12,750\n"));
  let report = run(&mut s).unwrap();
  assert_eq!(report.rows, 0);
  assert_eq!(s.row_count(SUMMARY_TABLE).unwrap(), 0);
}

// ─── Enrichment ──────────────────────────────────────────────────────────────

fn aggregate() -> VendorAggregate {
  VendorAggregate {
    vendor_number:           Value::Integer(1),
    vendor_name:             Some("  ACME SPIRITS ".to_owned()),
    brand:                   Value::Integer(58),
    description:             Some("Gin 750ml  ".to_owned()),
    purchase_price:          Some(10.0),
    actual_price:            Some(12.0),
    volume:                  Value::from("750"),
    total_purchase_quantity: Some(6.0),
    total_purchase_dollars:  Some(60.0),
    total_sales_quantity:    Some(3.0),
    total_sales_dollars:     Some(100.0),
    total_sales_price:       Some(50.0),
    total_excise_tax:        Some(1.0),
    freight_cost:            Some(2.0),
  }
}

#[test]
fn derived_metrics_from_totals() {
  let m = DerivedMetrics::compute(100.0, 60.0, 3.0, 6.0);
  assert_eq!(m.gross_profit, 40.0);
  assert_eq!(m.profit_margin, 40.0);
  assert_eq!(m.stock_turnover, 0.5);
  assert!((m.sales_to_purchase_ratio - 100.0 / 60.0).abs() < 1e-12);
}

#[test]
fn division_by_zero_keeps_ieee_results() {
  // Nothing bought, five sold.
  let m = DerivedMetrics::compute(50.0, 0.0, 5.0, 0.0);
  assert_eq!(m.stock_turnover, f64::INFINITY);
  assert_eq!(m.sales_to_purchase_ratio, f64::INFINITY);

  // Bought but never sold.
  let m = DerivedMetrics::compute(0.0, 20.0, 0.0, 2.0);
  assert_eq!(m.gross_profit, -20.0);
  assert_eq!(m.profit_margin, f64::NEG_INFINITY);
  assert_eq!(m.stock_turnover, 0.0);

  // Nothing at all.
  let m = DerivedMetrics::compute(0.0, 0.0, 0.0, 0.0);
  assert!(m.profit_margin.is_nan());
  assert!(m.stock_turnover.is_nan());
  assert!(m.sales_to_purchase_ratio.is_nan());
}

#[test]
fn enrich_trims_coerces_and_derives() {
  let row = enrich(vec![aggregate()]).unwrap().remove(0);
  assert_eq!(row.vendor_name, "ACME SPIRITS");
  assert_eq!(row.description, "Gin 750ml");
  assert_eq!(row.volume, 750.0);
  assert_eq!(row.metrics.gross_profit, 40.0);
  assert_eq!(row.metrics.profit_margin, 40.0);
}

#[test]
fn enrich_fills_missing_values_with_zero() {
  let row = enrich(vec![VendorAggregate {
    vendor_number: Value::Null,
    vendor_name: None,
    description: None,
    actual_price: None,
    volume: Value::Null,
    total_sales_quantity: None,
    total_sales_dollars: None,
    total_sales_price: None,
    total_excise_tax: None,
    freight_cost: None,
    ..aggregate()
  }])
  .unwrap()
  .remove(0);

  assert_eq!(row.vendor_number, Value::Integer(0));
  assert_eq!(row.vendor_name, "");
  assert_eq!(row.description, "");
  assert_eq!(row.actual_price, 0.0);
  assert_eq!(row.volume, 0.0);
  assert_eq!(row.total_sales_dollars, 0.0);
  assert_eq!(row.freight_cost, 0.0);
  assert_eq!(row.metrics.profit_margin, f64::NEG_INFINITY);
}

#[test]
fn non_numeric_volume_aborts_enrichment() {
  let err = enrich(vec![
    aggregate(),
    VendorAggregate { volume: Value::from("Unknown"), ..aggregate() },
  ])
  .unwrap_err();
  assert!(matches!(err, Error::Coercion { row: 2, column: "Volume", .. }));
}

#[test]
fn publish_stores_infinities() {
  let mut s = store();
  let mut rows = enrich(vec![aggregate()]).unwrap();
  rows[0].metrics = DerivedMetrics::compute(50.0, 0.0, 5.0, 0.0);
  publish(&mut s, &to_batch(&rows)).unwrap();

  let table = s.read_table(SUMMARY_TABLE).unwrap();
  assert_eq!(table.get(0, "StockTurnover"), Some(&Value::Real(f64::INFINITY)));
  assert_eq!(table.get(0, "Brand"), Some(&Value::Integer(58)));
}
