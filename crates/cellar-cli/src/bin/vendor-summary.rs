//! Summary stage.
//!
//! Aggregates the loaded purchase, price, sales and freight tables into
//! `vendor_sales_summary`.
//!
//! ```
//! cargo run -p cellar-cli --bin vendor-summary -- --database inventory.db
//! ```

use cellar_cli::{CommonArgs, SUMMARY_LOG, init_logging, print_json, summarize};
use clap::Parser;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Build the vendor sales summary table")]
struct Cli {
  #[command(flatten)]
  common: CommonArgs,
}

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  let cfg = cli.common.pipeline_config()?;

  init_logging(&cfg.log_dir, SUMMARY_LOG)?;
  let span = tracing::info_span!("summary", run_id = %Uuid::new_v4());
  let _enter = span.enter();

  let report = summarize(&cfg).inspect_err(|e| tracing::error!("{e:#}"))?;
  if cli.common.json {
    print_json(&report)?;
  }
  Ok(())
}
