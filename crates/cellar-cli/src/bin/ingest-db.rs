//! Ingestion stage.
//!
//! Loads every `.csv` file in the source directory into the database, one
//! table per file, replacing whatever an earlier run left behind.
//!
//! ```
//! cargo run -p cellar-cli --bin ingest-db -- --source-dir data --database inventory.db
//! ```

use std::{path::PathBuf, process::ExitCode};

use cellar_cli::{CommonArgs, INGEST_LOG, Status, ingest, init_logging, print_json};
use clap::Parser;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Load a directory of CSV files into the Cellar database")]
struct Cli {
  #[command(flatten)]
  common: CommonArgs,

  /// Directory holding the source CSV files; overrides `source_dir`.
  #[arg(long)]
  source_dir: Option<PathBuf>,

  /// Rows per chunk; overrides `chunk_size`.
  #[arg(long)]
  chunk_size: Option<usize>,
}

fn main() -> anyhow::Result<ExitCode> {
  let cli = Cli::parse();

  let mut cfg = cli.common.pipeline_config()?;
  if let Some(dir) = cli.source_dir {
    cfg.source_dir = dir;
  }
  if let Some(size) = cli.chunk_size {
    cfg.chunk_size = size;
  }

  init_logging(&cfg.log_dir, INGEST_LOG)?;
  let span = tracing::info_span!("ingest", run_id = %Uuid::new_v4());
  let _enter = span.enter();

  let report = ingest(&cfg).inspect_err(|e| tracing::error!("{e:#}"))?;
  if cli.common.json {
    print_json(&report)?;
  }
  Ok(Status::of_load(&report).into())
}
