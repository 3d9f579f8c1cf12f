//! Shared plumbing for the Cellar binaries: configuration, logging and the
//! command-line flags both stages accept.

mod stage;

use std::{
  fs::{self, OpenOptions},
  io::{self, IsTerminal as _},
  path::{Path, PathBuf},
  sync::Mutex,
};

use anyhow::Context as _;
use cellar_ingest::DEFAULT_CHUNK_SIZE;
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
  EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

pub use stage::{Status, ingest, summarize};

/// Prefix of the environment variables that override the config file.
pub const ENV_PREFIX: &str = "CELLAR";

/// Log file written by the ingestion stage.
pub const INGEST_LOG: &str = "ingestion_db.log";

/// Log file written by the summary stage.
pub const SUMMARY_LOG: &str = "get_vendor_summary.log";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Pipeline configuration, deserialised from `cellar.toml` and `CELLAR_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
  pub database_path: PathBuf,
  pub source_dir:    PathBuf,
  pub chunk_size:    usize,
  pub log_dir:       PathBuf,
}

impl PipelineConfig {
  /// Read `path` (optional) and the environment on top of the defaults.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("database_path", "inventory.db")?
      .set_default("source_dir", "data")?
      .set_default("chunk_size", DEFAULT_CHUNK_SIZE as i64)?
      .set_default("log_dir", "logs")?
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
      .build()
      .with_context(|| format!("failed to read config file {path:?}"))?;

    settings
      .try_deserialize()
      .context("failed to deserialise PipelineConfig")
  }

  /// Apply command-line overrides.
  pub fn apply(&mut self, args: &CommonArgs) {
    if let Some(path) = &args.database {
      self.database_path = path.clone();
    }
    if let Some(dir) = &args.log_dir {
      self.log_dir = dir.clone();
    }
  }
}

/// Flags shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "cellar.toml")]
  pub config: PathBuf,

  /// SQLite database file; overrides `database_path`.
  #[arg(long)]
  pub database: Option<PathBuf>,

  /// Directory for the run log; overrides `log_dir`.
  #[arg(long)]
  pub log_dir: Option<PathBuf>,

  /// Print the run report as JSON on stdout.
  #[arg(long)]
  pub json: bool,
}

impl CommonArgs {
  /// Load the configuration file named by `--config` and apply the flags.
  pub fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
    let mut cfg = PipelineConfig::load(&self.config)?;
    cfg.apply(self);
    Ok(cfg)
  }
}

// ─── Logging ──────────────────────────────────────────────────────────────────

/// Log to stderr and append to `<log_dir>/<file_name>`.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. The file copy never
/// carries ANSI escapes.
pub fn init_logging(log_dir: &Path, file_name: &str) -> anyhow::Result<PathBuf> {
  fs::create_dir_all(log_dir)
    .with_context(|| format!("failed to create log directory {log_dir:?}"))?;
  let path = log_dir.join(file_name);
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&path)
    .with_context(|| format!("failed to open log file {path:?}"))?;

  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  tracing_subscriber::registry()
    .with(filter)
    .with(
      fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal()),
    )
    .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
    .try_init()
    .context("failed to install tracing subscriber")?;

  Ok(path)
}

/// Print `report` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(report: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(report).context("failed to serialise report")?;
  println!("{json}");
  Ok(())
}
