//! SQLite backend for the Cellar pipeline.
//!
//! Wraps a single synchronous [`rusqlite::Connection`]. Every table write runs
//! in its own transaction.

mod encode;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
