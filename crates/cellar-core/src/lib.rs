//! Core types and trait definitions for the Cellar inventory pipeline.
//!
//! This crate is free of database and file-format dependencies. It defines
//! the tabular value model shared by the loader and the summary engine, the
//! schema metadata carried alongside every table, and the [`TableStore`]
//! abstraction that storage backends implement.
//!
//! [`TableStore`]: store::TableStore

pub mod batch;
pub mod error;
pub mod schema;
pub mod store;
pub mod value;

pub use batch::Batch;
pub use error::{Error, Result};
pub use schema::{Column, ColumnType, TableSchema};
pub use store::{TableStore, WriteMode};
pub use value::Value;
