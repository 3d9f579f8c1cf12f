//! Bulk loading of delimited source files into a [`TableStore`].
//!
//! Every `.csv` file in a source directory becomes one table named after the
//! file. Files are read in bounded chunks; the first chunk of a file replaces
//! the table and later chunks append to it, so a rerun always ends with
//! exactly the file's current contents.
//!
//! [`TableStore`]: cellar_core::TableStore

mod loader;
mod reader;
mod sink;

pub mod error;

pub use error::{Error, Result};
pub use loader::{
  BulkLoader, DEFAULT_CHUNK_SIZE, FileFailure, LoadReport, SOURCE_EXTENSION,
  source_files,
};
pub use reader::ChunkedCsvReader;
pub use sink::{TableLoad, TableLoader};
