#![forbid(unsafe_code)]
//! tabsource-io: format readers.
//!
//! Every reader turns a source spec (or, for sources without files, only its
//! parameters) into a lazy `tabsource_core::Dataset`. File readers share the
//! same conventions:
//! - sources may be glob patterns (`data/*.jsonl`), expanded in sorted order;
//! - without a positional source, the `path` parameter names the files;
//! - `include_path_column` appends a `path` column with each row's file;
//! - each file is indexed from 0, like a partition of its own.
//!
//! Parquet, workbook and search-index readers are feature gated.

pub mod error;
pub mod paths;
pub mod readers;

pub use error::{Error, Result};
pub use readers::csv::CsvReader;
pub use readers::json::JsonReader;
pub use readers::Unavailable;

#[cfg(feature = "parquet")]
pub use readers::parquet::ParquetReader;

#[cfg(feature = "excel")]
pub use readers::excel::ExcelReader;

#[cfg(feature = "elasticsearch")]
pub use readers::elasticsearch::ElasticsearchReader;
