#![forbid(unsafe_code)]
//! tabsource-core: pure data types shared by the readers and the data source.
//!
//! - `types`: `Scalar` cells, `Column`s and materialized `RowBatch` partitions.
//! - `schema`: named, typed columns.
//! - `dataset`: the lazy, partitioned `Dataset` every reader produces.
//! - `record`: row records and the reserved field names.
//! - `reader`: the `FormatReader` plugin contract and reader parameters.
//!
//! No file formats, network or logging live here.

pub mod config;
pub mod dataset;
pub mod error;
pub mod prelude;
pub mod reader;
pub mod record;
pub mod schema;
pub mod source;
pub mod types;

pub use dataset::Dataset;
pub use error::{Error, Result};
pub use reader::{FormatReader, Params};
pub use record::RowRecord;
pub use source::SourceSpec;
