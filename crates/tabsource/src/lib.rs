#![forbid(unsafe_code)]
//! tabsource: one lazily evaluated table over heterogeneous sources.
//!
//! A [`DataSource`] picks a reader for its format (explicit, or inferred from
//! the source's extension), reads and sanitizes the data, and exposes it
//! as-is or re-shaped by a [`Mapping`] of logical fields to source columns.
//! Both views can be turned into row records.
//!
//! ```no_run
//! use tabsource::{DataSource, Mapping};
//!
//! let ds = DataSource::builder()
//!     .source("data/reviews.csv")
//!     .mapping(Mapping::new().with("text", vec!["title", "body"]).with("label", "stars"))
//!     .build()?;
//! for record in ds.to_mapped_records()? {
//!     println!("{:?}", record?);
//! }
//! # Ok::<(), tabsource::Error>(())
//! ```

pub mod config;
pub mod emit;
pub mod legacy;
pub mod loader;
pub mod mapping;
pub mod registry;
pub mod resolve;
pub mod sanitize;
pub mod source;

#[cfg(test)]
mod testing;

pub use config::DataSourceConfig;
pub use emit::Records;
pub use mapping::{ColumnRef, Mapping};
pub use registry::{add_supported_format, supported_formats, ReaderRegistry};
pub use source::{DataSource, DataSourceBuilder};

pub use tabsource_core::{Dataset, Error, FormatReader, Params, Result, RowRecord, SourceSpec};
