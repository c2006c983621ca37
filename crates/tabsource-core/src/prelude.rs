//! Convenient re-exports for downstream crates.

pub use crate::config::ReadConfig;
pub use crate::dataset::{Dataset, PartitionFn};
pub use crate::error::{Error, Result};
pub use crate::reader::{FormatReader, Params};
pub use crate::record::{RowRecord, ID, PATH_COLUMN_NAME, RESOURCE};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::source::SourceSpec;
pub use crate::types::{Column, Record, RowBatch, Scalar};
