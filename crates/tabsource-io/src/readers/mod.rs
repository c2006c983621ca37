//! Format readers producing lazy `Dataset`s.

pub mod csv;
pub mod json;

#[cfg(feature = "parquet")]
pub mod parquet;

#[cfg(feature = "excel")]
pub mod excel;

#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;

use tabsource_core::reader::{FormatReader, Params, ParamsExt};
use tabsource_core::record::PATH_COLUMN_NAME;
use tabsource_core::schema::{DataType, Field, Schema};
use tabsource_core::types::{Column, RowBatch, Scalar};
use tabsource_core::{Dataset, SourceSpec};

use crate::error::Error;

/// Stand-in registered for formats whose crate feature is disabled.
#[derive(Debug, Clone, Copy)]
pub struct Unavailable {
    pub format: &'static str,
    pub feature: &'static str,
}

impl FormatReader for Unavailable {
    fn read(
        &self,
        _source: Option<&SourceSpec>,
        _params: &Params,
    ) -> tabsource_core::Result<Dataset> {
        Err(Error::FeatureDisabled {
            format: self.format,
            feature: self.feature,
        }
        .into())
    }
}

/// Options every file reader understands.
#[derive(Debug, Clone)]
pub(crate) struct FileOptions {
    pub include_path_column: bool,
    pub rows_per_partition: usize,
    /// Treat empty text cells as missing.
    pub na_filter: bool,
}

impl FileOptions {
    pub fn from_params(params: &Params) -> Self {
        Self {
            include_path_column: params.get_bool("include_path_column").unwrap_or(true),
            rows_per_partition: params
                .get_usize("rows_per_partition")
                .filter(|n| *n > 0)
                .unwrap_or(10_000),
            na_filter: params.get_bool("na_filter").unwrap_or(false),
        }
    }

    /// Cell for a decoded text value.
    pub fn text_cell(&self, s: &str) -> Scalar {
        if self.na_filter && s.is_empty() {
            Scalar::Null
        } else {
            Scalar::Str(s.to_string())
        }
    }

    /// Whether a `path` column should be appended to `schema`.
    pub fn adds_path_column(&self, schema: &Schema) -> bool {
        self.include_path_column && schema.index_of(PATH_COLUMN_NAME).is_none()
    }
}

pub(crate) fn with_path_field(mut schema: Schema) -> Schema {
    schema
        .fields
        .push(Field::new(PATH_COLUMN_NAME, DataType::Utf8, false));
    schema
}

pub(crate) fn push_path_column(batch: &mut RowBatch, path: &str) {
    let rows = batch.num_rows();
    batch.columns.push(Column::new(
        PATH_COLUMN_NAME,
        vec![Scalar::Str(path.to_string()); rows],
    ));
}
