//! Parquet reader (enabled with `--features parquet`).
//!
//! The schema comes from file metadata at construction; row data is decoded
//! per file when its partition is computed. Columns keep their Arrow types,
//! so missing numeric cells stay missing after sanitization.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::{
    ArrowPrimitiveType, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
    Int8Type, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow_array::Array;
use arrow_schema::DataType as ArrowType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use tabsource_core::dataset::PartitionFn;
use tabsource_core::reader::{FormatReader, Params};
use tabsource_core::schema::{DataType, Field, Schema};
use tabsource_core::types::{Column, RowBatch, Scalar};
use tabsource_core::{Dataset, SourceSpec};

use super::{push_path_column, with_path_field, FileOptions};
use crate::error::{Error, Result};
use crate::paths;

/// Reader registered for `parquet`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParquetReader;

impl FormatReader for ParquetReader {
    fn read(&self, source: Option<&SourceSpec>, params: &Params) -> tabsource_core::Result<Dataset> {
        Ok(read_parquet(source, params)?)
    }
}

pub fn read_parquet(source: Option<&SourceSpec>, params: &Params) -> Result<Dataset> {
    let opts = FileOptions::from_params(params);
    let files = paths::expand(&paths::source_paths(source, params)?)?;

    let mut schema: Option<Schema> = None;
    for file in &files {
        let file_schema = read_schema(file)?;
        match &schema {
            None => schema = Some(file_schema),
            Some(s) if *s != file_schema => {
                return Err(Error::Malformed {
                    path: paths::display(file),
                    msg: "schema differs from the first file".to_string(),
                })
            }
            Some(_) => {}
        }
    }
    let mut schema = schema.unwrap_or_default();
    let add_path = opts.adds_path_column(&schema);
    if add_path {
        schema = with_path_field(schema);
    }
    tracing::debug!(files = files.len(), columns = schema.len(), "parquet source");

    let partitions = files
        .into_iter()
        .map(|file| {
            Arc::new(move || -> tabsource_core::Result<RowBatch> {
                let mut batch = read_file(&file)?;
                if add_path {
                    push_path_column(&mut batch, &paths::display(&file));
                }
                Ok(batch)
            }) as PartitionFn
        })
        .collect();
    Ok(Dataset::new(schema, partitions))
}

fn read_schema(path: &Path) -> Result<Schema> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
    builder
        .schema()
        .fields()
        .iter()
        .map(|f| {
            Ok(Field::new(
                f.name().as_str(),
                map_type(f.data_type()).ok_or_else(|| Error::Malformed {
                    path: paths::display(path),
                    msg: format!("unsupported column type {} for '{}'", f.data_type(), f.name()),
                })?,
                f.is_nullable(),
            ))
        })
        .collect::<Result<Vec<_>>>()
        .map(Schema::new)
}

fn map_type(t: &ArrowType) -> Option<DataType> {
    Some(match t {
        ArrowType::Boolean => DataType::Boolean,
        ArrowType::Int8 | ArrowType::Int16 | ArrowType::Int32 => DataType::Int32,
        ArrowType::UInt8 | ArrowType::UInt16 => DataType::Int32,
        ArrowType::Int64 | ArrowType::UInt32 | ArrowType::UInt64 => DataType::Int64,
        ArrowType::Float32 => DataType::Float32,
        ArrowType::Float64 => DataType::Float64,
        ArrowType::Utf8 | ArrowType::LargeUtf8 => DataType::Utf8,
        ArrowType::Binary | ArrowType::LargeBinary => DataType::Binary,
        ArrowType::Date64 => DataType::Date64,
        _ => return None,
    })
}

fn read_file(path: &PathBuf) -> Result<RowBatch> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut values: Vec<Vec<Scalar>> = vec![Vec::new(); names.len()];
    for batch in reader {
        let batch = batch?;
        for (col, array) in values.iter_mut().zip(batch.columns()) {
            col.extend(to_scalars(array.as_ref()));
        }
    }
    let columns = names
        .into_iter()
        .zip(values)
        .map(|(n, v)| Column::new(n, v))
        .collect();
    Ok(RowBatch::with_offset(columns, 0))
}

fn primitive<T: ArrowPrimitiveType>(
    array: &dyn Array,
    f: impl Fn(T::Native) -> Scalar,
) -> Vec<Scalar> {
    let a = array.as_primitive::<T>();
    (0..a.len())
        .map(|i| if a.is_null(i) { Scalar::Null } else { f(a.value(i)) })
        .collect()
}

fn to_scalars(array: &dyn Array) -> Vec<Scalar> {
    let nullable = |i: usize, cell: Scalar| if array.is_null(i) { Scalar::Null } else { cell };
    match array.data_type() {
        ArrowType::Boolean => {
            let a = array.as_boolean();
            (0..a.len()).map(|i| nullable(i, Scalar::Bool(a.value(i)))).collect()
        }
        ArrowType::Int8 => primitive::<Int8Type>(array, |v| Scalar::I32(v as i32)),
        ArrowType::Int16 => primitive::<Int16Type>(array, |v| Scalar::I32(v as i32)),
        ArrowType::Int32 => primitive::<Int32Type>(array, Scalar::I32),
        ArrowType::UInt8 => primitive::<UInt8Type>(array, |v| Scalar::I32(v as i32)),
        ArrowType::UInt16 => primitive::<UInt16Type>(array, |v| Scalar::I32(v as i32)),
        ArrowType::Int64 => primitive::<Int64Type>(array, Scalar::I64),
        ArrowType::UInt32 => primitive::<UInt32Type>(array, |v| Scalar::I64(v as i64)),
        ArrowType::UInt64 => primitive::<UInt64Type>(array, |v| match i64::try_from(v) {
            Ok(i) => Scalar::I64(i),
            Err(_) => Scalar::F64(v as f64),
        }),
        ArrowType::Float32 => primitive::<Float32Type>(array, Scalar::F32),
        ArrowType::Float64 => primitive::<Float64Type>(array, Scalar::F64),
        ArrowType::Date64 => primitive::<Date64Type>(array, Scalar::I64),
        ArrowType::Utf8 => {
            let a = array.as_string::<i32>();
            (0..a.len()).map(|i| nullable(i, Scalar::from(a.value(i)))).collect()
        }
        ArrowType::LargeUtf8 => {
            let a = array.as_string::<i64>();
            (0..a.len()).map(|i| nullable(i, Scalar::from(a.value(i)))).collect()
        }
        ArrowType::Binary => {
            let a = array.as_binary::<i32>();
            (0..a.len()).map(|i| nullable(i, Scalar::Bin(a.value(i).to_vec()))).collect()
        }
        ArrowType::LargeBinary => {
            let a = array.as_binary::<i64>();
            (0..a.len()).map(|i| nullable(i, Scalar::Bin(a.value(i).to_vec()))).collect()
        }
        // rejected by `map_type` when the schema was read
        _ => vec![Scalar::Null; array.len()],
    }
}
