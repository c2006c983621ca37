//! Delimited text reader. Headers are read eagerly, rows lazily (one
//! partition per file). Every cell is text.

use std::path::Path;
use std::sync::Arc;

use ::csv::{ReaderBuilder, StringRecord};

use tabsource_core::dataset::PartitionFn;
use tabsource_core::reader::{FormatReader, Params, ParamsExt};
use tabsource_core::schema::Schema;
use tabsource_core::types::{Column, RowBatch, Scalar};
use tabsource_core::{Dataset, SourceSpec};

use super::{push_path_column, with_path_field, FileOptions};
use crate::error::{Error, Result};
use crate::paths;

/// Reader registered for `csv`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReader;

impl FormatReader for CsvReader {
    fn read(&self, source: Option<&SourceSpec>, params: &Params) -> tabsource_core::Result<Dataset> {
        Ok(read_csv(source, params)?)
    }
}

#[derive(Debug, Clone)]
struct CsvOptions {
    delimiter: u8,
    has_headers: bool,
    file: FileOptions,
}

impl CsvOptions {
    fn from_params(params: &Params) -> Result<Self> {
        let delimiter = match params.get_str("delimiter") {
            None => b',',
            Some(d) if d.len() == 1 && d.is_ascii() => d.as_bytes()[0],
            Some("\\t") => b'\t',
            Some(d) => {
                return Err(Error::Params(format!(
                    "delimiter must be a single ASCII character, got '{d}'"
                )))
            }
        };
        Ok(Self {
            delimiter,
            has_headers: params.get_bool("has_headers").unwrap_or(true),
            file: FileOptions::from_params(params),
        })
    }

    fn builder(&self) -> ReaderBuilder {
        let mut b = ReaderBuilder::new();
        b.delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .flexible(true);
        b
    }
}

pub fn read_csv(source: Option<&SourceSpec>, params: &Params) -> Result<Dataset> {
    let opts = CsvOptions::from_params(params)?;
    let files = paths::expand(&paths::source_paths(source, params)?)?;

    let mut header: Option<Vec<String>> = None;
    for file in &files {
        let cols = read_header(file, &opts)?;
        match &header {
            None => header = Some(cols),
            Some(h) if *h != cols => {
                return Err(Error::Malformed {
                    path: paths::display(file),
                    msg: format!("header {cols:?} differs from {h:?}"),
                })
            }
            Some(_) => {}
        }
    }
    let header = Arc::new(header.unwrap_or_default());

    let mut schema = Schema::utf8(header.as_slice());
    let add_path = opts.file.adds_path_column(&schema);
    if add_path {
        schema = with_path_field(schema);
    }
    tracing::debug!(files = files.len(), columns = schema.len(), "csv source");

    let partitions = files
        .into_iter()
        .map(|file| {
            let opts = opts.clone();
            let header = Arc::clone(&header);
            Arc::new(move || -> tabsource_core::Result<RowBatch> {
                let mut batch = read_file(&file, &opts, &header)?;
                if add_path {
                    push_path_column(&mut batch, &paths::display(&file));
                }
                Ok(batch)
            }) as PartitionFn
        })
        .collect();

    Ok(Dataset::new(schema, partitions))
}

fn read_header(path: &Path, opts: &CsvOptions) -> Result<Vec<String>> {
    let mut rdr = opts.builder().from_path(path)?;
    if opts.has_headers {
        return Ok(rdr.headers()?.iter().map(str::to_string).collect());
    }
    // headerless files get positional names
    let mut first = StringRecord::new();
    let width = if rdr.read_record(&mut first)? {
        first.len()
    } else {
        0
    };
    Ok((0..width).map(|i| i.to_string()).collect())
}

fn read_file(path: &Path, opts: &CsvOptions, header: &[String]) -> Result<RowBatch> {
    let mut rdr = opts.builder().from_path(path)?;
    let mut values: Vec<Vec<Scalar>> = vec![Vec::new(); header.len()];
    for record in rdr.records() {
        let record = record?;
        for (i, col) in values.iter_mut().enumerate() {
            col.push(match record.get(i) {
                Some(cell) => opts.file.text_cell(cell),
                None => Scalar::Null,
            });
        }
    }
    let columns = header
        .iter()
        .zip(values)
        .map(|(name, vals)| Column::new(name.clone(), vals))
        .collect();
    Ok(RowBatch::with_offset(columns, 0))
}
