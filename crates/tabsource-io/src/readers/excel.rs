//! Workbook reader for `xls`/`xlsx` (enabled with `--features excel`).
//!
//! The first row of the chosen sheet is the header. Cells are rendered as
//! text, like the CSV reader.

use calamine::{open_workbook_auto, Data, Reader};

use tabsource_core::reader::{FormatReader, Params, ParamsExt};
use tabsource_core::record::PATH_COLUMN_NAME;
use tabsource_core::schema::Schema;
use tabsource_core::types::{Column, RowBatch, Scalar};
use tabsource_core::{Dataset, SourceSpec};

use super::{push_path_column, with_path_field, FileOptions};
use crate::error::{Error, Result};
use crate::paths;

/// Reader registered for `xls` and `xlsx`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExcelReader;

impl FormatReader for ExcelReader {
    fn read(&self, source: Option<&SourceSpec>, params: &Params) -> tabsource_core::Result<Dataset> {
        Ok(read_excel(source, params)?)
    }
}

pub fn read_excel(source: Option<&SourceSpec>, params: &Params) -> Result<Dataset> {
    let opts = FileOptions::from_params(params);
    let sheet = params.get_str("sheet").map(str::to_string);
    let files = paths::expand(&paths::source_paths(source, params)?)?;

    let mut header: Option<Vec<String>> = None;
    let mut batches = Vec::new();
    for file in &files {
        let (cols, mut batch) = read_sheet(file, sheet.as_deref(), &opts)?;
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
        if opts.include_path_column && batch.column(PATH_COLUMN_NAME).is_none() {
            push_path_column(&mut batch, &paths::display(file));
        }
        batches.extend(batch.split(opts.rows_per_partition));
    }

    let mut schema = Schema::utf8(&header.unwrap_or_default());
    if opts.adds_path_column(&schema) {
        schema = with_path_field(schema);
    }
    tracing::debug!(files = files.len(), columns = schema.len(), "workbook source");
    Ok(Dataset::from_batches(schema, batches))
}

fn read_sheet(
    path: &std::path::Path,
    sheet: Option<&str>,
    opts: &FileOptions,
) -> Result<(Vec<String>, RowBatch)> {
    let mut workbook = open_workbook_auto(path)?;
    let name = match sheet {
        Some(s) => s.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::Malformed {
                path: paths::display(path),
                msg: "workbook has no sheets".to_string(),
            })?,
    };
    let range = workbook.worksheet_range(&name)?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();

    let mut values: Vec<Vec<Scalar>> = vec![Vec::new(); header.len()];
    for row in rows {
        for (i, col) in values.iter_mut().enumerate() {
            col.push(match row.get(i) {
                None | Some(Data::Empty) if opts.na_filter => Scalar::Null,
                None | Some(Data::Empty) => Scalar::from(""),
                Some(cell) => opts.text_cell(&cell.to_string()),
            });
        }
    }
    let columns = header
        .iter()
        .zip(values)
        .map(|(n, v)| Column::new(n.clone(), v))
        .collect();
    Ok((header, RowBatch::with_offset(columns, 0)))
}
