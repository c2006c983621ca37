//! JSON reader for line-delimited records and array documents.
//!
//! Records are decoded eagerly (the column set is the union of all keys, in
//! first-seen order) and served as partitions of `rows_per_partition` rows.
//!
//! With `flatten`, nested objects become dotted column names and list
//! positions collapse to `*`: `{"persons": [{"name": "A"}, {"name": "B"}]}`
//! yields the column `persons.*.name` holding `["A", "B"]`.

use std::fs;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

use tabsource_core::reader::{FormatReader, Params, ParamsExt};
use tabsource_core::schema::{DataType, Field, Schema};
use tabsource_core::types::{Column, Record, RowBatch, Scalar};
use tabsource_core::{Dataset, SourceSpec};

use super::{push_path_column, with_path_field, FileOptions};
use crate::error::{Error, Result};
use crate::paths;

/// Reader registered for `json`, `jsonl` and `json-l`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReader;

impl FormatReader for JsonReader {
    fn read(&self, source: Option<&SourceSpec>, params: &Params) -> tabsource_core::Result<Dataset> {
        Ok(read_json(source, params)?)
    }
}

pub fn read_json(source: Option<&SourceSpec>, params: &Params) -> Result<Dataset> {
    let opts = FileOptions::from_params(params);
    let flatten = params.get_bool("flatten").unwrap_or(false);
    let lines = params.get_bool("lines");
    let files = paths::expand(&paths::source_paths(source, params)?)?;

    let mut per_file = Vec::with_capacity(files.len());
    for file in &files {
        let records = read_records(file, lines)?
            .into_iter()
            .map(|obj| to_record(obj, flatten))
            .collect::<Vec<_>>();
        per_file.push((paths::display(file), records));
    }

    let mut names: IndexSet<String> = IndexSet::new();
    for (_, records) in &per_file {
        for rec in records {
            for key in rec.keys() {
                if !names.contains(key) {
                    names.insert(key.clone());
                }
            }
        }
    }

    let mut schema = Schema::new(
        names
            .iter()
            .map(|n| Field::new(n.as_str(), DataType::Any, true))
            .collect(),
    );
    let add_path = opts.adds_path_column(&schema);
    if add_path {
        schema = with_path_field(schema);
    }
    tracing::debug!(files = files.len(), columns = schema.len(), flatten, "json source");

    let mut batches = Vec::new();
    for (path, records) in per_file {
        let mut batch = records_to_batch(&names, records);
        if add_path {
            push_path_column(&mut batch, &path);
        }
        batches.extend(batch.split(opts.rows_per_partition));
    }
    Ok(Dataset::from_batches(schema, batches))
}

/// Decode the top-level objects of one file. `lines` forces the layout;
/// otherwise a leading `[` means an array document.
fn read_records(path: &Path, lines: Option<bool>) -> Result<Vec<Map<String, Value>>> {
    let text = fs::read_to_string(path)?;
    let is_array = match lines {
        Some(l) => !l,
        None => text.trim_start().starts_with('['),
    };
    let values: Vec<Value> = if is_array {
        serde_json::from_str(&text)?
    } else {
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<std::result::Result<_, _>>()?
    };
    values
        .into_iter()
        .map(|v| match v {
            Value::Object(obj) => Ok(obj),
            other => Err(Error::Malformed {
                path: paths::display(path),
                msg: format!("expected a JSON object per record, got {other}"),
            }),
        })
        .collect()
}

/// One decoded object as a record, flattened or with nested cells.
pub fn to_record(obj: Map<String, Value>, flatten: bool) -> Record {
    let mut out = Record::new();
    for (k, v) in obj {
        if flatten {
            flatten_into(&k, v, &mut out);
        } else {
            out.insert(k, Scalar::from_json(v));
        }
    }
    out
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn flatten_into(prefix: &str, value: Value, out: &mut Record) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (k, v) in map {
                flatten_into(&join(prefix, &k), v, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            let key = join(prefix, "*");
            let mut collected: IndexMap<String, Vec<Scalar>> = IndexMap::new();
            for item in items {
                let mut sub = Record::new();
                flatten_into(&key, item, &mut sub);
                for (k, v) in sub {
                    collected.entry(k).or_default().push(v);
                }
            }
            for (k, vs) in collected {
                out.insert(k, Scalar::List(vs));
            }
        }
        other => {
            out.insert(prefix.to_string(), Scalar::from_json(other));
        }
    }
}

fn records_to_batch(names: &IndexSet<String>, records: Vec<Record>) -> RowBatch {
    let mut values: Vec<Vec<Scalar>> = vec![Vec::with_capacity(records.len()); names.len()];
    for mut rec in records {
        for (name, col) in names.iter().zip(values.iter_mut()) {
            col.push(rec.swap_remove(name).unwrap_or(Scalar::Null));
        }
    }
    let columns = names
        .iter()
        .zip(values)
        .map(|(n, v)| Column::new(n.clone(), v))
        .collect();
    RowBatch::with_offset(columns, 0)
}
