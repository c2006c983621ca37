//! Search-index reader (enabled with `--features elasticsearch`).
//!
//! Runs one `_search` request against `{es_host}/{index}` and serves the hits
//! as rows: `id` from the hit id, the document fields, then `resource`
//! naming the index the hit came from.

use indexmap::IndexSet;
use serde_json::{json, Value};

use tabsource_core::reader::{FormatReader, Params, ParamsExt};
use tabsource_core::record::{ID, RESOURCE};
use tabsource_core::schema::{DataType, Field, Schema};
use tabsource_core::types::{Column, Record, RowBatch, Scalar};
use tabsource_core::{Dataset, SourceSpec};

use super::json::to_record;
use super::FileOptions;
use crate::error::{Error, Result};

const DEFAULT_SIZE: usize = 10_000;

/// Reader registered for `elasticsearch`. The source, if any, is the backend
/// name and is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct ElasticsearchReader;

impl FormatReader for ElasticsearchReader {
    fn read(&self, _source: Option<&SourceSpec>, params: &Params) -> tabsource_core::Result<Dataset> {
        Ok(read_index(params)?)
    }
}

pub fn read_index(params: &Params) -> Result<Dataset> {
    let index = params
        .get_str("index")
        .ok_or_else(|| Error::Params("the 'index' parameter is required".to_string()))?;
    let host = params
        .get_str("es_host")
        .unwrap_or("http://localhost:9200")
        .trim_end_matches('/');
    let size = params.get_usize("size").unwrap_or(DEFAULT_SIZE);
    let query = params
        .get("query")
        .cloned()
        .unwrap_or_else(|| json!({ "match_all": {} }));
    let flatten = params.get_bool("flatten").unwrap_or(false);
    let rows_per_partition = FileOptions::from_params(params).rows_per_partition;

    let resource = format!("{host}/{index}");
    let url = format!("{resource}/_search");
    tracing::debug!(%url, size, "search index source");

    let response: Value = reqwest::blocking::Client::new()
        .post(&url)
        .json(&json!({ "query": query, "size": size }))
        .send()?
        .error_for_status()?
        .json()?;

    let hits = response
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut records = Vec::with_capacity(hits.len());
    for hit in hits {
        let id = hit.get("_id").cloned().unwrap_or(Value::Null);
        let doc = match hit.get("_source") {
            Some(Value::Object(obj)) => to_record(obj.clone(), flatten),
            _ => Record::new(),
        };
        let mut rec = Record::new();
        rec.insert(ID.to_string(), Scalar::from_json(id));
        for (k, v) in doc {
            if k != ID && k != RESOURCE {
                rec.insert(k, v);
            }
        }
        rec.insert(RESOURCE.to_string(), Scalar::from(resource.as_str()));
        records.push(rec);
    }

    let mut names: IndexSet<String> = IndexSet::new();
    names.insert(ID.to_string());
    for rec in &records {
        names.extend(rec.keys().filter(|k| *k != RESOURCE).cloned());
    }
    names.insert(RESOURCE.to_string());

    let schema = Schema::new(
        names
            .iter()
            .map(|n| Field::new(n.as_str(), DataType::Any, true))
            .collect(),
    );
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
    let batch = RowBatch::with_offset(columns, 0);
    Ok(Dataset::from_batch(schema, batch, rows_per_partition))
}
