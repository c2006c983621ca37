//! Normalization of older mapping shapes into a canonical [`Mapping`].
//!
//! Handled shapes:
//! - `target: col` is renamed to `label: col` (unless `label` is set);
//! - `label: {name|label|gold_label|field: col}` becomes `label: col`, the
//!   sub-keys tried in that order;
//! - `label: {metadata_file: ...}` is rejected.
//!
//! Numeric column references (headerless files) are read as their text.

use indexmap::IndexMap;
use serde_json::Value;

use tabsource_core::{Error, Result};

use crate::mapping::{ColumnRef, Mapping};

const LABEL: &str = "label";
const TARGET: &str = "target";
const LABEL_KEYS: [&str; 4] = ["name", "label", "gold_label", "field"];

/// Normalize a raw mapping document (any supported shape).
pub fn normalize_mapping(raw: Value) -> Result<Mapping> {
    let obj = match raw {
        Value::Object(obj) => obj,
        other => return Err(Error::Config(format!("mapping must be a map, got {other}"))),
    };
    let mut fields: IndexMap<String, Value> = obj.into_iter().collect();

    if fields.contains_key(TARGET) && !fields.contains_key(LABEL) {
        tracing::warn!(deprecated = true, key = TARGET, "The 'target' key is deprecated, use 'label'");
        if let Some(target) = fields.shift_remove(TARGET) {
            fields.insert(LABEL.to_string(), target);
        }
    }

    if let Some(Value::Object(nested)) = fields.get(LABEL) {
        tracing::warn!(deprecated = true, key = LABEL, "Nested 'label' specifications are deprecated");
        if nested.contains_key("metadata_file") {
            return Err(Error::UnsupportedLegacyFeature(
                "'metadata_file' is no longer supported, modify the source data directly".into(),
            ));
        }
        let resolved = LABEL_KEYS
            .iter()
            .filter_map(|k| nested.get(*k))
            .find(|v| is_set(v))
            .cloned()
            .ok_or(Error::LegacyLabelResolution)?;
        fields.insert(LABEL.to_string(), resolved);
    }

    fields
        .into_iter()
        .map(|(field, value)| {
            let columns = column_ref(&field, value)?;
            Ok((field, columns))
        })
        .collect()
}

/// Whether a legacy sub-key carries a usable value.
fn is_set(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
    }
}

fn column_name(field: &str, v: Value) -> Result<String> {
    match v {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(Error::Config(format!(
            "invalid column reference for '{field}': {other}"
        ))),
    }
}

fn column_ref(field: &str, value: Value) -> Result<ColumnRef> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|v| column_name(field, v))
            .collect::<Result<Vec<_>>>()
            .map(ColumnRef::Many),
        other => column_name(field, other).map(ColumnRef::Single),
    }
}
