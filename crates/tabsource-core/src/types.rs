//! Lightweight cell values, columns and materialized partitions.
//!
//! Readers convert whatever their format decodes into these; the data source
//! never sees Arrow arrays, workbook cells or raw JSON.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::DataType;

/// Ordered key/value record, used for nested cells and for row records.
pub type Record = IndexMap<String, Scalar>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
    List(Vec<Scalar>),
    Record(Record),
}

impl Scalar {
    pub fn data_type(&self) -> DataType {
        match self {
            Scalar::Null => DataType::Any,
            Scalar::Bool(_) => DataType::Boolean,
            Scalar::I32(_) => DataType::Int32,
            Scalar::I64(_) => DataType::Int64,
            Scalar::F32(_) => DataType::Float32,
            Scalar::F64(_) => DataType::Float64,
            Scalar::Str(_) => DataType::Utf8,
            Scalar::Bin(_) => DataType::Binary,
            Scalar::List(_) => DataType::List,
            Scalar::Record(_) => DataType::Struct,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Decode a JSON value. Integral numbers become `I64`, the rest `F64`.
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::I64(i),
                None => n.as_f64().map(Scalar::F64).unwrap_or(Scalar::Null),
            },
            Value::String(s) => Scalar::Str(s),
            Value::Array(items) => Scalar::List(items.into_iter().map(Scalar::from_json).collect()),
            Value::Object(map) => Scalar::Record(
                map.into_iter()
                    .map(|(k, v)| (k, Scalar::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Plain JSON rendering (no enum tags), for output and config round-trips.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::I32(i) => Value::from(*i),
            Scalar::I64(i) => Value::from(*i),
            Scalar::F32(f) => Value::from(*f as f64),
            Scalar::F64(f) => Value::from(*f),
            Scalar::Str(s) => Value::String(s.clone()),
            Scalar::Bin(b) => Value::String(format!("[binary {} bytes]", b.len())),
            Scalar::List(items) => Value::Array(items.iter().map(Scalar::to_json).collect()),
            Scalar::Record(rec) => Value::Object(
                rec.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::I32(i) => write!(f, "{i}"),
            Scalar::I64(i) => write!(f, "{i}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
            Scalar::Str(s) => f.write_str(s),
            Scalar::Bin(b) => write!(f, "[binary {} bytes]", b.len()),
            Scalar::List(_) | Scalar::Record(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::I64(i)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One materialized partition: a row identity per row plus named columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RowBatch {
    pub index: Vec<Scalar>,
    pub columns: Vec<Column>,
}

impl RowBatch {
    /// Batch with a positional index `offset..offset + rows`.
    pub fn with_offset(columns: Vec<Column>, offset: usize) -> Self {
        let rows = columns.first().map(|c| c.len()).unwrap_or(0);
        let index = (offset..offset + rows)
            .map(|i| Scalar::I64(i as i64))
            .collect();
        Self { index, columns }
    }

    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Cells of one row, in column order.
    pub fn row(&self, idx: usize) -> Vec<Scalar> {
        self.columns
            .iter()
            .map(|c| c.values.get(idx).cloned().unwrap_or(Scalar::Null))
            .collect()
    }

    /// Keep only the rows for which `keep` is true.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        fn filter<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut it = keep.iter();
            values.retain(|_| *it.next().unwrap_or(&true));
        }
        filter(&mut self.index, keep);
        for col in &mut self.columns {
            filter(&mut col.values, keep);
        }
    }

    /// First `n` rows.
    pub fn truncate(&mut self, n: usize) {
        self.index.truncate(n);
        for col in &mut self.columns {
            col.values.truncate(n);
        }
    }

    /// Split into consecutive batches of at most `rows` rows each.
    pub fn split(self, rows: usize) -> Vec<RowBatch> {
        let total = self.num_rows();
        let step = rows.max(1);
        if total <= step {
            return vec![self];
        }
        let mut out = Vec::with_capacity(total.div_ceil(step));
        let mut start = 0;
        while start < total {
            let end = (start + step).min(total);
            out.push(RowBatch {
                index: self.index[start..end].to_vec(),
                columns: self
                    .columns
                    .iter()
                    .map(|c| Column::new(c.name.clone(), c.values[start..end].to_vec()))
                    .collect(),
            });
            start = end;
        }
        out
    }

    /// Vertically append `other`. Columns are matched by position.
    pub fn append(&mut self, other: RowBatch) -> Result<(), String> {
        if self.columns.is_empty() && self.index.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.columns.len() != self.columns.len() {
            return Err(format!(
                "cannot append batch with {} columns to batch with {} columns",
                other.columns.len(),
                self.columns.len()
            ));
        }
        self.index.extend(other.index);
        for (dst, src) in self.columns.iter_mut().zip(other.columns) {
            dst.values.extend(src.values);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> RowBatch {
        RowBatch::with_offset(
            vec![
                Column::new("a", vec!["x".into(), Scalar::Null, "z".into()]),
                Column::new("b", vec![Scalar::I64(1), Scalar::I64(2), Scalar::Null]),
            ],
            0,
        )
    }

    #[test]
    fn retain_drops_rows_in_every_column() {
        let mut b = batch();
        b.retain_rows(&[true, false, true]);
        assert_eq!(b.num_rows(), 2);
        assert_eq!(b.index, vec![Scalar::I64(0), Scalar::I64(2)]);
        assert_eq!(b.columns[1].values, vec![Scalar::I64(1), Scalar::Null]);
    }

    #[test]
    fn append_checks_width() {
        let mut b = batch();
        let mut narrow = batch();
        narrow.columns.pop();
        assert!(b.append(narrow).is_err());
        b.append(batch()).unwrap();
        assert_eq!(b.num_rows(), 6);
    }

    #[test]
    fn split_keeps_index_and_order() {
        let parts = batch().split(2);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].index, vec![Scalar::I64(2)]);
        assert_eq!(parts[1].columns[0].values, vec![Scalar::from("z")]);
    }

    #[test]
    fn json_decoding_keeps_nesting_and_order() {
        let v: serde_json::Value =
            serde_json::from_str(r#"{"z": 1, "a": [true, 2.5, null]}"#).unwrap();
        let s = Scalar::from_json(v.clone());
        match &s {
            Scalar::Record(rec) => {
                assert_eq!(rec.keys().collect::<Vec<_>>(), vec!["z", "a"]);
                assert_eq!(
                    rec["a"],
                    Scalar::List(vec![Scalar::Bool(true), Scalar::F64(2.5), Scalar::Null])
                );
            }
            other => panic!("expected record, got {other:?}"),
        }
        assert_eq!(s.to_json(), v);
    }

    #[test]
    fn display_renders_plain_text() {
        assert_eq!(Scalar::from("abc").to_string(), "abc");
        assert_eq!(Scalar::I64(7).to_string(), "7");
        assert_eq!(Scalar::Null.to_string(), "");
    }
}
