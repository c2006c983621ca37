//! Logical field → source column(s) mapping and the mapped view.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use tabsource_core::schema::{DataType, Field, Schema};
use tabsource_core::types::{Column, Record, RowBatch, Scalar};
use tabsource_core::{Dataset, Error, Result};

/// One logical field's source: a single column (1:1) or several columns
/// folded into a record per row (1:N).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Single(String),
    Many(Vec<String>),
}

impl ColumnRef {
    pub fn names(&self) -> &[String] {
        match self {
            ColumnRef::Single(name) => std::slice::from_ref(name),
            ColumnRef::Many(names) => names,
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(s: &str) -> Self {
        ColumnRef::Single(s.to_string())
    }
}

impl From<Vec<&str>> for ColumnRef {
    fn from(v: Vec<&str>) -> Self {
        ColumnRef::Many(v.into_iter().map(str::to_string).collect())
    }
}

/// Logical field name → column reference, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mapping {
    fields: IndexMap<String, ColumnRef>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, columns: impl Into<ColumnRef>) -> Self {
        self.insert(field, columns);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, columns: impl Into<ColumnRef>) {
        self.fields.insert(field.into(), columns.into());
    }

    pub fn get(&self, field: &str) -> Option<&ColumnRef> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ColumnRef)> {
        self.fields.iter()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, ColumnRef)> for Mapping {
    fn from_iter<T: IntoIterator<Item = (String, ColumnRef)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// How one mapped column is computed from a conformed input batch.
#[derive(Debug, Clone)]
struct Projection {
    /// Input column positions, in declared order (duplicate names included).
    sources: Vec<usize>,
    names: Vec<String>,
}

impl Projection {
    fn cell(&self, row: &[&Scalar]) -> Scalar {
        if let [only] = row {
            return (*only).clone();
        }
        let mut rec = Record::new();
        for (name, value) in self.names.iter().zip(row) {
            rec.insert(name.clone(), (*value).clone());
        }
        Scalar::Record(rec)
    }
}

/// Derive the mapped view: exactly the mapping's fields, in mapping order,
/// sharing `dataset`'s row index. `dataset` itself is left untouched.
pub fn map_dataset(dataset: &Dataset, mapping: &Mapping) -> Result<Dataset> {
    let input = dataset.schema();
    let available = input.names();

    let mut missing: Vec<String> = Vec::new();
    for (_, columns) in mapping.iter() {
        for name in columns.names() {
            if input.index_of(name).is_none() && !missing.contains(name) {
                missing.push(name.clone());
            }
        }
    }
    if !missing.is_empty() {
        return Err(Error::UnknownColumn { missing, available });
    }

    let mut fields = Vec::with_capacity(mapping.len());
    let mut projections = Vec::with_capacity(mapping.len());
    for (field, columns) in mapping.iter() {
        let sources: Vec<usize> = columns
            .names()
            .iter()
            .flat_map(|name| input.indices_of(name))
            .collect();
        let (data_type, nullable) = match sources.as_slice() {
            [only] => {
                let src = &input.fields[*only];
                (src.data_type, src.nullable)
            }
            _ => (DataType::Struct, false),
        };
        fields.push(Field::new(field.as_str(), data_type, nullable));
        projections.push(Projection {
            names: sources.iter().map(|i| input.fields[*i].name.clone()).collect(),
            sources,
        });
    }

    Ok(dataset.map_partitions(Schema::new(fields), move |batch| {
        let rows = batch.num_rows();
        let columns = projections
            .iter()
            .map(|p| {
                let values = (0..rows)
                    .map(|r| {
                        let row: Vec<&Scalar> =
                            p.sources.iter().map(|i| &batch.columns[*i].values[r]).collect();
                        p.cell(&row)
                    })
                    .collect();
                // names are assigned from the schema when the batch is conformed
                Column::new(String::new(), values)
            })
            .collect();
        Ok(RowBatch {
            index: batch.index,
            columns,
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Dataset {
        let schema = Schema::utf8(&["persons.0.name", "persons.0.lastName", "text", "text"]);
        let batch = RowBatch::with_offset(
            vec![
                Column::new("persons.0.name", vec!["Alice".into(), "Bob".into()]),
                Column::new("persons.0.lastName", vec!["Smith".into(), "Jones".into()]),
                Column::new("text", vec!["t1".into(), "t2".into()]),
                Column::new("text", vec!["u1".into(), "u2".into()]),
            ],
            0,
        );
        Dataset::from_batch(schema, batch, 1)
    }

    #[test]
    fn one_to_one_and_one_to_many() {
        let mapping = Mapping::new()
            .with("persons", vec!["persons.0.name", "persons.0.lastName"])
            .with("first", "persons.0.name");
        let mapped = map_dataset(&people(), &mapping).unwrap();
        assert_eq!(mapped.columns(), vec!["persons", "first"]);
        assert_eq!(mapped.schema().fields[0].data_type, DataType::Struct);
        assert_eq!(mapped.npartitions(), 2);

        let batch = mapped.collect().unwrap();
        let mut expected = Record::new();
        expected.insert("persons.0.name".into(), "Alice".into());
        expected.insert("persons.0.lastName".into(), "Smith".into());
        assert_eq!(batch.columns[0].values[0], Scalar::Record(expected));
        assert_eq!(batch.columns[1].values, vec![Scalar::from("Alice"), Scalar::from("Bob")]);
        assert_eq!(batch.index, vec![Scalar::I64(0), Scalar::I64(1)]);
    }

    #[test]
    fn single_name_list_is_not_wrapped() {
        let mapping = Mapping::new().with("name", vec!["persons.0.name"]);
        let batch = map_dataset(&people(), &mapping).unwrap().collect().unwrap();
        assert_eq!(batch.columns[0].values[1], Scalar::from("Bob"));
    }

    #[test]
    fn duplicate_names_fold_into_a_record() {
        let mapping = Mapping::new().with("text", "text");
        let batch = map_dataset(&people(), &mapping).unwrap().collect().unwrap();
        let Scalar::Record(rec) = &batch.columns[0].values[0] else {
            panic!("expected a record");
        };
        assert_eq!(rec.len(), 1);
        assert_eq!(rec["text"], Scalar::from("u1"));
    }

    #[test]
    fn unknown_columns_are_named() {
        let mapping = Mapping::new()
            .with("a", "missing")
            .with("b", vec!["text", "other", "missing"]);
        match map_dataset(&people(), &mapping) {
            Err(Error::UnknownColumn { missing, available }) => {
                assert_eq!(missing, vec!["missing", "other"]);
                assert_eq!(available.len(), 4);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn deserializes_single_and_list_references() {
        let mapping: Mapping =
            serde_json::from_str(r#"{"text": "body", "label": ["a", "b"]}"#).unwrap();
        assert_eq!(mapping.field_names(), vec!["text", "label"]);
        assert_eq!(mapping.get("text"), Some(&ColumnRef::from("body")));
        assert_eq!(mapping.get("label").unwrap().names().len(), 2);
    }
}
