//! Schema mapping and record emission through a DataSource

use std::fs;
use std::path::PathBuf;

use serde_json::json;
use tabsource::legacy::normalize_mapping;
use tabsource::{ColumnRef, DataSource, Error, Mapping, RowRecord};
use tabsource_core::types::{Record, Scalar};

fn temp_csv(content: &str) -> (PathBuf, String) {
    let dir = std::env::temp_dir().join(format!("tabsource-map-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    let file = dir.join("people.csv");
    fs::write(&file, content).unwrap();
    let file = file.to_string_lossy().into_owned();
    (dir, file)
}

const PEOPLE: &str = "\
id,persons.0.name,persons.0.lastName,text
1,Alice,Smith,hello
2,Bob,Jones,bye
";

#[test]
fn test_one_to_one_round_trip() {
    let (dir, file) = temp_csv(PEOPLE);
    let ds = DataSource::builder()
        .source(file.as_str())
        .mapping(Mapping::new().with("tokens", "text").with("name", "persons.0.name"))
        .build()
        .unwrap();

    let raw: Vec<RowRecord> = ds.to_records().collect::<Result<_, _>>().unwrap();
    let mapped: Vec<RowRecord> = ds.to_mapped_records().unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(raw.len(), mapped.len());
    for (r, m) in raw.iter().zip(&mapped) {
        assert_eq!(r["id"], m["id"]);
        assert_eq!(r["text"], m["tokens"]);
        assert_eq!(r["persons_0_name"], m["name"]);
    }
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_one_to_many_folds_into_record() {
    let (dir, file) = temp_csv(PEOPLE);
    let ds = DataSource::builder()
        .source(file.as_str())
        .mapping(Mapping::new().with("persons", vec!["persons.0.name", "persons.0.lastName"]))
        .build()
        .unwrap();

    let mapped = ds.to_mapped_dataframe().unwrap();
    assert_eq!(mapped.columns(), vec!["persons"]);
    let batch = mapped.collect().unwrap();

    let mut expected = Record::new();
    expected.insert("persons.0.name".into(), Scalar::from("Alice"));
    expected.insert("persons.0.lastName".into(), Scalar::from("Smith"));
    assert_eq!(batch.columns[0].values[0], Scalar::Record(expected));

    // the base dataset is untouched
    assert_eq!(ds.to_dataframe().columns().len(), 4);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_mapped_records_carry_id_and_resource() {
    let (dir, file) = temp_csv(PEOPLE);
    let ds = DataSource::builder()
        .source(file.as_str())
        .mapping(Mapping::new().with("label", "text"))
        .build()
        .unwrap();

    let rec = ds.to_mapped_records().unwrap().next().unwrap().unwrap();
    assert_eq!(rec.keys().collect::<Vec<_>>(), vec!["id", "label", "resource"]);
    assert_eq!(rec["id"], Scalar::from("1"));
    // no path column in the mapped view: the source itself is the resource
    assert_eq!(rec["resource"], Scalar::from(file.as_str()));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_path_column_becomes_resource() {
    let (dir, file) = temp_csv(PEOPLE);
    let ds = DataSource::builder().source(file.as_str()).build().unwrap();
    let rec = ds.to_records().next().unwrap().unwrap();
    assert_eq!(rec["path"], Scalar::from(file.as_str()));
    assert_eq!(rec["resource"], rec["path"]);
    assert_eq!(rec.keys().last().map(String::as_str), Some("resource"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_no_mapping() {
    let (dir, file) = temp_csv(PEOPLE);
    let ds = DataSource::builder().source(file.as_str()).build().unwrap();
    assert!(matches!(ds.to_mapped_dataframe(), Err(Error::MissingMapping)));
    assert!(matches!(ds.to_mapped_records(), Err(Error::MissingMapping)));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_unknown_column_is_named() {
    let (dir, file) = temp_csv(PEOPLE);
    let ds = DataSource::builder()
        .source(file.as_str())
        .mapping(Mapping::new().with("label", vec!["text", "sentiment"]))
        .build()
        .unwrap();
    match ds.to_mapped_dataframe() {
        Err(Error::UnknownColumn { missing, available }) => {
            assert_eq!(missing, vec!["sentiment"]);
            assert!(available.contains(&"text".to_string()));
            let msg = Error::UnknownColumn { missing, available }.to_string();
            assert!(msg.contains("sentiment"));
        }
        other => panic!("unexpected: {other:?}"),
    }
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_legacy_mappings_normalize() {
    let mapping = normalize_mapping(json!({"label": {"gold_label": "sentiment"}})).unwrap();
    assert_eq!(mapping, Mapping::new().with("label", "sentiment"));

    let mapping = normalize_mapping(json!({"target": "y", "text": ["a", "b"]})).unwrap();
    assert_eq!(mapping.get("label"), Some(&ColumnRef::from("y")));

    assert!(matches!(
        normalize_mapping(json!({"label": {"metadata_file": "x"}})),
        Err(Error::UnsupportedLegacyFeature(_))
    ));
    assert!(matches!(
        normalize_mapping(json!({"label": {"unknown": "x"}})),
        Err(Error::LegacyLabelResolution)
    ));
}
