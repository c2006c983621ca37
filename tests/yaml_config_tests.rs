//! YAML data source definitions: loading, legacy keys and writing back

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tabsource::{ColumnRef, DataSource, DataSourceConfig, Error, Mapping, SourceSpec};
use tabsource_core::types::Scalar;

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tabsource-yaml-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(dir.join("data")).unwrap();
    fs::write(
        dir.join("data/reviews.csv"),
        "id,title,body,stars\n1,Nice,Works well,5\n2,Bad,Broke,1\n",
    )
    .unwrap();
    dir
}

fn write_yaml(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("source.yml");
    fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn test_relative_source_is_resolved_against_the_config() {
    let dir = temp_dir();
    let cfg = write_yaml(
        &dir,
        r#"
source: data/reviews.csv
attributes:
  include_path_column: false
mapping:
  text: [title, body]
  label: stars
"#,
    );

    let ds = DataSource::from_yaml(&cfg).unwrap();
    let expected = dir.join("data/reviews.csv").to_string_lossy().into_owned();
    assert_eq!(ds.source(), Some(&SourceSpec::Single(expected)));
    assert_eq!(ds.to_dataframe().columns(), vec!["title", "body", "stars"]);

    let rec = ds.to_mapped_records().unwrap().next().unwrap().unwrap();
    assert_eq!(rec["label"], Scalar::from("5"));
    let Scalar::Record(text) = &rec["text"] else {
        panic!("expected a folded record");
    };
    assert_eq!(text["title"], Scalar::from("Nice"));
    assert_eq!(text["body"], Scalar::from("Works well"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_mapping_fields_named_like_path_keys_keep_column_names() {
    let dir = temp_dir();
    fs::write(dir.join("data/origins.csv"), "origin,text
web,hello
mail,bye
").unwrap();
    let cfg = write_yaml(
        &dir,
        r#"
source: data/origins.csv
mapping:
  source: origin
  path: [origin, text]
  text: text
"#,
    );

    let ds = DataSource::from_yaml(&cfg).unwrap();
    let mapping = ds.mapping().unwrap();
    assert_eq!(mapping.get("source"), Some(&ColumnRef::from("origin")));
    assert_eq!(mapping.get("path"), Some(&ColumnRef::from(vec!["origin", "text"])));

    let mapped = ds.to_mapped_dataframe().unwrap().collect().unwrap();
    assert_eq!(mapped.columns[0].values, vec![Scalar::from("web"), Scalar::from("mail")]);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_legacy_forward_and_path_keys() {
    let dir = temp_dir();
    let cfg = write_yaml(
        &dir,
        r#"
format: csv
path: data/reviews.csv
forward:
  target: stars
  tokens: body
"#,
    );

    let ds = DataSource::from_yaml(&cfg).unwrap();
    assert_eq!(ds.source(), None);
    let mapping = ds.mapping().unwrap();
    assert_eq!(mapping.field_names(), vec!["tokens", "label"]);
    assert_eq!(mapping.get("label"), Some(&ColumnRef::from("stars")));

    let mapped = ds.to_mapped_dataframe().unwrap().collect().unwrap();
    assert_eq!(mapped.columns[1].values, vec![Scalar::from("5"), Scalar::from("1")]);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_nested_label_definitions() {
    let dir = temp_dir();
    let cfg = write_yaml(
        &dir,
        r#"
source: data/reviews.csv
mapping:
  text: body
  label:
    gold_label: stars
"#,
    );
    let ds = DataSource::from_yaml(&cfg).unwrap();
    assert_eq!(ds.mapping().unwrap().get("label"), Some(&ColumnRef::from("stars")));

    let cfg = write_yaml(
        &dir,
        r#"
source: data/reviews.csv
mapping:
  label:
    metadata_file: labels.txt
"#,
    );
    assert!(matches!(
        DataSource::from_yaml(&cfg),
        Err(Error::UnsupportedLegacyFeature(_))
    ));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_invalid_definitions() {
    let dir = temp_dir();
    let cfg = write_yaml(&dir, "- just\n- a list\n");
    assert!(matches!(DataSource::from_yaml(&cfg), Err(Error::Config(_))));

    let missing = dir.join("nope.yml");
    assert!(matches!(DataSource::from_yaml(&missing), Err(Error::Io(_))));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_to_yaml_round_trip() {
    let dir = temp_dir();
    let source = dir.join("data/reviews.csv").to_string_lossy().into_owned();
    let ds = DataSource::builder()
        .source(source.as_str())
        .attribute("include_path_column", false)
        .mapping(Mapping::new().with("text", vec!["title", "body"]).with("label", "stars"))
        .build()
        .unwrap();

    let out = ds.to_yaml(dir.join("out/written.yml"), false).unwrap();
    let written: DataSourceConfig =
        serde_yaml::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written.source, Some(SourceSpec::Single(source)));
    assert_eq!(written.attributes["include_path_column"], json!(false));
    assert_eq!(written.mapping.as_ref(), ds.mapping());

    let reloaded = DataSource::from_yaml(&out).unwrap();
    assert_eq!(reloaded.to_dataframe().columns(), ds.to_dataframe().columns());
    assert_eq!(reloaded.mapping(), ds.mapping());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_to_yaml_makes_relative_sources_absolute() {
    let dir = temp_dir();
    let relative = "tabsource-relative-source.csv";
    let absolute = std::env::current_dir().unwrap().join(relative);
    fs::write(&absolute, "a\n1\n").unwrap();

    let ds = DataSource::builder().source(relative).build().unwrap();
    let out = ds.to_yaml(dir.join("abs.yml"), true).unwrap();
    let written: DataSourceConfig =
        serde_yaml::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(
        written.source,
        Some(SourceSpec::Single(absolute.to_string_lossy().into_owned()))
    );
    let _ = fs::remove_file(&absolute);
    let _ = fs::remove_dir_all(&dir);
}
