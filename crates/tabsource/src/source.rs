//! The data source: one sanitized dataset plus an optional mapping.

use serde_json::Value;

use tabsource_core::types::RowBatch;
use tabsource_core::{Dataset, Error, Params, Result, SourceSpec};

use crate::emit::{to_records, Records};
use crate::loader::load;
use crate::mapping::{map_dataset, Mapping};
use crate::registry::{global_snapshot, normalize_key, ReaderRegistry};
use crate::resolve::resolve_format;
use crate::sanitize::sanitize;

/// A tabular source read through a registered format reader.
///
/// The dataset is built (not materialized) at construction and never changes
/// afterwards; every read walks it anew.
#[derive(Debug, Clone)]
pub struct DataSource {
    source: Option<SourceSpec>,
    format: String,
    attributes: Params,
    mapping: Option<Mapping>,
    /// Provenance for records without a `resource` or `path` cell.
    resource: String,
    dataset: Dataset,
}

/// Construction parameters for [`DataSource`].
#[derive(Debug, Default)]
pub struct DataSourceBuilder {
    source: Option<SourceSpec>,
    format: Option<String>,
    attributes: Params,
    mapping: Option<Mapping>,
    legacy: Params,
    registry: Option<ReaderRegistry>,
}

impl DataSourceBuilder {
    pub fn source(mut self, source: impl Into<SourceSpec>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Explicit format key; overrides the one inferred from the source.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Reader parameters. These win over defaults and legacy parameters.
    pub fn attributes(mut self, attributes: Params) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn mapping(mut self, mapping: Mapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Free-form reader parameter (deprecated, use [`Self::attribute`]).
    pub fn legacy_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.legacy.insert(key.into(), value.into());
        self
    }

    pub fn legacy_params(mut self, params: Params) -> Self {
        self.legacy.extend(params);
        self
    }

    /// Read through `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: ReaderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<DataSource> {
        let registry = self.registry.unwrap_or_else(global_snapshot);
        let source = self.source.filter(|s| !s.is_empty());

        let format = match (&self.format, &source) {
            (Some(f), _) => normalize_key(f),
            (None, Some(s)) => resolve_format(s)?,
            // legacy configs name their files with a `path` keyword
            (None, None) => match path_param(&self.legacy) {
                Some(s) => resolve_format(&s)?,
                None => {
                    return Err(Error::Config(
                        "a source or an explicit format is required".into(),
                    ))
                }
            },
        };
        tracing::debug!(format = %format, source = ?source, "building data source");

        let raw = load(
            &registry,
            &format,
            source.as_ref(),
            &self.legacy,
            &self.attributes,
        )?;
        let dataset = sanitize(&raw)?;
        tracing::debug!(columns = dataset.schema().len(), index = ?dataset.index_name(), "data source ready");

        let resource = source
            .clone()
            .or_else(|| path_param(&self.attributes))
            .or_else(|| path_param(&self.legacy))
            .map(|s| s.to_string())
            .unwrap_or_else(|| format.clone());

        Ok(DataSource {
            source,
            format,
            attributes: self.attributes,
            mapping: self.mapping.filter(|m| !m.is_empty()),
            resource,
            dataset,
        })
    }
}

/// The files named by a `path` reader parameter.
fn path_param(params: &Params) -> Option<SourceSpec> {
    serde_json::from_value(params.get("path")?.clone()).ok()
}

impl DataSource {
    pub fn builder() -> DataSourceBuilder {
        DataSourceBuilder::default()
    }

    pub fn source(&self) -> Option<&SourceSpec> {
        self.source.as_ref()
    }

    /// The normalized format key the source was read with.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn attributes(&self) -> &Params {
        &self.attributes
    }

    pub fn mapping(&self) -> Option<&Mapping> {
        self.mapping.as_ref()
    }

    /// The sanitized dataset.
    pub fn to_dataframe(&self) -> &Dataset {
        &self.dataset
    }

    /// The dataset re-shaped by the mapping; see [`map_dataset`].
    pub fn to_mapped_dataframe(&self) -> Result<Dataset> {
        let mapping = self.mapping.as_ref().ok_or(Error::MissingMapping)?;
        map_dataset(&self.dataset, mapping)
    }

    /// Row records of the sanitized dataset.
    pub fn to_records(&self) -> Records {
        to_records(&self.dataset, &self.resource)
    }

    /// Row records of the mapped dataset.
    pub fn to_mapped_records(&self) -> Result<Records> {
        Ok(to_records(&self.to_mapped_dataframe()?, &self.resource))
    }

    /// The first `n` rows of the sanitized dataset.
    pub fn head(&self, n: usize) -> Result<RowBatch> {
        self.dataset.head(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabsource_core::schema::Schema;
    use tabsource_core::types::{Column, Scalar};

    fn fixed(_source: Option<&SourceSpec>, params: &Params) -> Result<Dataset> {
        let label = params.get("label").and_then(Value::as_str).unwrap_or("none");
        let batch = RowBatch::with_offset(
            vec![
                Column::new(" id", vec!["r1".into(), "r2".into()]),
                Column::new("text ", vec!["a".into(), Scalar::Null]),
                Column::new("label", vec![label.into(), label.into()]),
            ],
            0,
        );
        Ok(Dataset::from_batch(
            Schema::utf8(&[" id", "text ", "label"]),
            batch,
            1,
        ))
    }

    fn registry() -> ReaderRegistry {
        let mut defaults = Params::new();
        defaults.insert("label".into(), json!("default"));
        let mut reg = ReaderRegistry::new();
        reg.register("fixed", fixed, defaults);
        reg
    }

    #[test]
    fn builds_sanitized_dataset() {
        let ds = DataSource::builder()
            .source("things.fixed")
            .registry(registry())
            .build()
            .unwrap();
        assert_eq!(ds.format(), "fixed");
        assert_eq!(ds.to_dataframe().columns(), vec!["text", "label"]);

        let records: Vec<_> = ds.to_records().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], Scalar::from("r1"));
        assert_eq!(records[1]["text"], Scalar::from(""));
        assert_eq!(records[0]["resource"], Scalar::from("things.fixed"));
    }

    #[test]
    fn attributes_override_legacy_params_and_defaults() {
        let ds = DataSource::builder()
            .format("FIXED")
            .registry(registry())
            .legacy_param("label", "legacy")
            .build()
            .unwrap();
        assert_eq!(ds.head(1).unwrap().columns[1].values[0], Scalar::from("legacy"));
        assert_eq!(ds.to_records().next().unwrap().unwrap()["resource"], Scalar::from("fixed"));

        let ds = DataSource::builder()
            .format("fixed")
            .registry(registry())
            .legacy_param("label", "legacy")
            .attribute("label", "attr")
            .build()
            .unwrap();
        assert_eq!(ds.head(1).unwrap().columns[1].values[0], Scalar::from("attr"));
    }

    #[test]
    fn format_needs_a_source_or_a_key() {
        let err = DataSource::builder().registry(registry()).build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let ds = DataSource::builder()
            .registry(registry())
            .legacy_param("path", "legacy.fixed")
            .build()
            .unwrap();
        assert_eq!(ds.format(), "fixed");
    }

    #[test]
    fn mapped_views() {
        let ds = DataSource::builder()
            .source("things.fixed")
            .registry(registry())
            .mapping(Mapping::new().with("tokens", vec!["text", "label"]))
            .build()
            .unwrap();
        let rec = ds.to_mapped_records().unwrap().next().unwrap().unwrap();
        assert_eq!(rec.keys().collect::<Vec<_>>(), vec!["id", "tokens", "resource"]);
        let Scalar::Record(tokens) = &rec["tokens"] else {
            panic!("expected a record");
        };
        assert_eq!(tokens["label"], Scalar::from("default"));

        let unmapped = DataSource::builder()
            .source("things.fixed")
            .registry(registry())
            .build()
            .unwrap();
        assert!(matches!(unmapped.to_mapped_dataframe(), Err(Error::MissingMapping)));
    }

    #[test]
    fn unknown_formats_fail_at_construction() {
        let err = DataSource::builder()
            .source("things.fixed")
            .format("not-found")
            .registry(registry())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }
}
