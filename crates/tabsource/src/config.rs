//! YAML data source definitions.
//!
//! ```yaml
//! source: data/train.jsonl        # or a list of paths, or a backend name
//! format: json                    # optional, inferred from `source`
//! attributes: { flatten: true }   # reader parameters
//! mapping:
//!   text: [title, body]
//!   label: category
//! ```
//!
//! `forward` is accepted in place of `mapping`. Any other top-level key is
//! passed to the reader as a (deprecated) free-form parameter. Relative paths
//! under `source` and `path` keys are resolved against the file's directory,
//! except inside the mapping.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tabsource_core::{Error, Params, Result, SourceSpec};
use tabsource_io::paths::{is_relative_file_system_path, resolve_relative};

use crate::legacy::normalize_mapping;
use crate::mapping::Mapping;
use crate::source::DataSource;

const PATH_KEYS: [&str; 2] = ["path", "source"];

/// What [`DataSource::to_yaml`] writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub source: Option<SourceSpec>,
    #[serde(default)]
    pub attributes: Params,
    pub mapping: Option<Mapping>,
}

/// Resolve relative file-system paths under `PATH_KEYS`, at any depth.
pub fn make_paths_relative(base: &Path, value: &mut Value) {
    match value {
        Value::Object(map) => resolve_in_map(base, map),
        Value::Array(items) => items.iter_mut().for_each(|v| make_paths_relative(base, v)),
        _ => {}
    }
}

fn resolve_in_map(base: &Path, map: &mut Map<String, Value>) {
    for (key, v) in map.iter_mut() {
        if PATH_KEYS.contains(&key.as_str()) {
            resolve_paths(base, v);
        } else {
            make_paths_relative(base, v);
        }
    }
}

fn resolve_paths(base: &Path, value: &mut Value) {
    match value {
        Value::String(s) => *s = resolve_relative(base, s),
        Value::Array(items) => items.iter_mut().for_each(|v| resolve_paths(base, v)),
        other => make_paths_relative(base, other),
    }
}

fn yaml_error(path: &Path, e: serde_yaml::Error) -> Error {
    Error::Config(format!("{}: {e}", path.display()))
}

fn take_mapping(cfg: &mut Map<String, Value>) -> Result<Option<Mapping>> {
    let mut raw = cfg.remove("mapping").filter(|m| !is_empty(m));
    let forward = cfg.remove("forward");
    if raw.is_none() {
        if let Some(forward) = forward {
            tracing::warn!(deprecated = true, key = "forward", "The 'forward' key is deprecated, use 'mapping'");
            raw = Some(forward).filter(|m| !is_empty(m));
        }
    }
    raw.map(normalize_mapping).transpose()
}

fn is_empty(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

impl DataSource {
    /// Build a data source from a YAML definition file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<DataSource> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_yaml_str(&text, base).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Build a data source from YAML text, resolving relative paths against
    /// `base_dir`.
    pub fn from_yaml_str(text: &str, base_dir: &Path) -> Result<DataSource> {
        let doc: Value = serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        let mut cfg = match doc {
            Value::Object(map) => map,
            other => {
                return Err(Error::Config(format!(
                    "a data source definition must be a map, got {other}"
                )))
            }
        };

        // mapping values are column names, never paths
        let mapping = take_mapping(&mut cfg)?;
        resolve_in_map(base_dir, &mut cfg);
        let mut builder = DataSource::builder();
        if let Some(mapping) = mapping {
            builder = builder.mapping(mapping);
        }
        match cfg.remove("source") {
            None | Some(Value::Null) => {}
            Some(v) => builder = builder.source(serde_json::from_value::<SourceSpec>(v)?),
        }
        match cfg.remove("format") {
            None | Some(Value::Null) => {}
            Some(Value::String(f)) => builder = builder.format(f),
            Some(other) => return Err(Error::Config(format!("invalid format: {other}"))),
        }
        match cfg.remove("attributes") {
            None | Some(Value::Null) => {}
            Some(Value::Object(attrs)) => builder = builder.attributes(attrs.into_iter().collect()),
            Some(other) => return Err(Error::Config(format!("invalid attributes: {other}"))),
        }
        builder.legacy_params(cfg.into_iter().collect()).build()
    }

    /// Write this source's definition to `path` and return the path.
    ///
    /// With `make_source_path_absolute`, relative file-system sources are
    /// written relative to the current directory's absolute path.
    pub fn to_yaml(
        &self,
        path: impl AsRef<Path>,
        make_source_path_absolute: bool,
    ) -> Result<PathBuf> {
        let path = path.as_ref();
        let mut source = self.source().cloned();
        if make_source_path_absolute {
            let cwd = std::env::current_dir()?;
            source = source.map(|s| absolute(&cwd, s));
        }
        let cfg = DataSourceConfig {
            source,
            attributes: self.attributes().clone(),
            mapping: self.mapping().cloned(),
        };
        let text = serde_yaml::to_string(&cfg).map_err(|e| yaml_error(path, e))?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, text)?;
        Ok(path.to_path_buf())
    }
}

fn absolute(cwd: &Path, source: SourceSpec) -> SourceSpec {
    let fix = |p: String| {
        if is_relative_file_system_path(&p) {
            cwd.join(&p).to_string_lossy().into_owned()
        } else {
            p
        }
    };
    match source {
        SourceSpec::Single(p) => SourceSpec::Single(fix(p)),
        SourceSpec::Many(ps) => SourceSpec::Many(ps.into_iter().map(fix).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::capture_warnings;
    use serde_json::json;

    #[test]
    fn relative_paths_resolve_at_any_depth() {
        let mut doc = json!({
            "source": ["a.csv", "/abs/b.csv"],
            "attributes": {"path": "nested.csv", "other": "keep.csv"},
            "path": "s3://bucket/c.csv"
        });
        make_paths_relative(Path::new("/cfg"), &mut doc);
        assert_eq!(doc["source"], json!(["/cfg/a.csv", "/abs/b.csv"]));
        assert_eq!(doc["attributes"]["path"], json!("/cfg/nested.csv"));
        assert_eq!(doc["attributes"]["other"], json!("keep.csv"));
        assert_eq!(doc["path"], json!("s3://bucket/c.csv"));
    }

    #[test]
    fn forward_is_read_when_mapping_is_missing() {
        let mut cfg = json!({"forward": {"target": "y"}, "mapping": null});
        let Value::Object(cfg) = &mut cfg else { unreachable!() };
        let (mapping, warnings) = capture_warnings(|| take_mapping(&mut *cfg));
        assert_eq!(mapping.unwrap().unwrap().field_names(), vec!["label"]);
        assert!(cfg.is_empty());
        assert!(warnings[0].contains("'forward'"));
        assert!(warnings[1].contains("'target'"));
    }

    #[test]
    fn absolute_sources_only_touch_relative_paths() {
        let cwd = Path::new("/work");
        assert_eq!(
            absolute(cwd, SourceSpec::from(vec!["a.csv", "/b.csv"])),
            SourceSpec::from(vec!["/work/a.csv", "/b.csv"])
        );
    }
}
