//! Format key → reader dispatch.
//!
//! A `ReaderRegistry` is a plain value: data sources are built against a
//! snapshot of one, so registering a format only affects sources constructed
//! afterwards. The process-wide registry behind [`add_supported_format`] is
//! guarded by a lock and cloned at construction time.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde_json::json;

use tabsource_core::config::ReadConfig;
use tabsource_core::{Error, FormatReader, Params, Result};
use tabsource_io::{CsvReader, JsonReader};

/// Key of the search-index backend, which has no file-system source.
pub const ELASTICSEARCH: &str = "elasticsearch";

/// A reader plus the parameters it is called with unless overridden.
#[derive(Clone)]
pub struct ReaderEntry {
    pub reader: Arc<dyn FormatReader>,
    pub defaults: Params,
}

impl fmt::Debug for ReaderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderEntry")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReaderRegistry {
    entries: HashMap<String, ReaderEntry>,
}

/// Lower-cased, trimmed format key.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

impl ReaderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in formats, with defaults taken from `config`.
    ///
    /// Workbook, Parquet and search-index entries are always present; when
    /// their crate feature is off, reading through them fails with an error
    /// naming the feature.
    pub fn with_builtin(config: &ReadConfig) -> Self {
        let mut file_defaults = Params::new();
        file_defaults.insert("include_path_column".into(), json!(config.include_path_column));
        file_defaults.insert("rows_per_partition".into(), json!(config.rows_per_partition));

        // every cell of a text format is kept as text, empty cells included
        let mut text_defaults = file_defaults.clone();
        text_defaults.insert("na_filter".into(), json!(false));

        let mut es_defaults = Params::new();
        es_defaults.insert("es_host".into(), json!(config.es_host));
        es_defaults.insert("rows_per_partition".into(), json!(config.rows_per_partition));

        let mut reg = Self::new();
        reg.insert("csv", Arc::new(CsvReader), text_defaults.clone());
        for key in ["json", "jsonl", "json-l"] {
            reg.insert(key, Arc::new(JsonReader), file_defaults.clone());
        }
        for key in ["xls", "xlsx"] {
            reg.insert(key, excel_reader(), text_defaults.clone());
        }
        reg.insert("parquet", parquet_reader(), file_defaults);
        reg.insert(ELASTICSEARCH, elasticsearch_reader(), es_defaults);
        reg
    }

    fn insert(&mut self, key: &str, reader: Arc<dyn FormatReader>, defaults: Params) {
        self.entries
            .insert(normalize_key(key), ReaderEntry { reader, defaults });
    }

    /// Add or replace the reader for `key`. Replacing is allowed and logged.
    pub fn register(&mut self, key: &str, reader: impl FormatReader + 'static, defaults: Params) {
        let key = normalize_key(key);
        if self.entries.contains_key(&key) {
            tracing::warn!(format = %key, "Already defined format, replacing its reader");
        }
        self.insert(&key, Arc::new(reader), defaults);
    }

    /// Case-insensitive, whitespace-trimmed lookup.
    pub fn lookup(&self, key: &str) -> Result<&ReaderEntry> {
        self.entries
            .get(&normalize_key(key))
            .ok_or_else(|| Error::UnsupportedFormat {
                format: key.to_string(),
                supported: self.formats(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize_key(key))
    }

    /// Known format keys, sorted.
    pub fn formats(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(feature = "excel")]
fn excel_reader() -> Arc<dyn FormatReader> {
    Arc::new(tabsource_io::ExcelReader)
}

#[cfg(not(feature = "excel"))]
fn excel_reader() -> Arc<dyn FormatReader> {
    Arc::new(tabsource_io::Unavailable {
        format: "xlsx",
        feature: "excel",
    })
}

#[cfg(feature = "parquet")]
fn parquet_reader() -> Arc<dyn FormatReader> {
    Arc::new(tabsource_io::ParquetReader)
}

#[cfg(not(feature = "parquet"))]
fn parquet_reader() -> Arc<dyn FormatReader> {
    Arc::new(tabsource_io::Unavailable {
        format: "parquet",
        feature: "parquet",
    })
}

#[cfg(feature = "elasticsearch")]
fn elasticsearch_reader() -> Arc<dyn FormatReader> {
    Arc::new(tabsource_io::ElasticsearchReader)
}

#[cfg(not(feature = "elasticsearch"))]
fn elasticsearch_reader() -> Arc<dyn FormatReader> {
    Arc::new(tabsource_io::Unavailable {
        format: ELASTICSEARCH,
        feature: "elasticsearch",
    })
}

static GLOBAL: Lazy<RwLock<ReaderRegistry>> =
    Lazy::new(|| RwLock::new(ReaderRegistry::with_builtin(&ReadConfig::from_env())));

/// Register a format in the process-wide registry. Takes effect for data
/// sources constructed afterwards.
pub fn add_supported_format(key: &str, reader: impl FormatReader + 'static, defaults: Params) {
    GLOBAL
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(key, reader, defaults);
}

/// A copy of the process-wide registry as it is right now.
pub fn global_snapshot() -> ReaderRegistry {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Format keys of the process-wide registry, sorted.
pub fn supported_formats() -> Vec<String> {
    global_snapshot().formats()
}
