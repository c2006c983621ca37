//! Reader configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadConfig {
    /// Rows per partition for readers that decode eagerly (JSON, workbooks).
    pub rows_per_partition: usize,

    /// Whether file readers add a `path` column with each row's file.
    pub include_path_column: bool,

    /// Default search-index endpoint.
    pub es_host: String,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            rows_per_partition: 10_000,
            include_path_column: true,
            es_host: "http://localhost:9200".to_string(),
        }
    }
}

impl ReadConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TABSOURCE_ROWS_PER_PARTITION`: rows per eagerly decoded partition
    /// - `TABSOURCE_INCLUDE_PATH_COLUMN`: `true`/`false`
    /// - `TABSOURCE_ES_HOST`: search-index endpoint
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TABSOURCE_ROWS_PER_PARTITION") {
            if let Ok(v) = s.parse::<usize>() {
                if v > 0 {
                    cfg.rows_per_partition = v;
                }
            }
        }

        if let Ok(s) = std::env::var("TABSOURCE_INCLUDE_PATH_COLUMN") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.include_path_column = v;
            }
        }

        if let Ok(s) = std::env::var("TABSOURCE_ES_HOST") {
            cfg.es_host = s;
        }

        cfg
    }
}
