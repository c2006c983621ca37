use thiserror::Error;

/// Result type local to tabsource-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("no files match '{0}'")]
    NoMatch(String),

    #[error("invalid reader parameters: {0}")]
    Params(String),

    #[error("malformed input in {path}: {msg}")]
    Malformed { path: String, msg: String },

    #[error("the '{format}' reader requires building with the `{feature}` feature")]
    FeatureDisabled {
        format: &'static str,
        feature: &'static str,
    },

    #[cfg(feature = "parquet")]
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[cfg(feature = "parquet")]
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[cfg(feature = "excel")]
    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[cfg(feature = "elasticsearch")]
    #[error("search index request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<Error> for tabsource_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(io) => tabsource_core::Error::Io(io),
            other => tabsource_core::Error::Reader(other.to_string()),
        }
    }
}
