use thiserror::Error;

/// Canonical result for core and the data source.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Format '{format}' not supported. Supported formats are: {}", .supported.join(", "))]
    UnsupportedFormat {
        format: String,
        supported: Vec<String>,
    },

    #[error("Source must be homogeneous, found formats: {}", .0.join(", "))]
    HeterogeneousSource(Vec<String>),

    #[error("A mapping is required to build the mapped dataset")]
    MissingMapping,

    #[error("Did not find columns [{}] in the data source columns [{}]", .missing.join(", "), .available.join(", "))]
    UnknownColumn {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Cannot find the 'label' value in the given format")]
    LegacyLabelResolution,

    #[error("Unsupported legacy feature: {0}")]
    UnsupportedLegacyFeature(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    // Readers live in other crates and map their failures into this variant.
    #[error("Reader error: {0}")]
    Reader(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
