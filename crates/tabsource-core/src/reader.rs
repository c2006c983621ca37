//! Reader plugin contract.
//!
//! A reader turns an optional source spec plus free-form parameters into a
//! lazy `Dataset`. Readers without a file-system source (remote indexes) are
//! called with `None` and take everything from the parameters.

use indexmap::IndexMap;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::source::SourceSpec;

/// Reader parameters, merged from registry defaults and user attributes.
pub type Params = IndexMap<String, serde_json::Value>;

pub trait FormatReader: Send + Sync {
    fn read(&self, source: Option<&SourceSpec>, params: &Params) -> Result<Dataset>;
}

impl<F> FormatReader for F
where
    F: Fn(Option<&SourceSpec>, &Params) -> Result<Dataset> + Send + Sync,
{
    fn read(&self, source: Option<&SourceSpec>, params: &Params) -> Result<Dataset> {
        self(source, params)
    }
}

/// Typed lookups over `Params`, shared by the readers.
pub trait ParamsExt {
    fn get_str(&self, key: &str) -> Option<&str>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_usize(&self, key: &str) -> Option<usize>;
}

impl ParamsExt for Params {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn get_usize(&self, key: &str) -> Option<usize> {
        match self.get(key)? {
            serde_json::Value::Number(n) => n.as_u64().map(|v| v as usize),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
