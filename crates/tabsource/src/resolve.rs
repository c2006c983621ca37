//! Format key inference from a source spec.

use std::collections::BTreeSet;
use std::path::Path;

use tabsource_core::{Error, Result, SourceSpec};

use crate::registry::normalize_key;

/// Format key of one path: its extension, or its file name when it has none
/// (`elasticsearch` names the search-index backend).
pub fn format_of(path: &str) -> String {
    let p = Path::new(path);
    let key = match p.extension() {
        Some(ext) => ext.to_string_lossy(),
        None => p
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.into()),
    };
    normalize_key(&key)
}

/// The single format every path of `source` resolves to.
pub fn resolve_format(source: &SourceSpec) -> Result<String> {
    let formats: BTreeSet<String> = source.paths().into_iter().map(format_of).collect();
    let mut iter = formats.iter();
    match (iter.next(), iter.next()) {
        (Some(only), None) => Ok(only.clone()),
        (None, _) => Err(Error::Config("cannot infer a format from an empty source".into())),
        _ => Err(Error::HeterogeneousSource(formats.into_iter().collect())),
    }
}
