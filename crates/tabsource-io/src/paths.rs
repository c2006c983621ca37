//! Source path handling shared by the file readers and the config loader.

use std::path::{Path, PathBuf};

use tabsource_core::reader::Params;
use tabsource_core::SourceSpec;

use crate::error::{Error, Result};

/// Paths a file reader should read: the positional source if given, else the
/// `path` parameter (a string or a list of strings).
pub fn source_paths(source: Option<&SourceSpec>, params: &Params) -> Result<Vec<String>> {
    if let Some(spec) = source {
        return Ok(spec.paths().into_iter().map(str::to_string).collect());
    }
    match params.get("path") {
        Some(serde_json::Value::String(p)) => Ok(vec![p.clone()]),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::Params(format!("non-string entry in 'path': {v}")))
            })
            .collect(),
        Some(other) => Err(Error::Params(format!("unsupported 'path' value: {other}"))),
        None => Err(Error::Params(
            "no source given and no 'path' parameter".to_string(),
        )),
    }
}

pub fn has_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand glob patterns; literal paths pass through untouched. Every pattern
/// must match at least one file.
pub fn expand(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for pattern in patterns {
        if !has_glob(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched: Vec<PathBuf> = glob::glob(pattern)?
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect();
        if matched.is_empty() {
            return Err(Error::NoMatch(pattern.clone()));
        }
        matched.sort();
        out.extend(matched);
    }
    Ok(out)
}

/// A relative local path: not absolute and not a URL such as `s3://bucket`.
pub fn is_relative_file_system_path(s: &str) -> bool {
    if s.is_empty() || Path::new(s).is_absolute() {
        return false;
    }
    // single-letter schemes are drive letters, not URLs
    !matches!(url::Url::parse(s), Ok(u) if u.scheme().len() > 1)
}

/// Resolve `s` against `base` when it is a relative local path.
pub fn resolve_relative(base: &Path, s: &str) -> String {
    if is_relative_file_system_path(s) {
        base.join(s).to_string_lossy().into_owned()
    } else {
        s.to_string()
    }
}

pub(crate) fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
