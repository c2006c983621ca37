use std::fmt;

use serde::{Deserialize, Serialize};

/// What a data source reads from: one path, several paths, or a backend name
/// such as a search index. Backend names are plain strings without extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceSpec {
    Single(String),
    Many(Vec<String>),
}

impl SourceSpec {
    /// The spec normalized to a list of path-like strings.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            SourceSpec::Single(p) => vec![p.as_str()],
            SourceSpec::Many(ps) => ps.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SourceSpec::Single(p) => p.is_empty(),
            SourceSpec::Many(ps) => ps.is_empty(),
        }
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.paths().join(","))
    }
}

impl From<&str> for SourceSpec {
    fn from(p: &str) -> Self {
        SourceSpec::Single(p.to_string())
    }
}

impl From<String> for SourceSpec {
    fn from(p: String) -> Self {
        SourceSpec::Single(p)
    }
}

impl From<Vec<String>> for SourceSpec {
    fn from(ps: Vec<String>) -> Self {
        SourceSpec::Many(ps)
    }
}

impl From<Vec<&str>> for SourceSpec {
    fn from(ps: Vec<&str>) -> Self {
        SourceSpec::Many(ps.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_string_or_list() {
        let one: SourceSpec = serde_json::from_str(r#""a.csv""#).unwrap();
        assert_eq!(one, SourceSpec::from("a.csv"));
        let many: SourceSpec = serde_json::from_str(r#"["a.csv", "b.csv"]"#).unwrap();
        assert_eq!(many.paths(), vec!["a.csv", "b.csv"]);
        assert_eq!(many.to_string(), "a.csv,b.csv");
    }
}
