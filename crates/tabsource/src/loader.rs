//! Invokes the registered reader for a format with merged parameters.

use tabsource_core::{Dataset, Params, Result, SourceSpec};

use crate::registry::ReaderRegistry;

/// Merge reader parameters; later layers override earlier ones:
/// registry defaults, then legacy keyword parameters, then attributes.
pub fn merge_params(defaults: &Params, legacy: &Params, attributes: &Params) -> Params {
    let mut merged = defaults.clone();
    for layer in [legacy, attributes] {
        for (k, v) in layer {
            merged.insert(k.clone(), v.clone());
        }
    }
    merged
}

/// Read the raw dataset for `format`. The source is passed positionally when
/// present; otherwise the reader gets only the parameters.
pub fn load(
    registry: &ReaderRegistry,
    format: &str,
    source: Option<&SourceSpec>,
    legacy: &Params,
    attributes: &Params,
) -> Result<Dataset> {
    let entry = registry.lookup(format)?;
    if !legacy.is_empty() {
        tracing::warn!(
            deprecated = true,
            keys = ?legacy.keys().collect::<Vec<_>>(),
            "Passing keyword arguments is deprecated, use attributes instead"
        );
    }
    let params = merge_params(&entry.defaults, legacy, attributes);
    tracing::debug!(format, params = ?params.keys().collect::<Vec<_>>(), "loading source");
    entry.reader.read(source, &params)
}
