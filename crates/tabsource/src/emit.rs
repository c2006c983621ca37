//! Row records from a dataset.

use tabsource_core::dataset::Rows;
use tabsource_core::record::{ID, PATH_COLUMN_NAME, RESOURCE};
use tabsource_core::types::Scalar;
use tabsource_core::{Dataset, Result, RowRecord};

/// Record key for a column: trimmed, with `.` rewritten to `_`.
pub fn record_key(column: &str) -> String {
    column.trim().replace('.', "_")
}

/// Lazy row records over `dataset`: `id` first, then one entry per column,
/// then `resource` unless a column already provided it. The resource falls
/// back to the row's `path` cell, then to `default_resource`.
///
/// Every call walks the dataset anew.
pub fn to_records(dataset: &Dataset, default_resource: &str) -> Records {
    Records {
        keys: dataset.columns().iter().map(|c| record_key(c)).collect(),
        default_resource: default_resource.to_string(),
        rows: dataset.rows(),
    }
}

/// Iterator returned by [`to_records`].
pub struct Records {
    keys: Vec<String>,
    default_resource: String,
    rows: Rows,
}

impl Records {
    fn record(&self, id: Scalar, cells: Vec<Scalar>) -> RowRecord {
        let mut rec = RowRecord::with_capacity(self.keys.len() + 2);
        rec.insert(ID.to_string(), id);
        for (key, value) in self.keys.iter().zip(cells) {
            rec.insert(key.clone(), value);
        }
        if !rec.contains_key(RESOURCE) {
            let resource = rec
                .get(PATH_COLUMN_NAME)
                .cloned()
                .unwrap_or_else(|| Scalar::Str(self.default_resource.clone()));
            rec.insert(RESOURCE.to_string(), resource);
        }
        rec
    }
}

impl Iterator for Records {
    type Item = Result<RowRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(row.map(|(id, cells)| self.record(id, cells)))
    }
}
