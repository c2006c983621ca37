//! Normalization applied to every freshly loaded dataset.
//!
//! 1. rows whose cells are all missing are dropped;
//! 2. column names are trimmed;
//! 3. missing cells become empty strings in columns that hold text; other
//!    columns keep them, with one warning per column that has any;
//! 4. an `id` column, if any, becomes the row index.
//!
//! Running it twice changes nothing the second time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tabsource_core::record::ID;
use tabsource_core::types::Scalar;
use tabsource_core::{Dataset, Result};

pub fn sanitize(raw: &Dataset) -> Result<Dataset> {
    let mut schema = raw.schema().clone();
    for field in &mut schema.fields {
        let trimmed = field.name.trim();
        if trimmed.len() != field.name.len() {
            field.name = trimmed.to_string();
        }
    }

    let fillable: Vec<bool> = schema
        .fields
        .iter()
        .map(|f| f.data_type.accepts_str())
        .collect();
    let warned: Arc<Vec<AtomicBool>> =
        Arc::new(fillable.iter().map(|_| AtomicBool::new(false)).collect());
    let fields = schema.fields.clone();

    let cleaned = raw.map_partitions(schema, move |mut batch| {
        if !batch.columns.is_empty() {
            let keep: Vec<bool> = (0..batch.num_rows())
                .map(|r| batch.columns.iter().any(|c| !c.values[r].is_null()))
                .collect();
            batch.retain_rows(&keep);
        }
        for (i, (col, fill)) in batch.columns.iter_mut().zip(&fillable).enumerate() {
            if *fill {
                for cell in col.values.iter_mut().filter(|c| c.is_null()) {
                    *cell = Scalar::Str(String::new());
                }
            } else if col.values.iter().any(Scalar::is_null)
                && !warned[i].swap(true, Ordering::Relaxed)
            {
                tracing::warn!(
                    column = %fields[i].name,
                    data_type = ?fields[i].data_type,
                    "Cannot set missing values as empty string for column"
                );
            }
        }
        Ok(batch)
    });

    if cleaned.schema().index_of(ID).is_some() {
        tracing::debug!(index = ID, "promoting column to row index");
        return cleaned.set_index(ID);
    }
    Ok(cleaned)
}
