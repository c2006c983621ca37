//! Lazy, partitioned tabular dataset.
//!
//! A `Dataset` is a schema plus one thunk per partition. Transformations wrap
//! the thunks of their input, so deriving a view copies the computation graph
//! and never the rows. Nothing is decoded until a partition is computed, and
//! nothing computed is cached: every traversal recomputes from the readers.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::{Column, RowBatch, Scalar};

/// Produces one materialized partition.
pub type PartitionFn = Arc<dyn Fn() -> Result<RowBatch> + Send + Sync>;

#[derive(Clone)]
pub struct Dataset {
    schema: Schema,
    index_name: Option<String>,
    partitions: Vec<PartitionFn>,
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("columns", &self.schema.names())
            .field("index_name", &self.index_name)
            .field("npartitions", &self.partitions.len())
            .finish()
    }
}

impl Dataset {
    pub fn new(schema: Schema, partitions: Vec<PartitionFn>) -> Self {
        Self {
            schema,
            index_name: None,
            partitions,
        }
    }

    /// Wrap already decoded batches, one partition each.
    pub fn from_batches(schema: Schema, batches: Vec<RowBatch>) -> Self {
        let partitions = batches
            .into_iter()
            .map(|b| {
                let b = Arc::new(b);
                Arc::new(move || Ok(RowBatch::clone(&b))) as PartitionFn
            })
            .collect();
        Self::new(schema, partitions)
    }

    /// Split one decoded batch into partitions of at most `rows_per_partition`
    /// rows. The batch's index is kept as-is.
    pub fn from_batch(schema: Schema, batch: RowBatch, rows_per_partition: usize) -> Self {
        Self::from_batches(schema, batch.split(rows_per_partition))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Ordered column names; the index column is not among them.
    pub fn columns(&self) -> Vec<String> {
        self.schema.names()
    }

    /// Name of the column promoted to row identity, if any.
    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    pub fn with_index_name(mut self, name: Option<String>) -> Self {
        self.index_name = name;
        self
    }

    pub fn npartitions(&self) -> usize {
        self.partitions.len()
    }

    /// Compute partition `i` and conform it to the schema.
    pub fn partition(&self, i: usize) -> Result<RowBatch> {
        let part = self
            .partitions
            .get(i)
            .ok_or_else(|| Error::Schema(format!("partition {i} out of range")))?;
        conform(&self.schema, part()?)
    }

    pub fn iter_partitions(&self) -> impl Iterator<Item = Result<RowBatch>> + '_ {
        (0..self.partitions.len()).map(move |i| self.partition(i))
    }

    /// Derive a dataset whose partitions are `f` applied to ours.
    ///
    /// `f` receives batches already conformed to this dataset's schema and
    /// must produce batches matching `schema`.
    pub fn map_partitions<F>(&self, schema: Schema, f: F) -> Dataset
    where
        F: Fn(RowBatch) -> Result<RowBatch> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let input_schema = Arc::new(self.schema.clone());
        let partitions = self
            .partitions
            .iter()
            .map(|part| {
                let part = Arc::clone(part);
                let f = Arc::clone(&f);
                let input_schema = Arc::clone(&input_schema);
                Arc::new(move || f(conform(&input_schema, part()?)?)) as PartitionFn
            })
            .collect();
        Dataset {
            schema,
            index_name: self.index_name.clone(),
            partitions,
        }
    }

    /// Move the first column called `name` into the row index.
    pub fn set_index(&self, name: &str) -> Result<Dataset> {
        let pos = self
            .schema
            .index_of(name)
            .ok_or_else(|| Error::Schema(format!("cannot index by missing column '{name}'")))?;
        let mut schema = self.schema.clone();
        schema.fields.remove(pos);
        let indexed = self.map_partitions(schema, move |mut batch| {
            let col = batch.columns.remove(pos);
            batch.index = col.values;
            Ok(batch)
        });
        Ok(indexed.with_index_name(Some(name.to_string())))
    }

    /// Materialize every partition into one batch.
    pub fn collect(&self) -> Result<RowBatch> {
        let mut out = self.empty_batch();
        for batch in self.iter_partitions() {
            out.append(batch?).map_err(Error::Schema)?;
        }
        Ok(out)
    }

    /// Row count. Materializes every partition.
    pub fn count(&self) -> Result<usize> {
        let mut n = 0;
        for batch in self.iter_partitions() {
            n += batch?.num_rows();
        }
        Ok(n)
    }

    /// First `n` rows, computing only as many partitions as needed.
    pub fn head(&self, n: usize) -> Result<RowBatch> {
        let mut out = self.empty_batch();
        for i in 0..self.npartitions() {
            if out.num_rows() >= n {
                break;
            }
            out.append(self.partition(i)?).map_err(Error::Schema)?;
        }
        out.truncate(n);
        Ok(out)
    }

    /// Lazy `(identity, cells)` pairs, one per row, partition by partition.
    pub fn rows(&self) -> Rows {
        Rows {
            dataset: self.clone(),
            next_partition: 0,
            batch: None,
            row: 0,
        }
    }

    fn empty_batch(&self) -> RowBatch {
        RowBatch {
            index: Vec::new(),
            columns: self
                .schema
                .fields
                .iter()
                .map(|f| Column::new(f.name.clone(), Vec::new()))
                .collect(),
        }
    }
}

/// Check a computed batch against the schema and give its columns the
/// schema's names (renames are schema-level and applied here).
fn conform(schema: &Schema, mut batch: RowBatch) -> Result<RowBatch> {
    if batch.columns.len() != schema.len() {
        return Err(Error::Schema(format!(
            "partition has {} columns, schema expects {}",
            batch.columns.len(),
            schema.len()
        )));
    }
    let rows = batch.index.len();
    for (col, field) in batch.columns.iter_mut().zip(&schema.fields) {
        if col.len() != rows {
            return Err(Error::Schema(format!(
                "column '{}' has {} values for {} rows",
                field.name,
                col.len(),
                rows
            )));
        }
        if col.name != field.name {
            col.name = field.name.clone();
        }
    }
    Ok(batch)
}

/// Row iterator returned by [`Dataset::rows`].
pub struct Rows {
    dataset: Dataset,
    next_partition: usize,
    batch: Option<RowBatch>,
    row: usize,
}

impl Iterator for Rows {
    type Item = Result<(Scalar, Vec<Scalar>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(batch) = &self.batch {
                if self.row < batch.num_rows() {
                    let r = self.row;
                    self.row += 1;
                    return Some(Ok((batch.index[r].clone(), batch.row(r))));
                }
                self.batch = None;
            }
            if self.next_partition >= self.dataset.npartitions() {
                return None;
            }
            let i = self.next_partition;
            self.next_partition += 1;
            match self.dataset.partition(i) {
                Ok(batch) => {
                    self.batch = Some(batch);
                    self.row = 0;
                }
                Err(e) => {
                    // fuse after a failed partition
                    self.next_partition = self.dataset.npartitions();
                    return Some(Err(e));
                }
            }
        }
    }
}
