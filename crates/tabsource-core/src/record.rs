//! Row records and the reserved column/field names.

use crate::types::Record;

/// Row identity field; a source column with this name becomes the index.
pub const ID: &str = "id";

/// Provenance field naming the resource a record was read from.
pub const RESOURCE: &str = "resource";

/// Column file readers add with the originating file of each row.
pub const PATH_COLUMN_NAME: &str = "path";

/// One row as an ordered mapping: identity first, provenance last.
pub type RowRecord = Record;
