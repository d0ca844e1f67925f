///
/// Error types for in-memory row sources.
///
/// Errors raised by a real driver (rusqlite) are passed through unchanged by
/// the scanner; these only cover `MaterializedRow`.
///

use rusqlite::types::FromSqlError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RowError {
    #[error("row has {values} values for {columns} columns")]
    ValueCount { columns: usize, values: usize },

    #[error("expected {expected} scan targets, got {found}")]
    TargetCount { expected: usize, found: usize },

    #[error("cannot convert column '{column}' at index {index}: {source}")]
    Conversion {
        index: usize,
        column: String,
        #[source]
        source: FromSqlError,
    },
}
