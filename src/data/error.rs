use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// DataError – everything a user action on the data layer can fail with
// ---------------------------------------------------------------------------

/// Errors raised by loading, dataset, group and plot-building operations.
///
/// None of these are fatal to the session: the action that raised it is
/// abandoned and the previous state stays as it was.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed table: {0}")]
    Format(String),

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("'{0}' is not a numeric sample column")]
    UnknownColumn(String),

    #[error("unknown columns skipped: {}", format_pairs(.0))]
    UnknownColumns(Vec<(String, String)>),

    #[error("duplicate row keys: {}", .keys.join(", "))]
    DuplicateRowKey { keys: Vec<String> },

    #[error("row '{row_key}', column '{column}': '{value}' is not a number")]
    InvalidNumericCell {
        row_key: String,
        column: String,
        value: String,
    },

    #[error("row key '{0}' not found")]
    UnknownRowKey(String),

    #[error("no row IDs selected")]
    EmptySelection,

    #[error("no group has any sample column")]
    NoGroups,

    #[error("a group named '{0}' already exists")]
    DuplicateGroupName(String),

    #[error("group name must not be empty")]
    EmptyGroupName,

    #[error("group '{0}' not found")]
    GroupNotFound(String),

    #[error("nothing has been plotted yet")]
    NoChart,
}

fn format_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(group, column)| format!("{group}/{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, DataError>;
