use std::path::PathBuf;

/// Errors raised by the store, writer, query and introspection layers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database file could not be opened or created.
    #[error("failed to open database {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("table {table} has no column named {column}")]
    UnknownColumn { table: String, column: String },

    #[error("column {column} given more than once for table {table}")]
    DuplicateColumn { table: String, column: String },

    #[error("no columns given for insert into {0}")]
    EmptyRecord(String),

    /// Required (NOT NULL, no default) columns absent from a bulk-load source.
    #[error("source for {table} is missing required columns: {}", columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    /// Untrusted SQL that is not a single read-only query.
    #[error("rejected statement: {0}")]
    RejectedStatement(String),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
