// ⚠️ Error taxonomy for the reporting pipeline
// One enum for every stage; the binary adds stage context with anyhow.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// No candidate location held any of the requested input files.
    #[error("Could not find any of: {}", names.join(", "))]
    NotFound { names: Vec<String> },

    /// A `date` or `amount` cell could not be coerced to its canonical type.
    #[error("Parse error in {table}.{column} (row {row}): {value:?} {reason}")]
    Parse {
        table: String,
        column: String,
        row: usize,
        value: String,
        reason: String,
    },

    /// An aggregate query ran before the store held the table it reads.
    #[error("Store not ready: table '{table}' does not exist")]
    StoreNotReady { table: String },

    /// A table cannot be written with the given shape.
    #[error("Invalid table '{table}': {reason}")]
    InvalidTable { table: String, reason: String },

    #[error("Store error: {0}")]
    StoreIo(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to access {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Attach a path to an I/O failure.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::File {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_every_name() {
        let err = PipelineError::NotFound {
            names: vec!["users_data.csv".to_string(), "users.csv".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Could not find any of: users_data.csv, users.csv"
        );
    }

    #[test]
    fn test_parse_error_identifies_cell() {
        let err = PipelineError::Parse {
            table: "transactions".to_string(),
            column: "amount".to_string(),
            row: 7,
            value: "$12x".to_string(),
            reason: "is not a number".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("transactions.amount"));
        assert!(msg.contains("row 7"));
        assert!(msg.contains("\"$12x\""));
    }

    #[test]
    fn test_sqlite_errors_convert() {
        let err: PipelineError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, PipelineError::StoreIo(_)));
    }
}
