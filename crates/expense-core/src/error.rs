use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the expense tracker.
///
/// The aggregation functions never fail; these variants cover the store,
/// input parsing and configuration layers around them.
#[derive(Error, Debug)]
pub enum ExpenseError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A date string did not match any recognised format.
    #[error("Invalid date format: {0}")]
    DateParse(String),

    /// A new expense failed validation before reaching the store.
    #[error("Invalid expense: {0}")]
    InvalidExpense(String),

    /// No expense with the given id exists.
    #[error("Expense not found: {0}")]
    NotFound(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the expense crates.
pub type Result<T> = std::result::Result<T, ExpenseError>;
