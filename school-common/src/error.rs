//! Common error types for the school records service

use thiserror::Error;

/// Common result type for record store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the school records crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Identifier already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Student cannot be deleted while enrollments reference it
    #[error("Student {0} is enrolled in a course")]
    StudentEnrolled(String),

    /// CSV import rejected
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// CSV import failures, all reported to the client as 400
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Only CSV files are allowed (got {0})")]
    UnsupportedFile(String),

    #[error("CSV file is empty")]
    EmptyFile,

    #[error("CSV file has a header but no data rows")]
    NoRows,

    #[error("CSV must contain columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Malformed CSV: {0}")]
    Malformed(String),

    #[error("Invalid data row {line}: {reason}")]
    InvalidRow { line: u64, reason: String },
}

impl Error {
    /// Map a failed insert to Conflict when the store rejected a duplicate key
    pub fn from_insert(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::Conflict(format!("{} already exists", what))
            }
            _ => Error::Database(err),
        }
    }
}
