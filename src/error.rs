//! Error types for the batch file generator.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias for generator operations
pub type Result<T> = std::result::Result<T, BatchError>;

/// Errors that can occur while encoding, writing or verifying a batch file.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Failed to create, write, flush or rename the sink
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error while loading fixture records
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Monetary amount below zero; the layout has no sign position
    #[error("Negative {field} amount {amount} cannot be encoded")]
    NegativeAmount { field: &'static str, amount: Decimal },

    /// Amount too large to be represented as minor units
    #[error("{field} amount {amount} exceeds the minor-unit range")]
    AmountOverflow { field: &'static str, amount: Decimal },

    /// Session method called in the wrong state
    #[error("Cannot {action} while session is {state}")]
    OutOfSequence {
        state: &'static str,
        action: &'static str,
    },

    /// Invalid generator configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid fixture record
    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Line that does not fit the fixed-width layout
    #[error("Malformed {kind} line: {message}")]
    MalformedLine { kind: &'static str, message: String },

    /// File ends without a trailer record
    #[error("Incomplete batch file: {0}")]
    Incomplete(String),

    /// Trailer totals disagree with the detail records
    #[error("Reconciliation failed: {0}")]
    Reconciliation(String),

    /// Missing record count argument
    #[error("Missing record count argument. Usage: batch-file-generator [--output-dir DIR] <count>...")]
    MissingArgument,
}
