//! Error handling for the PromptForge application.
//! Defines custom error types and results used throughout the application.

use std::io;
use thiserror::Error;

use crate::backend::ConnectorError;

/// Custom error types for PromptForge operations.
///
/// This enum represents all possible errors that can occur within the
/// application. It implements the standard Error trait through thiserror's
/// derive macro.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Represents errors raised by the MiniJinja engine
    #[error("Template error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    /// Represents errors that occur during configuration parsing or processing
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// Represents errors in the prompt/history record store
    #[error("Storage error: {0}.")]
    StorageError(String),

    /// Represents JSON encoding/decoding failures
    #[error("Serialization error: {0}.")]
    JsonError(#[from] serde_json::Error),

    /// Represents errors while reading CSV input
    #[error("CSV error: {0}.")]
    CsvError(#[from] csv::Error),

    /// Represents failures reported by an LLM backend connector
    #[error("Connector error: {0}.")]
    ConnectorError(#[from] ConnectorError),

    /// Represents validation failures in user input or data
    #[error("Validation error: {0}.")]
    ValidationError(String),
}

/// Convenience type alias for Results with Error as the error type.
///
/// # Type Parameters
/// * `T` - The type of the success value
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    std::process::exit(1);
}
