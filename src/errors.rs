/*!
 * Error types for the mangadispatch application.
 *
 * This module contains custom error types for the different layers of the
 * dispatcher, using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors raised before any worker is constructed
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No input path was supplied for a mode that needs one
    #[error("No input image was supplied. Use -i <image_path>")]
    NoInput,

    /// Demo mode needs exactly one existing file
    #[error("Invalid single image file path for demo mode: \"{0}\". Use `-m batch`.")]
    InvalidDemoInput(String),

    /// Mode string that does not name any of the seven run modes
    #[error("Unknown run mode: {0}")]
    UnknownMode(String),

    /// Configuration value that failed validation
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Name of the offending setting
        key: String,
        /// Why the value was rejected
        message: String,
    },
}

impl DispatchError {
    /// Error class name reported by the top-level handler
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::InvalidDemoInput(_) => "FileNotFoundError",
            _ => "ConfigurationError",
        }
    }
}

/// Errors that can occur while loading a substitution dictionary
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// The dictionary file is set but could not be read
    #[error("Failed to read dictionary {path:?}: {source}")]
    Read {
        /// Dictionary path as given
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A rule pattern is not a valid regular expression
    #[error("Invalid dictionary pattern at line {line}: {message}")]
    Pattern {
        /// 1-based line number of the rule
        line: usize,
        /// Regex compiler message
        message: String,
    },
}

/// Errors reported by the external translation engine and service workers
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine process could not be started
    #[error("Failed to start engine: {0}")]
    Spawn(#[from] std::io::Error),

    /// The engine exited unsuccessfully
    #[error("Engine failed ({status}): {message}")]
    Failed {
        /// Exit status description
        status: String,
        /// Filtered stderr output
        message: String,
    },

    /// The engine produced output that is not a text-line result
    #[error("Invalid engine output: {0}")]
    InvalidOutput(String),

    /// The engine did not finish in time
    #[error("Engine timed out after {0} seconds")]
    Timeout(u64),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Dictionary error
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    /// Engine or service error
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),
}

impl AppError {
    /// Error class name reported by the top-level handler
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Dispatch(e) => e.class_name(),
            Self::Dictionary(_) => "DictionaryError",
            Self::Engine(_) => "EngineError",
            Self::File(_) => "FileError",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

/// Class name for an error that reached the top level of the program
pub fn error_class(error: &anyhow::Error) -> &'static str {
    if let Some(e) = error.downcast_ref::<AppError>() {
        e.class_name()
    } else if let Some(e) = error.downcast_ref::<DispatchError>() {
        e.class_name()
    } else if error.downcast_ref::<DictionaryError>().is_some() {
        "DictionaryError"
    } else if error.downcast_ref::<EngineError>().is_some() {
        "EngineError"
    } else if error.downcast_ref::<std::io::Error>().is_some() {
        "IOError"
    } else {
        "Error"
    }
}
