//! Error types for Taskflow.
//!
//! All errors in Taskflow are represented by the `TaskflowError` enum.
//! Validation findings are not errors: the rule engine reports them as
//! [`CheckItem`](crate::CheckItem)s.

use std::{io::ErrorKind, string::FromUtf8Error};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Taskflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum TaskflowError {
    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// Storage operation errors.
    #[error("{0}")]
    Store(String),

    /// A record or node that was asked for does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Flow / template definition errors.
    #[error("{0}")]
    Flow(String),

    /// Node level errors raised by editor operations.
    #[error("{0}")]
    Node(String),

    /// Bulk import errors.
    #[error("import failed: {0}")]
    Import(String),

    /// Spreadsheet export errors.
    #[error("export failed: {0}")]
    Export(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl From<TaskflowError> for String {
    fn from(val: TaskflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for TaskflowError {
    fn from(error: std::io::Error) -> Self {
        TaskflowError::IoError(error.to_string())
    }
}

impl From<TaskflowError> for std::io::Error {
    fn from(val: TaskflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<FromUtf8Error> for TaskflowError {
    fn from(_: FromUtf8Error) -> Self {
        TaskflowError::Convert("Error with utf-8 string convert".to_string())
    }
}

impl From<serde_json::Error> for TaskflowError {
    fn from(error: serde_json::Error) -> Self {
        TaskflowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for TaskflowError {
    fn from(error: toml::de::Error) -> Self {
        TaskflowError::Config(error.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for TaskflowError {
    fn from(error: rust_xlsxwriter::XlsxError) -> Self {
        TaskflowError::Export(error.to_string())
    }
}
