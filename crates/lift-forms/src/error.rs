//! Error types for the form builder

use thiserror::Error;

use crate::ports::outbound::BackendError;

/// Form builder error type
#[derive(Error, Debug)]
pub enum FormsError {
    /// Field not found
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// Row not found
    #[error("row not found: {0}")]
    RowNotFound(String),

    /// Column not found
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// Field is not owned by the column it was moved from
    #[error("field {field} is not in column {column}")]
    FieldNotInColumn { field: String, column: String },

    /// Row already holds the maximum number of columns
    #[error("a row can hold at most {0} columns")]
    ColumnLimit(usize),

    /// Row would drop below one column
    #[error("a row must keep at least one column")]
    LastColumn,

    /// Removing a column that still owns fields needs explicit confirmation
    #[error("column {0} still holds fields; confirm to discard them")]
    ConfirmationRequired(String),

    /// Choice field left without options
    #[error("choice fields need at least one option")]
    EmptyOptions,

    /// Submission key already used by another field
    #[error("field name already in use: {0}")]
    DuplicateName(String),

    /// Unknown field type string
    #[error("unknown field type: {0}")]
    UnknownFieldType(String),

    /// A drag gesture is already active
    #[error("a drag gesture is already in progress")]
    DragInProgress,

    /// Drop or hover without an active gesture
    #[error("no drag gesture in progress")]
    NotDragging,

    /// Uploaded file rejected before transfer
    #[error("file rejected: {0}")]
    FileRejected(String),

    /// Signature pad has no strokes
    #[error("signature is empty")]
    EmptySignature,

    /// A newer request superseded this one before it completed
    #[error("request {0} was superseded by a newer one")]
    Superseded(u64),

    /// Backend transport or server failure
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// JSON error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type for the form builder
pub type Result<T> = std::result::Result<T, FormsError>;
