use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки модели значений: приведение форм и типов, границы, имена колонок.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Expected data form {expected}, found {actual}")]
    WrongForm { expected: String, actual: String },

    #[error("Cannot convert {from} to {to}")]
    TypeMismatch { from: String, to: String },

    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    #[error("Duplicate column name: {name}")]
    DuplicateColumn { name: String },

    #[error("Key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Shape mismatch: {reason}")]
    ShapeMismatch { reason: String },

    #[error("Scale {scale} out of range for {data_type} (valid range: [0, {max}])")]
    InvalidScale {
        data_type: String,
        scale: u32,
        max: u32,
    },

    #[error("Invalid {data_type} literal: {text}")]
    InvalidLiteral { data_type: String, text: String },
}

impl ErrorExt for ModelError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::WrongForm { .. } => StatusCode::WrongForm,
            Self::TypeMismatch { .. } => StatusCode::TypeError,
            Self::IndexOutOfBounds { .. } => StatusCode::IndexOutOfBounds,
            Self::ColumnNotFound { .. } | Self::KeyNotFound { .. } => StatusCode::NotFound,
            Self::DuplicateColumn { .. } => StatusCode::AlreadyExists,
            Self::ShapeMismatch { .. } => StatusCode::ShapeMismatch,
            Self::InvalidScale { .. } => StatusCode::InvalidScale,
            Self::InvalidLiteral { .. } => StatusCode::InvalidValue,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
