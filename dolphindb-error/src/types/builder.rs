use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки построения таблиц из сырых колонок и записей.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Длины имён, типов и значений колонок различаются.
    #[error("The length of colNames, colTypes and colValues should be equal.")]
    LengthMismatch,

    /// На вход не передана запись.
    #[error("Input should not be nil")]
    NilInput,

    /// Тип колонки неизвестен или не совпадает с данными.
    #[error("Invalid type {name}")]
    InvalidType { name: String },

    /// Длина колонки отличается от длины первой колонки.
    #[error("column {name} has {actual} rows, expected {expected}")]
    RowCountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Некорректная аннотация поля.
    #[error("Invalid column tag: {tag}")]
    InvalidTag { tag: String },
}

impl ErrorExt for BuildError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::LengthMismatch | Self::RowCountMismatch { .. } => StatusCode::ShapeMismatch,
            Self::NilInput | Self::InvalidTag { .. } => StatusCode::InvalidArgs,
            Self::InvalidType { .. } => StatusCode::TypeError,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
