use std::{any::Any, io};

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки бинарного кодека.
///
/// `Truncated` отделён от прочих ошибок: транспорт дочитывает байты и
/// повторяет декодирование, остальные варианты означают испорченный поток.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Unknown data type: {0}")]
    UnknownDataType(u8),

    #[error("Unknown data form: {0}")]
    UnknownDataForm(u8),

    #[error("Unsupported combination of form {form} and type {data_type}")]
    Unsupported { form: String, data_type: String },

    #[error("Unexpected end of data while reading {what}")]
    Truncated { what: String },

    #[error("Dimension mismatch: {rows}x{cols} does not match {len} elements")]
    DimensionMismatch { rows: usize, cols: usize, len: usize },

    #[error("Invalid symbol base {id}")]
    InvalidSymbolBase { id: u32 },

    #[error("Symbol index {index} is out of range for a base of {size} entries")]
    SymbolIndexOutOfRange { index: i32, size: usize },

    #[error("Invalid UTF-8 in {what}")]
    InvalidUtf8 { what: String },

    #[error("Row count {rows} exceeds the limit {limit}")]
    SizeLimit { rows: usize, limit: usize },

    #[error("Invalid byte order flag: {0:#04x}")]
    InvalidByteOrder(u8),

    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Данные прочитаны целиком, но не образуют корректное значение.
    #[error("Malformed data: {reason}")]
    Malformed { reason: String },

    #[error("I/O error during encoding or decoding ({kind:?}): {message}")]
    Io { kind: io::ErrorKind, message: String },
}

impl CodecError {
    /// Ошибка обрыва данных для указанной части кадра.
    pub fn truncated(what: impl Into<String>) -> Self {
        Self::Truncated { what: what.into() }
    }

    /// Нужно ли дочитать данные и повторить попытку.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

impl ErrorExt for CodecError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownDataType(_) => StatusCode::UnknownDataType,
            Self::UnknownDataForm(_) => StatusCode::UnknownDataForm,
            Self::Unsupported { .. } => StatusCode::Unsupported,
            Self::Truncated { .. } => StatusCode::Truncated,
            Self::DimensionMismatch { .. } | Self::InvalidByteOrder(_) => StatusCode::InvalidFrame,
            Self::InvalidSymbolBase { .. } | Self::SymbolIndexOutOfRange { .. } => {
                StatusCode::DecodingError
            }
            Self::InvalidUtf8 { .. } => StatusCode::InvalidUtf8,
            Self::SizeLimit { .. } => StatusCode::SizeLimit,
            Self::Encoding(_) => StatusCode::EncodingError,
            Self::Malformed { .. } => StatusCode::InvalidData,
            Self::Io { .. } => StatusCode::Io,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::truncated("payload"),
            kind => Self::Io {
                kind,
                message: err.to_string(),
            },
        }
    }
}
