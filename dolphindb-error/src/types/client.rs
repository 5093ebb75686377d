use std::io;

use crate::{ErrorExt, StatusCode};

/// Ошибки клиентской сессии.
#[derive(Debug, Clone)]
pub enum ClientError {
    /// Ошибка подключения к серверу
    ConnectionFailed { address: String, reason: String },
    /// Таймаут подключения
    ConnectionTimeout { address: String },
    /// Соединение закрыто сервером
    ConnectionClosed,
    /// Соединение помечено как сломанное (таймаут, отмена или ошибка IO
    /// посреди обмена)
    ConnectionBroken,
    /// Запрос до завершения рукопожатия
    NotConnected,
    /// Сервер вернул ошибку вместо `OK`
    ServerError { message: String },
    /// Ошибка входа пользователя
    AuthenticationFailed { user: String, reason: String },
    /// Недопустимое имя переменной при загрузке
    InvalidVariableName { name: String },
    /// Недопустимые параметры поведения запроса
    InvalidOptions { reason: String },
    /// Ошибка ввода-вывода
    Io {
        kind: io::ErrorKind,
        message: String,
    },
    /// Нарушение формата ответа
    Protocol { reason: String },
    /// Таймаут чтения
    ReadTimeout,
    /// Таймаут записи
    WriteTimeout,
}

impl std::fmt::Display for ClientError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed { address, reason } => {
                write!(f, "Failed to connect to {address}: {reason}")
            }
            Self::ConnectionTimeout { address } => write!(f, "Connection to {address} timed out"),
            Self::ConnectionClosed => write!(f, "Connection closed by server"),
            Self::ConnectionBroken => write!(f, "Connection is broken and must be re-established"),
            Self::NotConnected => write!(f, "Database connection is not established yet"),
            Self::ServerError { message } => write!(f, "{message}"),
            Self::AuthenticationFailed { user, reason } => {
                write!(f, "Login failed for user '{user}': {reason}")
            }
            Self::InvalidVariableName { name } => write!(f, "{name} is not a good variable name"),
            Self::InvalidOptions { reason } => write!(f, "Invalid request options: {reason}"),
            Self::Io { kind, message } => write!(f, "I/O error ({kind:?}): {message}"),
            Self::Protocol { reason } => write!(f, "Protocol error: {reason}"),
            Self::ReadTimeout => write!(f, "Read timeout"),
            Self::WriteTimeout => write!(f, "Write timeout"),
        }
    }
}

impl std::error::Error for ClientError {}

impl ErrorExt for ClientError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ConnectionFailed { .. } => StatusCode::ConnectionFailed,
            Self::ConnectionTimeout { .. } => StatusCode::Timeout,
            Self::ConnectionClosed => StatusCode::ConnectionClosed,
            Self::ConnectionBroken => StatusCode::ConnectionBroken,
            Self::NotConnected => StatusCode::NotConnected,
            Self::ServerError { .. } => StatusCode::ServerError,
            Self::AuthenticationFailed { .. } => StatusCode::AuthFailed,
            Self::InvalidVariableName { .. } | Self::InvalidOptions { .. } => {
                StatusCode::InvalidArgs
            }
            Self::Io { .. } => StatusCode::Io,
            Self::Protocol { .. } => StatusCode::ProtocolError,
            Self::ReadTimeout => StatusCode::ReadTimeout,
            Self::WriteTimeout => StatusCode::WriteTimeout,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// Конверсия из io::Error
impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => Self::ConnectionClosed,
            kind => Self::Io {
                kind,
                message: err.to_string(),
            },
        }
    }
}
