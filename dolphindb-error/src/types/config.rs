use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки загрузки настроек клиента и инициализации логирования.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Источник настроек не прочитан или не разобран.
    #[error("Failed to load settings: {reason}")]
    Load { reason: String },

    /// Значение поля вне допустимых границ.
    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: String, reason: String },

    /// Подписчик tracing не установлен.
    #[error("Failed to initialize logging: {reason}")]
    Logging { reason: String },
}

impl ErrorExt for ConfigError {
    fn status_code(&self) -> StatusCode {
        StatusCode::InvalidConfig
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
