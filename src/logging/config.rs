use std::path::PathBuf;

use dolphindb_error::{ConfigError, DolphinResult};
use serde::Deserialize;

/// Формат строк лога.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Запись лога в файл с ежедневной ротацией.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileLogConfig {
    /// Каталог; создаётся при инициализации
    pub dir: PathBuf,
    /// Префикс имени файла, к нему добавляется дата
    #[serde(default = "default_file_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub format: LogFormat,
}

/// Конфигурация логирования.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Уровень или директива `EnvFilter`; `RUST_LOG` имеет приоритет
    pub level: String,
    pub console_enabled: bool,
    pub console_format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
    pub file: Option<FileLogConfig>,
}

impl LoggingConfig {
    /// Директива фильтра: уровень без модулей применяется ко всему.
    pub fn filter_directive(&self) -> String {
        self.level.trim().to_string()
    }

    pub fn validate(&self) -> DolphinResult<()> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "level".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        if let Some(file) = &self.file {
            if file.prefix.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "file.prefix".to_string(),
                    reason: "must not be empty".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_enabled: true,
            console_format: LogFormat::Compact,
            with_ansi: true,
            with_target: true,
            file: None,
        }
    }
}

fn default_file_prefix() -> String {
    "dolphindb.log".to_string()
}
