//! Логирование через `tracing`: консоль и файл с ежедневной ротацией.

pub mod config;
mod filters;
mod formatter;
pub mod handle;

use std::{fs, io};

use dolphindb_error::{ConfigError, DolphinResult};
use tracing::Subscriber;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan, Layer};

pub use self::config::{FileLogConfig, LogFormat, LoggingConfig};
pub use handle::LoggingHandle;

/// Слои логирования и guard файлового writer'а.
type Layers<S> = (Vec<Box<dyn Layer<S> + Send + Sync>>, Option<WorkerGuard>);

/// Собирает подписчик без установки его глобальным.
///
/// Используется [`init_logging`] и тестами через
/// `tracing::subscriber::with_default`.
pub fn build_subscriber(
    config: &LoggingConfig
) -> DolphinResult<(impl Subscriber + Send + Sync, LoggingHandle)> {
    config.validate()?;
    let (layers, guard) = build_layers(config)?;
    let subscriber = tracing_subscriber::registry()
        .with(filters::build_filter(config))
        .with(layers);
    let dir = config.file.as_ref().map(|f| f.dir.clone());
    Ok((subscriber, LoggingHandle::new(guard, dir)))
}

/// Устанавливает глобальный подписчик.
///
/// Повторный вызов в том же процессе возвращает ошибку.
pub fn init_logging(config: LoggingConfig) -> DolphinResult<LoggingHandle> {
    let (subscriber, handle) = build_subscriber(&config)?;
    tracing::subscriber::set_global_default(subscriber).map_err(|e| ConfigError::Logging {
        reason: e.to_string(),
    })?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        console = config.console_enabled,
        file = handle.has_file_sink(),
        "Logging initialized"
    );
    Ok(handle)
}

fn build_layers<S>(config: &LoggingConfig) -> DolphinResult<Layers<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let mut layers = Vec::new();
    if config.console_enabled {
        layers.push(formatter::build_layer(
            config.console_format,
            io::stdout,
            config.with_ansi,
            config.with_target,
        ));
    }

    let guard = match &config.file {
        Some(file) => {
            fs::create_dir_all(&file.dir).map_err(|e| ConfigError::Logging {
                reason: format!("cannot create {}: {e}", file.dir.display()),
            })?;
            let (writer, guard) = non_blocking(rolling::daily(&file.dir, &file.prefix));
            layers.push(formatter::build_layer(
                file.format,
                writer,
                false,
                config.with_target,
            ));
            Some(guard)
        }
        None => None,
    };
    Ok((layers, guard))
}
