use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;

/// Держит фоновый writer файла лога.
///
/// Пока handle жив, записи из неблокирующего writer'а доходят до файла;
/// при drop оставшиеся записи сбрасываются.
pub struct LoggingHandle {
    file_guard: Option<WorkerGuard>,
    file_dir: Option<PathBuf>,
}

impl LoggingHandle {
    pub fn new(
        file_guard: Option<WorkerGuard>,
        file_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            file_guard,
            file_dir,
        }
    }

    /// Каталог файлов лога, если запись в файл включена.
    pub fn file_dir(&self) -> Option<&Path> {
        self.file_dir.as_deref()
    }

    pub fn has_file_sink(&self) -> bool {
        self.file_guard.is_some()
    }

    /// Сбрасывает буфер файла и отключает запись в него.
    pub fn shutdown(mut self) {
        if let Some(guard) = self.file_guard.take() {
            tracing::debug!("Flushing file log");
            drop(guard);
        }
    }
}
