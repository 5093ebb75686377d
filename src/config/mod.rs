//! Настройки клиента из файла и переменных окружения.

pub mod settings;

// Публичный экспорт из вложенных модулей, чтобы упростить доступ к ним
// из внешнего кода.
pub use settings::*;
