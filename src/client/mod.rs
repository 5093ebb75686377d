//! Сессионный протокол: запросы, ответы, соединение и переключение узлов.

pub mod appender;
pub mod cluster;
pub mod connection;
pub mod core;
pub mod request;
pub mod response;

// Публичный экспорт всех типов и функций из вложенных модулей, чтобы
// упростить доступ к ним из внешнего кода.
pub use self::core::*;

pub use appender::*;
pub use cluster::*;
pub use connection::*;
pub use request::*;
pub use response::*;
