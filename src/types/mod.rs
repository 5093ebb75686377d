pub mod byte_order;
pub mod data_type;
pub mod temporal;
pub mod wide;

// Публичный экспорт типов и функций из вложенных модулей, чтобы упростить
// доступ к ним из внешнего кода.
pub use byte_order::*;
pub use data_type::*;
pub use temporal::*;
pub use wide::*;
