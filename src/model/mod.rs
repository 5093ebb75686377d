pub mod cell;
pub mod column;
pub mod dictionary;
pub mod matrix;
pub mod pair;
pub mod scalar;
pub mod set;
pub mod table;
pub mod value;
pub mod vector;

// Публичный экспорт всех форм значений и конструкторов из вложенных
// модулей, чтобы упростить доступ к ним из внешнего кода.
pub use cell::*;
pub use column::*;
pub use dictionary::*;
pub use matrix::*;
pub use pair::*;
pub use scalar::*;
pub use set::*;
pub use table::*;
pub use value::*;
pub use vector::*;
