use std::fmt;

use dolphindb_error::{DolphinResult, ModelError};

use super::{create_void, Dictionary, Matrix, Pair, Scalar, Set, Table, Vector};
use crate::types::{DataForm, DataType};

/// Значение любой формы, которым обмениваются клиент и сервер.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Vector(Vector),
    Pair(Pair),
    Matrix(Matrix),
    Set(Set),
    Dictionary(Dictionary),
    Table(Table),
}

/// Генерирует пару методов приведения (`to_*` по ссылке и `into_*` с
/// владением) и предикат `is_*` для одной формы.
macro_rules! downcasts {
    ($($variant:ident, $ty:ty, $form:literal, $to:ident, $into:ident, $is:ident;)*) => {
        $(
            pub fn $to(&self) -> DolphinResult<&$ty> {
                match self {
                    Self::$variant(v) => Ok(v),
                    other => Err(other.wrong_form($form)),
                }
            }

            pub fn $into(self) -> DolphinResult<$ty> {
                match self {
                    Self::$variant(v) => Ok(v),
                    other => Err(other.wrong_form($form)),
                }
            }

            pub fn $is(&self) -> bool {
                matches!(self, Self::$variant(_))
            }
        )*
    };
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Value {
    /// Void-скаляр: null без типа.
    pub fn void() -> Self {
        Self::Scalar(create_void())
    }

    pub fn form(&self) -> DataForm {
        match self {
            Self::Scalar(_) => DataForm::Scalar,
            Self::Vector(_) => DataForm::Vector,
            Self::Pair(_) => DataForm::Pair,
            Self::Matrix(_) => DataForm::Matrix,
            Self::Set(_) => DataForm::Set,
            Self::Dictionary(_) => DataForm::Dictionary,
            Self::Table(_) => DataForm::Table,
        }
    }

    /// Тип элементов; для словаря тип значений, для таблицы `void`.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Scalar(v) => v.data_type(),
            Self::Vector(v) => v.data_type(),
            Self::Pair(v) => v.data_type(),
            Self::Matrix(v) => v.data_type(),
            Self::Set(v) => v.data_type(),
            Self::Dictionary(v) => v.value_type(),
            Self::Table(_) => DataType::Void,
        }
    }

    pub fn rows(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Vector(v) => v.len(),
            Self::Pair(_) => 2,
            Self::Matrix(v) => v.rows(),
            Self::Set(v) => v.size(),
            Self::Dictionary(v) => v.len(),
            Self::Table(v) => v.rows(),
        }
    }

    pub fn columns(&self) -> usize {
        match self {
            Self::Matrix(v) => v.columns(),
            Self::Table(v) => v.columns(),
            _ => 1,
        }
    }

    /// Число элементов: длина для векторных форм, строки для таблицы.
    pub fn size(&self) -> usize {
        self.rows()
    }

    /// Null-скаляр; другие формы null не бывают.
    pub fn is_null(&self) -> bool {
        match self {
            Self::Scalar(v) => v.is_null(),
            _ => false,
        }
    }

    downcasts! {
        Scalar, Scalar, "scalar", to_scalar, into_scalar, is_scalar;
        Vector, Vector, "vector", to_vector, into_vector, is_vector;
        Pair, Pair, "pair", to_pair, into_pair, is_pair;
        Matrix, Matrix, "matrix", to_matrix, into_matrix, is_matrix;
        Set, Set, "set", to_set, into_set, is_set;
        Dictionary, Dictionary, "dictionary", to_dictionary, into_dictionary, is_dictionary;
        Table, Table, "table", to_table, into_table, is_table;
    }

    pub fn get_bool(&self) -> DolphinResult<bool> {
        self.to_scalar()?.get_bool()
    }

    pub fn get_short(&self) -> DolphinResult<i16> {
        self.to_scalar()?.get_short()
    }

    pub fn get_int(&self) -> DolphinResult<i32> {
        self.to_scalar()?.get_int()
    }

    pub fn get_long(&self) -> DolphinResult<i64> {
        self.to_scalar()?.get_long()
    }

    pub fn get_float(&self) -> DolphinResult<f32> {
        self.to_scalar()?.get_float()
    }

    pub fn get_double(&self) -> DolphinResult<f64> {
        self.to_scalar()?.get_double()
    }

    pub fn get_string(&self) -> DolphinResult<String> {
        self.to_scalar()?.get_string()
    }

    /// Элемент по индексу для векторных форм.
    pub fn get(
        &self,
        index: usize,
    ) -> DolphinResult<Value> {
        match self {
            Self::Vector(v) => v.get(index),
            Self::Pair(v) => v.get(index),
            other => Err(other.wrong_form("vector")),
        }
    }

    fn wrong_form(
        &self,
        expected: &str,
    ) -> dolphindb_error::StackError {
        ModelError::WrongForm {
            expected: expected.to_string(),
            actual: self.form().to_string(),
        }
        .into()
    }
}

/// Освобождает значение. После вызова значение недоступно.
pub fn del_constant(value: Value) {
    drop(value);
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для Value
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for Value {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Scalar(v) => fmt::Display::fmt(v, f),
            Self::Vector(v) => fmt::Display::fmt(v, f),
            Self::Pair(v) => fmt::Display::fmt(v, f),
            Self::Matrix(v) => fmt::Display::fmt(v, f),
            Self::Set(v) => fmt::Display::fmt(v, f),
            Self::Dictionary(v) => fmt::Display::fmt(v, f),
            Self::Table(v) => fmt::Display::fmt(v, f),
        }
    }
}

impl From<Scalar> for Value {
    fn from(v: Scalar) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vector> for Value {
    fn from(v: Vector) -> Self {
        Self::Vector(v)
    }
}

impl From<Pair> for Value {
    fn from(v: Pair) -> Self {
        Self::Pair(v)
    }
}

impl From<Matrix> for Value {
    fn from(v: Matrix) -> Self {
        Self::Matrix(v)
    }
}

impl From<Set> for Value {
    fn from(v: Set) -> Self {
        Self::Set(v)
    }
}

impl From<Dictionary> for Value {
    fn from(v: Dictionary) -> Self {
        Self::Dictionary(v)
    }
}

impl From<Table> for Value {
    fn from(v: Table) -> Self {
        Self::Table(v)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use dolphindb_error::StatusCode;

    use super::*;
    use crate::model::{create_double, create_int, ColumnData};

    /// Тест проверяет приведения формы и ошибку неверной формы.
    #[test]
    fn test_downcasts() {
        let v: Value = create_int(3).into();
        assert!(v.is_scalar());
        assert_eq!(v.form(), DataForm::Scalar);
        assert_eq!(v.get_long().unwrap(), 3);

        let err = v.to_table().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::WrongForm);
        assert_eq!(err.to_string(), "Expected data form table, found scalar");

        let vec: Value = Vector::new(DataType::Int, ColumnData::Int(vec![1, 2]))
            .unwrap()
            .into();
        assert!(vec.get_int().is_err());
        assert_eq!(vec.get(1).unwrap().get_int().unwrap(), 2);
        assert_eq!(vec.rows(), 2);
        assert!(vec.into_vector().is_ok());
    }

    /// Тест проверяет, что Value можно передавать между потоками.
    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Value>();
    }

    /// Тест проверяет, что del_constant забирает значение.
    #[test]
    fn test_del_constant() {
        let v: Value = create_double(1.5).into();
        assert!(!v.is_null());
        del_constant(v);
        assert!(Value::void().is_null());
    }
}
