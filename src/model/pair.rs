use std::fmt;

use dolphindb_error::{DolphinResult, ModelError};

use super::{Value, Vector};
use crate::types::DataType;

/// Пара: вектор ровно из двух элементов.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    vector: Vector,
}

impl Pair {
    pub fn new(vector: Vector) -> DolphinResult<Self> {
        if vector.is_array_vector() {
            return Err(ModelError::WrongForm {
                expected: "vector".to_string(),
                actual: "array vector".to_string(),
            }
            .into());
        }
        if vector.len() != 2 {
            return Err(ModelError::ShapeMismatch {
                reason: format!("pair must have 2 elements, got {}", vector.len()),
            }
            .into());
        }
        Ok(Self { vector })
    }

    pub fn data_type(&self) -> DataType {
        self.vector.data_type()
    }

    pub fn first(&self) -> DolphinResult<Value> {
        self.vector.get(0)
    }

    pub fn second(&self) -> DolphinResult<Value> {
        self.vector.get(1)
    }

    pub fn get(
        &self,
        index: usize,
    ) -> DolphinResult<Value> {
        self.vector.get(index)
    }

    pub fn vector(&self) -> &Vector {
        &self.vector
    }

    pub fn into_vector(self) -> Vector {
        self.vector
    }
}

impl fmt::Display for Pair {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "pair<{}>([{}])",
            self.data_type(),
            self.vector.format_elements().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnData;

    /// Тест проверяет, что пара требует ровно два элемента.
    #[test]
    fn test_pair_shape() {
        let v = Vector::new(DataType::Int, ColumnData::Int(vec![1, 2])).unwrap();
        let p = Pair::new(v).unwrap();
        assert_eq!(p.second().unwrap().get_int().unwrap(), 2);
        assert_eq!(p.to_string(), "pair<int>([1, 2])");

        let three = Vector::new(DataType::Int, ColumnData::Int(vec![1, 2, 3])).unwrap();
        assert!(Pair::new(three).is_err());
    }
}
