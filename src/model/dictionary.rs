use std::fmt;

use ahash::AHashMap;
use dolphindb_error::{DolphinResult, ModelError};

use super::{cell::CellKey, vector::compatible, Scalar, Value, Vector};
use crate::types::DataType;

/// Словарь: вектор уникальных ключей и вектор значений той же длины.
///
/// Ключи с плавающей точкой различаются по битам: `0.0` и `-0.0` два
/// разных ключа.
#[derive(Debug, Clone)]
pub struct Dictionary {
    keys: Vector,
    values: Vector,
    index: AHashMap<CellKey, usize>,
}

impl Dictionary {
    pub fn new(
        keys: Vector,
        values: Vector,
    ) -> DolphinResult<Self> {
        if keys.len() != values.len() {
            return Err(ModelError::ShapeMismatch {
                reason: format!(
                    "dictionary has {} keys and {} values",
                    keys.len(),
                    values.len()
                ),
            }
            .into());
        }
        let mut index = AHashMap::with_capacity(keys.len());
        for i in 0..keys.len() {
            let key = keys.get_scalar(i)?;
            if index.insert(key.cell().key(), i).is_some() {
                return Err(ModelError::ShapeMismatch {
                    reason: format!("duplicate dictionary key {}", key.get_string()?),
                }
                .into());
            }
        }
        Ok(Self {
            keys,
            values,
            index,
        })
    }

    pub fn key_type(&self) -> DataType {
        self.keys.data_type()
    }

    pub fn value_type(&self) -> DataType {
        self.values.data_type()
    }

    pub fn keys(&self) -> &Vector {
        &self.keys
    }

    pub fn values(&self) -> &Vector {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains_key(
        &self,
        key: &Scalar,
    ) -> bool {
        self.position(key).is_some()
    }

    /// Значение по ключу.
    pub fn get(
        &self,
        key: &Scalar,
    ) -> DolphinResult<Value> {
        match self.position(key) {
            Some(i) => self.values.get(i),
            None => Err(ModelError::KeyNotFound {
                key: key.get_string()?,
            }
            .into()),
        }
    }

    /// Значение по строковому ключу.
    pub fn get_str(
        &self,
        key: &str,
    ) -> DolphinResult<Value> {
        self.get(&super::create_string(key))
    }

    fn position(
        &self,
        key: &Scalar,
    ) -> Option<usize> {
        if !compatible(self.keys.data_type(), key.data_type()) {
            return None;
        }
        self.index.get(&key.cell().key()).copied()
    }
}

impl PartialEq for Dictionary {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.keys == other.keys && self.values == other.values
    }
}

impl fmt::Display for Dictionary {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let (kt, vt) = (self.key_type(), self.value_type());
        writeln!(f, "dict<{kt}, {vt}>([")?;
        writeln!(
            f,
            "  {kt}[{}]([{}]),",
            self.len(),
            self.keys.format_elements().join(", ")
        )?;
        writeln!(
            f,
            "  {vt}[{}]([{}]),",
            self.len(),
            self.values.format_elements().join(", ")
        )?;
        write!(f, "])")
    }
}
