use std::fmt;

use ahash::AHashSet;
use dolphindb_error::{DolphinResult, ModelError};

use super::{cell::CellKey, vector::compatible, Cell, ColumnData, Scalar, Vector};
use crate::types::{DataType, Storage};

/// Множество уникальных значений одного типа.
///
/// Порядок обхода совпадает с порядком первого добавления. Равенство
/// элементов учитывает значение и тип.
#[derive(Debug, Clone)]
pub struct Set {
    data_type: DataType,
    scale: u32,
    items: Vec<Cell>,
    index: AHashSet<CellKey>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Set {
    /// Пустое множество указанного типа.
    pub fn new(data_type: DataType) -> DolphinResult<Self> {
        Self::with_scale(data_type, 0)
    }

    /// Пустое множество десятичного типа с заданным масштабом.
    pub fn with_scale(
        data_type: DataType,
        scale: u32,
    ) -> DolphinResult<Self> {
        match data_type.storage() {
            None | Some(Storage::Any) => {
                return Err(ModelError::TypeMismatch {
                    from: data_type.to_string(),
                    to: "set".to_string(),
                }
                .into())
            }
            _ => {}
        }
        if data_type.is_decimal() {
            data_type.check_scale(scale)?;
        }
        Ok(Self {
            data_type,
            scale,
            items: Vec::new(),
            index: AHashSet::new(),
        })
    }

    /// Строит множество из вектора, отбрасывая повторы.
    pub fn from_vector(vector: &Vector) -> DolphinResult<Self> {
        let mut set = Self::with_scale(vector.data_type(), vector.scale().unwrap_or(0))?;
        for i in 0..vector.len() {
            set.append(&vector.get_scalar(i)?)?;
        }
        Ok(set)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Добавляет значение, если его ещё нет. Значение другого типа
    /// отвергается.
    pub fn append(
        &mut self,
        value: &Scalar,
    ) -> DolphinResult<()> {
        self.check_item(value)?;
        if self.index.insert(value.cell().key()) {
            self.items.push(value.cell().clone());
        }
        Ok(())
    }

    /// Удаляет значение; возвращает `true`, если оно было в множестве.
    pub fn remove(
        &mut self,
        value: &Scalar,
    ) -> bool {
        if !compatible(self.data_type, value.data_type()) || !self.index.remove(&value.cell().key()) {
            return false;
        }
        let key = value.cell().key();
        self.items.retain(|c| c.key() != key);
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    pub fn contains(
        &self,
        value: &Scalar,
    ) -> bool {
        compatible(self.data_type, value.data_type()) && self.index.contains(&value.cell().key())
    }

    /// Элементы в порядке добавления.
    pub fn iter(&self) -> impl Iterator<Item = Scalar> + '_ {
        self.items
            .iter()
            .filter_map(|c| Scalar::new(self.data_type, c.clone()).ok())
    }

    /// Элементы множества как вектор.
    pub fn to_vector(&self) -> DolphinResult<Vector> {
        let storage = self.data_type.storage().unwrap_or(Storage::Void);
        let mut data = ColumnData::with_capacity(storage, self.scale, self.items.len());
        for cell in &self.items {
            data.push(cell.clone())?;
        }
        Vector::new(self.data_type, data)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для Set
////////////////////////////////////////////////////////////////////////////////

impl PartialEq for Set {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.data_type == other.data_type && self.index == other.index
    }
}

impl fmt::Display for Set {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let items: Vec<String> = self
            .items
            .iter()
            .map(|c| super::scalar::render_cell(self.data_type, c))
            .collect();
        write!(
            f,
            "set<{}>[{}]([{}])",
            self.data_type,
            self.items.len(),
            items.join(", ")
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Внутренние методы и функции
////////////////////////////////////////////////////////////////////////////////

impl Set {
    fn check_item(
        &self,
        value: &Scalar,
    ) -> DolphinResult<()> {
        let same_scale = !matches!(value.cell().scale(), Some(s) if s != self.scale);
        if !compatible(self.data_type, value.data_type()) || !same_scale {
            return Err(ModelError::TypeMismatch {
                from: value.data_type().to_string(),
                to: self.data_type.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
