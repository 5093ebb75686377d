use dolphindb_error::ModelError;
use ordered_float::OrderedFloat;

use super::{Cell, Value};
use crate::types::Storage;

/// Типизированное хранилище элементов вектора.
///
/// Одна вариация на класс хранения; десятичные колонки несут общий для
/// всех элементов масштаб.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Void(usize),
    Byte(Vec<i8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Decimal32 { scale: u32, values: Vec<i32> },
    Decimal64 { scale: u32, values: Vec<i64> },
    Decimal128 { scale: u32, values: Vec<i128> },
    /// Пары (значение, код единицы).
    Duration(Vec<(i32, u32)>),
    Double2(Vec<[f64; 2]>),
    Text(Vec<String>),
    Blob(Vec<Vec<u8>>),
    Wide(Vec<u128>),
    Any(Vec<Value>),
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ColumnData {
    /// Пустое хранилище с зарезервированной ёмкостью.
    pub fn with_capacity(
        storage: Storage,
        scale: u32,
        capacity: usize,
    ) -> Self {
        match storage {
            Storage::Void => Self::Void(0),
            Storage::Byte => Self::Byte(Vec::with_capacity(capacity)),
            Storage::Short => Self::Short(Vec::with_capacity(capacity)),
            Storage::Int => Self::Int(Vec::with_capacity(capacity)),
            Storage::Long => Self::Long(Vec::with_capacity(capacity)),
            Storage::Float => Self::Float(Vec::with_capacity(capacity)),
            Storage::Double => Self::Double(Vec::with_capacity(capacity)),
            Storage::Decimal32 => Self::Decimal32 {
                scale,
                values: Vec::with_capacity(capacity),
            },
            Storage::Decimal64 => Self::Decimal64 {
                scale,
                values: Vec::with_capacity(capacity),
            },
            Storage::Decimal128 => Self::Decimal128 {
                scale,
                values: Vec::with_capacity(capacity),
            },
            Storage::Duration => Self::Duration(Vec::with_capacity(capacity)),
            Storage::Double2 => Self::Double2(Vec::with_capacity(capacity)),
            Storage::Text => Self::Text(Vec::with_capacity(capacity)),
            Storage::Blob => Self::Blob(Vec::with_capacity(capacity)),
            Storage::Wide => Self::Wide(Vec::with_capacity(capacity)),
            Storage::Any => Self::Any(Vec::with_capacity(capacity)),
        }
    }

    /// Хранилище из `len` null-слотов.
    pub fn nulls(
        storage: Storage,
        scale: u32,
        len: usize,
    ) -> Self {
        let mut data = Self::with_capacity(storage, scale, len);
        if let Self::Void(n) = &mut data {
            *n = len;
            return data;
        }
        if let Self::Any(items) = &mut data {
            items.resize(len, Value::void());
            return data;
        }
        let null = Cell::null(storage, scale);
        for _ in 0..len {
            // класс хранения ячейки совпадает по построению
            let _ = data.push(null.clone());
        }
        data
    }

    pub fn storage(&self) -> Storage {
        match self {
            Self::Void(_) => Storage::Void,
            Self::Byte(_) => Storage::Byte,
            Self::Short(_) => Storage::Short,
            Self::Int(_) => Storage::Int,
            Self::Long(_) => Storage::Long,
            Self::Float(_) => Storage::Float,
            Self::Double(_) => Storage::Double,
            Self::Decimal32 { .. } => Storage::Decimal32,
            Self::Decimal64 { .. } => Storage::Decimal64,
            Self::Decimal128 { .. } => Storage::Decimal128,
            Self::Duration(_) => Storage::Duration,
            Self::Double2(_) => Storage::Double2,
            Self::Text(_) => Storage::Text,
            Self::Blob(_) => Storage::Blob,
            Self::Wide(_) => Storage::Wide,
            Self::Any(_) => Storage::Any,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Void(n) => *n,
            Self::Byte(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Decimal32 { values, .. } => values.len(),
            Self::Decimal64 { values, .. } => values.len(),
            Self::Decimal128 { values, .. } => values.len(),
            Self::Duration(v) => v.len(),
            Self::Double2(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Blob(v) => v.len(),
            Self::Wide(v) => v.len(),
            Self::Any(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn scale(&self) -> Option<u32> {
        match self {
            Self::Decimal32 { scale, .. }
            | Self::Decimal64 { scale, .. }
            | Self::Decimal128 { scale, .. } => Some(*scale),
            _ => None,
        }
    }

    /// Ячейка по индексу. Для `any` всегда `None`: элементы такого
    /// хранилища читаются через [`ColumnData::value_at`].
    pub fn cell(
        &self,
        index: usize,
    ) -> Option<Cell> {
        let cell = match self {
            Self::Void(n) => return (index < *n).then_some(Cell::Void),
            Self::Byte(v) => Cell::Byte(*v.get(index)?),
            Self::Short(v) => Cell::Short(*v.get(index)?),
            Self::Int(v) => Cell::Int(*v.get(index)?),
            Self::Long(v) => Cell::Long(*v.get(index)?),
            Self::Float(v) => Cell::Float(OrderedFloat(*v.get(index)?)),
            Self::Double(v) => Cell::Double(OrderedFloat(*v.get(index)?)),
            Self::Decimal32 { scale, values } => Cell::Decimal32 {
                scale: *scale,
                raw: *values.get(index)?,
            },
            Self::Decimal64 { scale, values } => Cell::Decimal64 {
                scale: *scale,
                raw: *values.get(index)?,
            },
            Self::Decimal128 { scale, values } => Cell::Decimal128 {
                scale: *scale,
                raw: *values.get(index)?,
            },
            Self::Duration(v) => {
                let (value, unit) = *v.get(index)?;
                Cell::Duration { value, unit }
            }
            Self::Double2(v) => {
                let [x, y] = *v.get(index)?;
                Cell::Double2(OrderedFloat(x), OrderedFloat(y))
            }
            Self::Text(v) => Cell::Text(v.get(index)?.clone()),
            Self::Blob(v) => Cell::Blob(v.get(index)?.clone()),
            Self::Wide(v) => Cell::Wide(*v.get(index)?),
            Self::Any(_) => return None,
        };
        Some(cell)
    }

    /// Элемент хранилища `any`.
    pub fn value_at(
        &self,
        index: usize,
    ) -> Option<&Value> {
        match self {
            Self::Any(items) => items.get(index),
            _ => None,
        }
    }

    /// Добавляет ячейку; класс хранения и масштаб должны совпадать.
    pub fn push(
        &mut self,
        cell: Cell,
    ) -> Result<(), ModelError> {
        let mismatch = |from: Storage, to: Storage| ModelError::TypeMismatch {
            from: format!("{from:?}").to_lowercase(),
            to: format!("{to:?}").to_lowercase(),
        };
        let target = self.storage();
        match (self, cell) {
            (Self::Void(n), Cell::Void) => *n += 1,
            (Self::Byte(v), Cell::Byte(x)) => v.push(x),
            (Self::Short(v), Cell::Short(x)) => v.push(x),
            (Self::Int(v), Cell::Int(x)) => v.push(x),
            (Self::Long(v), Cell::Long(x)) => v.push(x),
            (Self::Float(v), Cell::Float(x)) => v.push(x.0),
            (Self::Double(v), Cell::Double(x)) => v.push(x.0),
            (Self::Decimal32 { scale, values }, Cell::Decimal32 { scale: s, raw }) if *scale == s => {
                values.push(raw)
            }
            (Self::Decimal64 { scale, values }, Cell::Decimal64 { scale: s, raw }) if *scale == s => {
                values.push(raw)
            }
            (Self::Decimal128 { scale, values }, Cell::Decimal128 { scale: s, raw }) if *scale == s => {
                values.push(raw)
            }
            (Self::Duration(v), Cell::Duration { value, unit }) => v.push((value, unit)),
            (Self::Double2(v), Cell::Double2(x, y)) => v.push([x.0, y.0]),
            (Self::Text(v), Cell::Text(x)) => v.push(x),
            (Self::Blob(v), Cell::Blob(x)) => v.push(x),
            (Self::Wide(v), Cell::Wide(x)) => v.push(x),
            (_, cell) => return Err(mismatch(cell.storage(), target)),
        }
        Ok(())
    }

    /// Добавляет произвольное значение в хранилище `any`.
    pub fn push_value(
        &mut self,
        value: Value,
    ) -> Result<(), ModelError> {
        match self {
            Self::Any(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(ModelError::TypeMismatch {
                from: value.data_type().to_string(),
                to: format!("{:?}", other.storage()).to_lowercase(),
            }),
        }
    }

    /// Новое хранилище из элементов с указанными индексами.
    pub fn select(
        &self,
        indices: &[usize],
    ) -> Result<Self, ModelError> {
        let len = self.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
            return Err(ModelError::IndexOutOfBounds { index: bad, len });
        }
        fn pick<T: Clone>(
            v: &[T],
            indices: &[usize],
        ) -> Vec<T> {
            indices.iter().map(|&i| v[i].clone()).collect()
        }
        Ok(match self {
            Self::Void(_) => Self::Void(indices.len()),
            Self::Byte(v) => Self::Byte(pick(v, indices)),
            Self::Short(v) => Self::Short(pick(v, indices)),
            Self::Int(v) => Self::Int(pick(v, indices)),
            Self::Long(v) => Self::Long(pick(v, indices)),
            Self::Float(v) => Self::Float(pick(v, indices)),
            Self::Double(v) => Self::Double(pick(v, indices)),
            Self::Decimal32 { scale, values } => Self::Decimal32 {
                scale: *scale,
                values: pick(values, indices),
            },
            Self::Decimal64 { scale, values } => Self::Decimal64 {
                scale: *scale,
                values: pick(values, indices),
            },
            Self::Decimal128 { scale, values } => Self::Decimal128 {
                scale: *scale,
                values: pick(values, indices),
            },
            Self::Duration(v) => Self::Duration(pick(v, indices)),
            Self::Double2(v) => Self::Double2(pick(v, indices)),
            Self::Text(v) => Self::Text(pick(v, indices)),
            Self::Blob(v) => Self::Blob(pick(v, indices)),
            Self::Wide(v) => Self::Wide(pick(v, indices)),
            Self::Any(v) => Self::Any(pick(v, indices)),
        })
    }

    /// Новое хранилище из непрерывного диапазона элементов.
    pub fn slice(
        &self,
        start: usize,
        end: usize,
    ) -> Result<Self, ModelError> {
        let indices: Vec<usize> = (start..end).collect();
        self.select(&indices)
    }

    /// Дописывает все элементы `other`; классы хранения должны совпадать.
    pub fn extend_from(
        &mut self,
        other: &ColumnData,
    ) -> Result<(), ModelError> {
        if let Self::Any(items) = self {
            return match other {
                Self::Any(more) => {
                    items.extend(more.iter().cloned());
                    Ok(())
                }
                _ => Err(ModelError::TypeMismatch {
                    from: format!("{:?}", other.storage()).to_lowercase(),
                    to: "any".into(),
                }),
            };
        }
        for i in 0..other.len() {
            let cell = other.cell(i).ok_or(ModelError::IndexOutOfBounds {
                index: i,
                len: other.len(),
            })?;
            self.push(cell)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
