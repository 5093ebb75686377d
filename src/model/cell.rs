use ordered_float::OrderedFloat;

use crate::types::{
    Storage, NULL_BYTE, NULL_DOUBLE, NULL_FLOAT, NULL_INT, NULL_INT128, NULL_LONG, NULL_SHORT,
};

/// Значение одного слота в его классе хранения.
///
/// Числа с плавающей точкой обёрнуты в [`OrderedFloat`], чтобы ячейка
/// могла быть ключом словаря и элементом множества.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Void,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    Decimal32 { scale: u32, raw: i32 },
    Decimal64 { scale: u32, raw: i64 },
    Decimal128 { scale: u32, raw: i128 },
    Duration { value: i32, unit: u32 },
    Double2(OrderedFloat<f64>, OrderedFloat<f64>),
    Text(String),
    Blob(Vec<u8>),
    Wide(u128),
}

/// Ключ ячейки для словарей и множеств.
///
/// Числа с плавающей точкой сравниваются по битам, поэтому `0.0` и
/// `-0.0` остаются разными ключами.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum CellKey {
    Float(u32),
    Double(u64),
    Double2(u64, u64),
    Other(Cell),
}

impl Cell {
    /// Null-ячейка для класса хранения.
    pub fn null(
        storage: Storage,
        scale: u32,
    ) -> Self {
        match storage {
            Storage::Void | Storage::Any => Self::Void,
            Storage::Byte => Self::Byte(NULL_BYTE),
            Storage::Short => Self::Short(NULL_SHORT),
            Storage::Int => Self::Int(NULL_INT),
            Storage::Long => Self::Long(NULL_LONG),
            Storage::Float => Self::Float(OrderedFloat(NULL_FLOAT)),
            Storage::Double => Self::Double(OrderedFloat(NULL_DOUBLE)),
            Storage::Decimal32 => Self::Decimal32 {
                scale,
                raw: NULL_INT,
            },
            Storage::Decimal64 => Self::Decimal64 {
                scale,
                raw: NULL_LONG,
            },
            Storage::Decimal128 => Self::Decimal128 {
                scale,
                raw: NULL_INT128,
            },
            Storage::Duration => Self::Duration {
                value: NULL_INT,
                unit: 0,
            },
            Storage::Double2 => Self::Double2(OrderedFloat(NULL_DOUBLE), OrderedFloat(NULL_DOUBLE)),
            Storage::Text => Self::Text(String::new()),
            Storage::Blob => Self::Blob(Vec::new()),
            Storage::Wide => Self::Wide(0),
        }
    }

    pub fn storage(&self) -> Storage {
        match self {
            Self::Void => Storage::Void,
            Self::Byte(_) => Storage::Byte,
            Self::Short(_) => Storage::Short,
            Self::Int(_) => Storage::Int,
            Self::Long(_) => Storage::Long,
            Self::Float(_) => Storage::Float,
            Self::Double(_) => Storage::Double,
            Self::Decimal32 { .. } => Storage::Decimal32,
            Self::Decimal64 { .. } => Storage::Decimal64,
            Self::Decimal128 { .. } => Storage::Decimal128,
            Self::Duration { .. } => Storage::Duration,
            Self::Double2(..) => Storage::Double2,
            Self::Text(_) => Storage::Text,
            Self::Blob(_) => Storage::Blob,
            Self::Wide(_) => Storage::Wide,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Void => true,
            Self::Byte(v) => *v == NULL_BYTE,
            Self::Short(v) => *v == NULL_SHORT,
            Self::Int(v) => *v == NULL_INT,
            Self::Long(v) => *v == NULL_LONG,
            Self::Float(v) => v.0 == NULL_FLOAT,
            Self::Double(v) => v.0 == NULL_DOUBLE,
            Self::Decimal32 { raw, .. } => *raw == NULL_INT,
            Self::Decimal64 { raw, .. } => *raw == NULL_LONG,
            Self::Decimal128 { raw, .. } => *raw == NULL_INT128,
            Self::Duration { value, .. } => *value == NULL_INT,
            Self::Double2(x, y) => x.0 == NULL_DOUBLE || y.0 == NULL_DOUBLE,
            Self::Text(s) => s.is_empty(),
            Self::Blob(b) => b.is_empty(),
            Self::Wide(v) => *v == 0,
        }
    }

    /// Масштаб десятичной ячейки.
    pub fn scale(&self) -> Option<u32> {
        match self {
            Self::Decimal32 { scale, .. }
            | Self::Decimal64 { scale, .. }
            | Self::Decimal128 { scale, .. } => Some(*scale),
            _ => None,
        }
    }

    pub(crate) fn key(&self) -> CellKey {
        match self {
            Self::Float(v) => CellKey::Float(v.0.to_bits()),
            Self::Double(v) => CellKey::Double(v.0.to_bits()),
            Self::Double2(x, y) => CellKey::Double2(x.0.to_bits(), y.0.to_bits()),
            other => CellKey::Other(other.clone()),
        }
    }
}
