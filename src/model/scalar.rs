//! Скаляр: один типизированный слот и приводящие аксессоры.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use dolphindb_error::{DolphinResult, ModelError};
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;

use super::Cell;
use crate::types::{
    format_duration, format_temporal, format_wide, month_of, parse_duration, parse_wide,
    raw_from_datetime, DataType, Storage, NULL_INT128,
};

/// Скалярное значение.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scalar {
    data_type: DataType,
    cell: Cell,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Scalar {
    /// Создаёт скаляр, проверяя, что ячейка соответствует классу хранения
    /// типа, а масштаб десятичного значения допустим.
    pub fn new(
        data_type: DataType,
        cell: Cell,
    ) -> DolphinResult<Self> {
        match data_type.storage() {
            Some(Storage::Any) | None => {
                return Err(ModelError::TypeMismatch {
                    from: data_type.to_string(),
                    to: "scalar".to_string(),
                }
                .into())
            }
            Some(storage) if storage != cell.storage() => {
                return Err(ModelError::TypeMismatch {
                    from: format!("{:?}", cell.storage()).to_lowercase(),
                    to: data_type.to_string(),
                }
                .into())
            }
            _ => {}
        }
        if let Some(scale) = cell.scale() {
            data_type.check_scale(scale)?;
        }
        Ok(Self { data_type, cell })
    }

    /// Null-скаляр типа (для decimal масштаб 0).
    pub fn null(data_type: DataType) -> DolphinResult<Self> {
        let storage = data_type.storage().unwrap_or(Storage::Any);
        Self::new(data_type, Cell::null(storage, 0))
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    pub fn into_cell(self) -> Cell {
        self.cell
    }

    pub fn is_null(&self) -> bool {
        self.cell.is_null()
    }

    pub fn get_bool(&self) -> DolphinResult<bool> {
        if !matches!(
            self.data_type,
            DataType::Bool | DataType::Char | DataType::Short | DataType::Int | DataType::Long
        ) {
            return Err(self.mismatch("bool"));
        }
        Ok(!self.is_null() && self.integral("bool")? != 0)
    }

    pub fn get_short(&self) -> DolphinResult<i16> {
        Ok(self.integral("short")? as i16)
    }

    pub fn get_int(&self) -> DolphinResult<i32> {
        Ok(self.integral("int")? as i32)
    }

    pub fn get_long(&self) -> DolphinResult<i64> {
        self.integral("long")
    }

    pub fn get_float(&self) -> DolphinResult<f32> {
        Ok(self.floating("float")? as f32)
    }

    pub fn get_double(&self) -> DolphinResult<f64> {
        self.floating("double")
    }

    /// Текстовое представление; для null пустая строка.
    pub fn get_string(&self) -> DolphinResult<String> {
        Ok(render_cell(self.data_type, &self.cell))
    }

    /// Момент времени для временного типа.
    pub fn get_datetime(&self) -> DolphinResult<Option<NaiveDateTime>> {
        if !self.data_type.is_temporal() {
            return Err(self.mismatch("datetime"));
        }
        if self.is_null() {
            return Ok(None);
        }
        Ok(crate::types::to_datetime(self.data_type, self.integral("datetime")?))
    }

    /// Десятичное значение с исходным масштабом.
    pub fn get_decimal(&self) -> DolphinResult<Option<Decimal>> {
        match self.cell {
            _ if self.is_null() && self.data_type.is_decimal() => Ok(None),
            Cell::Decimal32 { scale, raw } => Ok(Some(Decimal::new(raw as i64, scale))),
            Cell::Decimal64 { scale, raw } => Ok(Some(Decimal::new(raw, scale))),
            Cell::Decimal128 { scale, raw } => Decimal::try_from_i128_with_scale(raw, scale)
                .map(Some)
                .map_err(|_| {
                    ModelError::InvalidLiteral {
                        data_type: "decimal".to_string(),
                        text: format_scaled(raw, scale),
                    }
                    .into()
                }),
            _ => Err(self.mismatch("decimal")),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для Scalar
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for Scalar {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.data_type,
            render_cell(self.data_type, &self.cell)
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Конструкторы
////////////////////////////////////////////////////////////////////////////////

pub fn create_void() -> Scalar {
    Scalar {
        data_type: DataType::Void,
        cell: Cell::Void,
    }
}

pub fn create_bool(v: bool) -> Scalar {
    byte_scalar(DataType::Bool, v as i8)
}

pub fn create_char(v: i8) -> Scalar {
    byte_scalar(DataType::Char, v)
}

pub fn create_short(v: i16) -> Scalar {
    Scalar {
        data_type: DataType::Short,
        cell: Cell::Short(v),
    }
}

pub fn create_int(v: i32) -> Scalar {
    int_scalar(DataType::Int, v)
}

pub fn create_long(v: i64) -> Scalar {
    long_scalar(DataType::Long, v)
}

pub fn create_float(v: f32) -> Scalar {
    Scalar {
        data_type: DataType::Float,
        cell: Cell::Float(OrderedFloat(v)),
    }
}

pub fn create_double(v: f64) -> Scalar {
    Scalar {
        data_type: DataType::Double,
        cell: Cell::Double(OrderedFloat(v)),
    }
}

pub fn create_string(v: impl Into<String>) -> Scalar {
    Scalar {
        data_type: DataType::String,
        cell: Cell::Text(v.into()),
    }
}

pub fn create_symbol(v: impl Into<String>) -> Scalar {
    Scalar {
        data_type: DataType::Symbol,
        cell: Cell::Text(v.into()),
    }
}

/// Ссылка на серверную функцию по имени.
pub fn create_function(name: impl Into<String>) -> Scalar {
    Scalar {
        data_type: DataType::Function,
        cell: Cell::Text(name.into()),
    }
}

/// Фрагмент скрипта.
pub fn create_code(text: impl Into<String>) -> Scalar {
    Scalar {
        data_type: DataType::Code,
        cell: Cell::Text(text.into()),
    }
}

pub fn create_blob(v: impl Into<Vec<u8>>) -> Scalar {
    Scalar {
        data_type: DataType::Blob,
        cell: Cell::Blob(v.into()),
    }
}

pub fn create_date(v: NaiveDate) -> Scalar {
    int_scalar(DataType::Date, crate::types::date_to_days(v))
}

pub fn create_month(
    year: i32,
    month: u32,
) -> Scalar {
    int_scalar(DataType::Month, month_of(year, month))
}

pub fn create_time(v: NaiveTime) -> Scalar {
    int_scalar(DataType::Time, crate::types::time_to_millis(v))
}

pub fn create_nanotime(v: NaiveTime) -> Scalar {
    long_scalar(DataType::NanoTime, crate::types::time_to_nanos(v))
}

/// Создаёт скаляр любого временного типа из момента времени.
///
/// Для типов времени суток используется только время.
pub fn create_temporal(
    data_type: DataType,
    v: NaiveDateTime,
) -> DolphinResult<Scalar> {
    let raw = raw_from_datetime(data_type, v).ok_or_else(|| ModelError::InvalidLiteral {
        data_type: data_type.to_string(),
        text: v.to_string(),
    })?;
    let cell = match data_type.storage() {
        Some(Storage::Int) => Cell::Int(raw as i32),
        _ => Cell::Long(raw),
    };
    Scalar::new(data_type, cell)
}

pub fn create_datetime(v: NaiveDateTime) -> DolphinResult<Scalar> {
    create_temporal(DataType::DateTime, v)
}

pub fn create_timestamp(v: NaiveDateTime) -> DolphinResult<Scalar> {
    create_temporal(DataType::Timestamp, v)
}

pub fn create_nanotimestamp(v: NaiveDateTime) -> DolphinResult<Scalar> {
    create_temporal(DataType::NanoTimestamp, v)
}

pub fn create_uuid(text: &str) -> DolphinResult<Scalar> {
    create_wide(DataType::Uuid, text)
}

pub fn create_ip(text: &str) -> DolphinResult<Scalar> {
    create_wide(DataType::Ip, text)
}

pub fn create_int128(text: &str) -> DolphinResult<Scalar> {
    create_wide(DataType::Int128, text)
}

pub fn create_decimal32(
    v: Decimal,
    scale: u32,
) -> DolphinResult<Scalar> {
    let raw = decimal_to_raw(DataType::Decimal32, v, scale)?;
    Scalar::new(
        DataType::Decimal32,
        Cell::Decimal32 {
            scale,
            raw: raw as i32,
        },
    )
}

pub fn create_decimal64(
    v: Decimal,
    scale: u32,
) -> DolphinResult<Scalar> {
    let raw = decimal_to_raw(DataType::Decimal64, v, scale)?;
    Scalar::new(
        DataType::Decimal64,
        Cell::Decimal64 {
            scale,
            raw: raw as i64,
        },
    )
}

pub fn create_decimal128(
    v: Decimal,
    scale: u32,
) -> DolphinResult<Scalar> {
    let raw = decimal_to_raw(DataType::Decimal128, v, scale)?;
    Scalar::new(DataType::Decimal128, Cell::Decimal128 { scale, raw })
}

/// Создаёт `duration` из текста вида `30s`.
pub fn create_duration(text: &str) -> DolphinResult<Scalar> {
    let (value, unit) = parse_duration(text).ok_or_else(|| ModelError::InvalidLiteral {
        data_type: DataType::Duration.to_string(),
        text: text.to_string(),
    })?;
    Ok(Scalar {
        data_type: DataType::Duration,
        cell: Cell::Duration { value, unit },
    })
}

pub fn create_complex(
    re: f64,
    im: f64,
) -> Scalar {
    Scalar {
        data_type: DataType::Complex,
        cell: Cell::Double2(OrderedFloat(re), OrderedFloat(im)),
    }
}

pub fn create_point(
    x: f64,
    y: f64,
) -> Scalar {
    Scalar {
        data_type: DataType::Point,
        cell: Cell::Double2(OrderedFloat(x), OrderedFloat(y)),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Внутренние методы и функции
////////////////////////////////////////////////////////////////////////////////

impl Scalar {
    fn mismatch(
        &self,
        to: &str,
    ) -> dolphindb_error::StackError {
        ModelError::TypeMismatch {
            from: self.data_type.to_string(),
            to: to.to_string(),
        }
        .into()
    }

    /// Целочисленное представление: числа усекаются к нулю, decimal
    /// отбрасывает дробную часть, null даёт 0.
    fn integral(
        &self,
        to: &str,
    ) -> DolphinResult<i64> {
        let v = match &self.cell {
            Cell::Byte(v) => *v as i64,
            Cell::Short(v) => *v as i64,
            Cell::Int(v) => *v as i64,
            Cell::Long(v) => *v,
            Cell::Float(v) => v.0 as i64,
            Cell::Double(v) => v.0 as i64,
            Cell::Decimal32 { scale, raw } => *raw as i64 / 10i64.pow(*scale),
            Cell::Decimal64 { scale, raw } => *raw / 10i64.pow(*scale),
            Cell::Decimal128 { scale, raw } => (*raw / 10i128.pow(*scale)) as i64,
            _ => return Err(self.mismatch(to)),
        };
        Ok(if self.is_null() { 0 } else { v })
    }

    fn floating(
        &self,
        to: &str,
    ) -> DolphinResult<f64> {
        let v = match &self.cell {
            Cell::Byte(v) => *v as f64,
            Cell::Short(v) => *v as f64,
            Cell::Int(v) => *v as f64,
            Cell::Long(v) => *v as f64,
            Cell::Float(v) => v.0 as f64,
            Cell::Double(v) => v.0,
            Cell::Decimal32 { scale, raw } => *raw as f64 / 10f64.powi(*scale as i32),
            Cell::Decimal64 { scale, raw } => *raw as f64 / 10f64.powi(*scale as i32),
            Cell::Decimal128 { scale, raw } => *raw as f64 / 10f64.powi(*scale as i32),
            _ => return Err(self.mismatch(to)),
        };
        Ok(if self.is_null() { 0.0 } else { v })
    }
}

fn byte_scalar(
    data_type: DataType,
    v: i8,
) -> Scalar {
    Scalar {
        data_type,
        cell: Cell::Byte(v),
    }
}

fn int_scalar(
    data_type: DataType,
    v: i32,
) -> Scalar {
    Scalar {
        data_type,
        cell: Cell::Int(v),
    }
}

fn long_scalar(
    data_type: DataType,
    v: i64,
) -> Scalar {
    Scalar {
        data_type,
        cell: Cell::Long(v),
    }
}

fn create_wide(
    data_type: DataType,
    text: &str,
) -> DolphinResult<Scalar> {
    Ok(Scalar {
        data_type,
        cell: Cell::Wide(parse_wide(data_type, text)?),
    })
}

/// Переводит десятичное значение в целое с заданным масштабом.
///
/// Значение округляется до масштаба; результат должен помещаться в
/// ширину типа и не совпадать с null. Масштабы больше 28 добираются
/// умножением мантиссы.
pub(crate) fn decimal_to_raw(
    data_type: DataType,
    v: Decimal,
    scale: u32,
) -> DolphinResult<i128> {
    data_type.check_scale(scale)?;
    let mut scaled = v;
    scaled.rescale(scale.min(Decimal::MAX_SCALE));
    let raw = scale
        .checked_sub(scaled.scale())
        .and_then(|rest| 10i128.checked_pow(rest))
        .and_then(|factor| scaled.mantissa().checked_mul(factor));
    let fits = |raw: i128| match data_type {
        DataType::Decimal32 => raw > i32::MIN as i128 && raw <= i32::MAX as i128,
        DataType::Decimal64 => raw > i64::MIN as i128 && raw <= i64::MAX as i128,
        _ => raw != NULL_INT128,
    };
    match raw {
        Some(raw) if fits(raw) => Ok(raw),
        _ => Err(ModelError::InvalidLiteral {
            data_type: data_type.to_string(),
            text: v.to_string(),
        }
        .into()),
    }
}

/// Целое с масштабом в десятичной записи: `(-12345, 3)` даёт `-12.345`.
pub(crate) fn format_scaled(
    raw: i128,
    scale: u32,
) -> String {
    let digits = raw.unsigned_abs().to_string();
    let sign = if raw < 0 { "-" } else { "" };
    let scale = scale as usize;
    if scale == 0 {
        return format!("{sign}{digits}");
    }
    let padded = format!("{digits:0>width$}", width = scale + 1);
    let (int, frac) = padded.split_at(padded.len() - scale);
    format!("{sign}{int}.{frac}")
}

/// Текст ячейки в серверном формате; null даёт пустую строку.
pub(crate) fn render_cell(
    data_type: DataType,
    cell: &Cell,
) -> String {
    if cell.is_null() {
        return String::new();
    }
    match cell {
        Cell::Void => String::new(),
        Cell::Byte(v) if data_type == DataType::Bool => (*v != 0).to_string(),
        Cell::Byte(v) => v.to_string(),
        Cell::Short(v) => v.to_string(),
        Cell::Int(v) if data_type.is_temporal() => format_temporal(data_type, *v as i64),
        Cell::Int(v) => v.to_string(),
        Cell::Long(v) if data_type.is_temporal() => format_temporal(data_type, *v),
        Cell::Long(v) => v.to_string(),
        Cell::Float(v) => v.0.to_string(),
        Cell::Double(v) => v.0.to_string(),
        Cell::Decimal32 { scale, raw } => format_scaled(*raw as i128, *scale),
        Cell::Decimal64 { scale, raw } => format_scaled(*raw as i128, *scale),
        Cell::Decimal128 { scale, raw } => format_scaled(*raw, *scale),
        Cell::Duration { value, unit } => format_duration(*value, *unit),
        Cell::Double2(re, im) if data_type == DataType::Complex => {
            format!("{:.5}+{:.5}i", re.0, im.0)
        }
        Cell::Double2(x, y) => format!("({:.5}, {:.5})", x.0, y.0),
        Cell::Text(s) => s.clone(),
        Cell::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        Cell::Wide(v) => format_wide(data_type, *v),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
