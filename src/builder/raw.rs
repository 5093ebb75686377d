use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use dolphindb_error::{BuildError, DolphinResult, ModelError, StackError};
use rust_decimal::Decimal;

use crate::{
    model::{decimal_to_raw, ColumnData, Vector},
    types::{
        parse_duration, parse_wide, raw_from_datetime, DataType, Storage, NULL_BYTE, NULL_DOUBLE,
        NULL_FLOAT, NULL_INT, NULL_INT128, NULL_LONG, NULL_SHORT,
    },
};

/// Сырые значения одной колонки до приведения к типу таблицы.
///
/// `None` в любой позиции превращается в null выбранного типа. Целые
/// колонки подходят и для временных типов той же ширины: значение
/// считается уже закодированным (дни, миллисекунды и т.д.).
#[derive(Debug, Clone, PartialEq)]
pub enum RawColumn {
    Bool(Vec<Option<bool>>),
    Char(Vec<Option<i8>>),
    Short(Vec<Option<i16>>),
    Int(Vec<Option<i32>>),
    Long(Vec<Option<i64>>),
    Float(Vec<Option<f32>>),
    Double(Vec<Option<f64>>),
    /// `string`, `symbol`, а также текст `uuid`, `ipaddr`, `int128` и `duration`.
    Text(Vec<Option<String>>),
    Blob(Vec<Option<Vec<u8>>>),
    Date(Vec<Option<NaiveDate>>),
    Time(Vec<Option<NaiveTime>>),
    DateTime(Vec<Option<NaiveDateTime>>),
    Decimal {
        scale: u32,
        values: Vec<Option<Decimal>>,
    },
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl RawColumn {
    /// Десятичная колонка с явным масштабом.
    pub fn decimal(
        scale: u32,
        values: impl IntoIterator<Item = Decimal>,
    ) -> Self {
        Self::Decimal {
            scale,
            values: values.into_iter().map(Some).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Char(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Blob(v) => v.len(),
            Self::Date(v) => v.len(),
            Self::Time(v) => v.len(),
            Self::DateTime(v) => v.len(),
            Self::Decimal { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Приводит значения к вектору типа `data_type`.
    ///
    /// Колонка неподходящего вида даёт `Invalid type <type>`.
    pub fn into_vector(
        self,
        data_type: DataType,
    ) -> DolphinResult<Vector> {
        let storage = data_type.storage();
        let data = match (data_type, self) {
            (DataType::Bool, Self::Bool(v)) => {
                ColumnData::Byte(v.into_iter().map(|b| b.map_or(NULL_BYTE, i8::from)).collect())
            }
            (DataType::Char, Self::Char(v)) => ColumnData::Byte(or_null(v, NULL_BYTE)),
            (DataType::Short, Self::Short(v)) => ColumnData::Short(or_null(v, NULL_SHORT)),
            (_, Self::Int(v)) if storage == Some(Storage::Int) => {
                ColumnData::Int(or_null(v, NULL_INT))
            }
            (_, Self::Long(v)) if storage == Some(Storage::Long) => {
                ColumnData::Long(or_null(v, NULL_LONG))
            }
            (DataType::Float, Self::Float(v)) => ColumnData::Float(or_null(v, NULL_FLOAT)),
            (DataType::Double, Self::Double(v)) => ColumnData::Double(or_null(v, NULL_DOUBLE)),
            (DataType::String | DataType::Symbol, Self::Text(v)) => {
                ColumnData::Text(v.into_iter().map(Option::unwrap_or_default).collect())
            }
            (DataType::Uuid | DataType::Ip | DataType::Int128, Self::Text(v)) => {
                let values = v
                    .iter()
                    .map(|s| parse_wide(data_type, s.as_deref().unwrap_or_default()))
                    .collect::<Result<_, ModelError>>()?;
                ColumnData::Wide(values)
            }
            (DataType::Duration, Self::Text(v)) => {
                let values = v
                    .iter()
                    .map(|s| {
                        let text = s.as_deref().unwrap_or_default();
                        parse_duration(text).ok_or_else(|| ModelError::InvalidLiteral {
                            data_type: data_type.to_string(),
                            text: text.to_string(),
                        })
                    })
                    .collect::<Result<_, ModelError>>()?;
                ColumnData::Duration(values)
            }
            (DataType::Blob, Self::Blob(v)) => {
                ColumnData::Blob(v.into_iter().map(Option::unwrap_or_default).collect())
            }
            (DataType::Date | DataType::Month, Self::Date(v)) => temporal(
                data_type,
                v.into_iter().map(|d| d.map(|d| d.and_time(NaiveTime::MIN))),
            )?,
            (DataType::Time | DataType::Minute | DataType::Second | DataType::NanoTime, Self::Time(v)) => {
                let day = DateTime::UNIX_EPOCH.date_naive();
                temporal(data_type, v.into_iter().map(|t| t.map(|t| day.and_time(t))))?
            }
            (_, Self::DateTime(v)) if data_type.is_temporal() => {
                temporal(data_type, v.into_iter())?
            }
            (DataType::Decimal32, Self::Decimal { scale, values }) => {
                let values = values
                    .into_iter()
                    .map(|d| match d {
                        Some(d) => decimal_to_raw(data_type, d, scale).map(|raw| raw as i32),
                        None => Ok(NULL_INT),
                    })
                    .collect::<DolphinResult<_>>()?;
                ColumnData::Decimal32 { scale, values }
            }
            (DataType::Decimal64, Self::Decimal { scale, values }) => {
                let values = values
                    .into_iter()
                    .map(|d| match d {
                        Some(d) => decimal_to_raw(data_type, d, scale).map(|raw| raw as i64),
                        None => Ok(NULL_LONG),
                    })
                    .collect::<DolphinResult<_>>()?;
                ColumnData::Decimal64 { scale, values }
            }
            (DataType::Decimal128, Self::Decimal { scale, values }) => {
                let values = values
                    .into_iter()
                    .map(|d| match d {
                        Some(d) => decimal_to_raw(data_type, d, scale),
                        None => Ok(NULL_INT128),
                    })
                    .collect::<DolphinResult<_>>()?;
                ColumnData::Decimal128 { scale, values }
            }
            _ => {
                return Err(BuildError::InvalidType {
                    name: data_type.to_string(),
                }
                .into())
            }
        };
        Vector::new(data_type, data)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для RawColumn
////////////////////////////////////////////////////////////////////////////////

/// `From<Vec<T>>` и `From<Vec<Option<T>>>` для варианта колонки.
macro_rules! raw_from {
    ($($ty:ty => $variant:ident;)*) => {
        $(
            impl From<Vec<$ty>> for RawColumn {
                fn from(values: Vec<$ty>) -> Self {
                    Self::$variant(values.into_iter().map(Some).collect())
                }
            }

            impl From<Vec<Option<$ty>>> for RawColumn {
                fn from(values: Vec<Option<$ty>>) -> Self {
                    Self::$variant(values)
                }
            }
        )*
    };
}

raw_from! {
    bool => Bool;
    i8 => Char;
    i16 => Short;
    i32 => Int;
    i64 => Long;
    f32 => Float;
    f64 => Double;
    String => Text;
    Vec<u8> => Blob;
    NaiveDate => Date;
    NaiveTime => Time;
    NaiveDateTime => DateTime;
}

impl From<Vec<&str>> for RawColumn {
    fn from(values: Vec<&str>) -> Self {
        Self::Text(values.into_iter().map(|s| Some(s.to_string())).collect())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Внутренние методы и функции
////////////////////////////////////////////////////////////////////////////////

fn or_null<T: Copy>(
    values: Vec<Option<T>>,
    null: T,
) -> Vec<T> {
    values.into_iter().map(|v| v.unwrap_or(null)).collect()
}

/// Кодирует моменты времени в сырые значения временного типа.
fn temporal(
    data_type: DataType,
    values: impl Iterator<Item = Option<NaiveDateTime>>,
) -> DolphinResult<ColumnData> {
    let raws = values
        .map(|v| match v {
            None => Ok(None),
            Some(v) => raw_from_datetime(data_type, v).map(Some).ok_or_else(|| {
                StackError::from(ModelError::InvalidLiteral {
                    data_type: data_type.to_string(),
                    text: v.to_string(),
                })
            }),
        })
        .collect::<DolphinResult<Vec<_>>>()?;
    let data = match data_type.storage() {
        Some(Storage::Int) => {
            ColumnData::Int(raws.into_iter().map(|r| r.map_or(NULL_INT, |r| r as i32)).collect())
        }
        _ => ColumnData::Long(raws.into_iter().map(|r| r.unwrap_or(NULL_LONG)).collect()),
    };
    Ok(data)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use dolphindb_error::StatusCode;
    use rstest::rstest;

    use super::*;

    /// Тест проверяет, что None превращается в null нужного типа.
    #[test]
    fn test_option_slots_become_nulls() {
        let v = RawColumn::from(vec![Some(1i32), None, Some(3)])
            .into_vector(DataType::Int)
            .unwrap();
        assert!(v.is_null(1).unwrap());
        assert_eq!(v.get(2).unwrap().get_int().unwrap(), 3);

        let v = RawColumn::from(vec![Some(true), None])
            .into_vector(DataType::Bool)
            .unwrap();
        assert!(v.get(0).unwrap().get_bool().unwrap());
        assert!(v.is_null(1).unwrap());

        let v = RawColumn::Text(vec![Some("a".into()), None])
            .into_vector(DataType::Symbol)
            .unwrap();
        assert_eq!(v.data(), &ColumnData::Text(vec!["a".into(), String::new()]));
    }

    /// Тест проверяет временные колонки из значений chrono и сырых целых.
    #[test]
    fn test_temporal_columns() {
        let date = NaiveDate::from_ymd_opt(2012, 6, 13).unwrap();
        let v = RawColumn::from(vec![date]).into_vector(DataType::Date).unwrap();
        assert_eq!(v.data(), &ColumnData::Int(vec![15504]));

        let v = RawColumn::from(vec![date]).into_vector(DataType::Month).unwrap();
        assert_eq!(v.data(), &ColumnData::Int(vec![2012 * 12 + 5]));

        let v = RawColumn::from(vec![15504i32]).into_vector(DataType::Date).unwrap();
        assert_eq!(v.get(0).unwrap().get_string().unwrap(), "2012.06.13");

        let time = NaiveTime::from_hms_milli_opt(13, 30, 10, 8).unwrap();
        let v = RawColumn::from(vec![time]).into_vector(DataType::Second).unwrap();
        assert_eq!(v.data(), &ColumnData::Int(vec![13 * 3600 + 30 * 60 + 10]));

        let ts = date.and_time(time);
        let v = RawColumn::from(vec![Some(ts), None])
            .into_vector(DataType::Timestamp)
            .unwrap();
        assert_eq!(v.get(0).unwrap().get_string().unwrap(), "2012.06.13T13:30:10.008");
        assert!(v.is_null(1).unwrap());
    }

    /// Тест проверяет, что datetime за пределами 32 бит отклоняется.
    #[test]
    fn test_datetime_out_of_range() {
        let late = NaiveDate::from_ymd_opt(2100, 1, 1)
            .unwrap()
            .and_time(NaiveTime::MIN);
        let err = RawColumn::from(vec![late])
            .into_vector(DataType::DateTime)
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidValue);
    }

    /// Тест проверяет 128-битные колонки из текста.
    #[test]
    fn test_wide_columns() {
        let v = RawColumn::from(vec!["192.168.1.13", ""])
            .into_vector(DataType::Ip)
            .unwrap();
        assert_eq!(v.get(0).unwrap().get_string().unwrap(), "192.168.1.13");
        assert!(v.is_null(1).unwrap());

        let err = RawColumn::from(vec!["not-a-uuid"])
            .into_vector(DataType::Uuid)
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidValue);
    }

    /// Тест проверяет десятичные колонки с масштабом.
    #[test]
    fn test_decimal_column() {
        let v = RawColumn::Decimal {
            scale: 2,
            values: vec![Some(Decimal::new(314, 2)), None],
        }
        .into_vector(DataType::Decimal32)
        .unwrap();
        assert_eq!(v.scale(), Some(2));
        assert_eq!(
            v.data(),
            &ColumnData::Decimal32 {
                scale: 2,
                values: vec![314, NULL_INT]
            }
        );

        let err = RawColumn::decimal(12, [Decimal::ONE])
            .into_vector(DataType::Decimal32)
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidScale);

        let wide = RawColumn::Decimal {
            scale: 20,
            values: vec![Some(Decimal::new(-7, 1)), None],
        }
        .into_vector(DataType::Decimal128)
        .unwrap();
        assert_eq!(
            wide.data(),
            &ColumnData::Decimal128 {
                scale: 20,
                values: vec![-7 * 10i128.pow(19), NULL_INT128]
            }
        );
    }

    /// Тест проверяет колонку duration из текста.
    #[test]
    fn test_duration_column() {
        let v = RawColumn::from(vec!["1d", "", "15m"])
            .into_vector(DataType::Duration)
            .unwrap();
        assert_eq!(v.get(0).unwrap().get_string().unwrap(), "1d");
        assert!(v.is_null(1).unwrap());
        assert!(RawColumn::from(vec!["1q"]).into_vector(DataType::Duration).is_err());
    }

    /// Тест проверяет отказ для колонки неподходящего вида.
    #[rstest]
    #[case(RawColumn::from(vec![1i64]), DataType::Int, "Invalid type int")]
    #[case(RawColumn::from(vec![1i32]), DataType::Double, "Invalid type double")]
    #[case(RawColumn::from(vec!["a"]), DataType::Blob, "Invalid type blob")]
    #[case(RawColumn::from(vec![1i32]), DataType::Any, "Invalid type any")]
    fn test_invalid_type(
        #[case] column: RawColumn,
        #[case] data_type: DataType,
        #[case] message: &str,
    ) {
        let err = column.into_vector(data_type).unwrap_err();
        assert_eq!(err.to_string(), message);
        assert_eq!(err.status_code(), StatusCode::TypeError);
    }
}
