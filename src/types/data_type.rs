//! Идентификаторы типов и форм данных.
//!
//! Значения совпадают с байтами, которые сервер использует в заголовке
//! каждого объекта (категории). Имена в нижнем регистре используются в
//! аннотациях колонок и в текстовом выводе.

use std::fmt;

use dolphindb_error::{CodecError, DolphinResult, ModelError};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{AsRefStr, Display, EnumString};

/// Смещение, которым сервер помечает векторы-массивы (`type + 64`).
pub const ARRAY_VECTOR_OFFSET: u8 = 64;
/// Смещение символьного вектора со словарём (`type + 128`).
pub const SYMBOL_EXTENDED_OFFSET: u8 = 128;

/// Null для `bool` и `char`.
pub const NULL_BYTE: i8 = i8::MIN;
/// Null для `short`.
pub const NULL_SHORT: i16 = i16::MIN;
/// Null для `int`, 4-байтовых временных типов и `decimal32`.
pub const NULL_INT: i32 = i32::MIN;
/// Null для `long`, 8-байтовых временных типов и `decimal64`.
pub const NULL_LONG: i64 = i64::MIN;
/// Null для `float`.
pub const NULL_FLOAT: f32 = -f32::MAX;
/// Null для `double`, а также для любой из частей `complex` и `point`.
pub const NULL_DOUBLE: f64 = -f64::MAX;
/// Null для `decimal128`.
pub const NULL_INT128: i128 = i128::MIN;

/// Тип элемента данных.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Display,
    EnumString,
    AsRefStr,
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum DataType {
    Void = 0,
    Bool = 1,
    Char = 2,
    Short = 3,
    Int = 4,
    Long = 5,
    Date = 6,
    Month = 7,
    Time = 8,
    Minute = 9,
    Second = 10,
    DateTime = 11,
    Timestamp = 12,
    NanoTime = 13,
    NanoTimestamp = 14,
    Float = 15,
    Double = 16,
    Symbol = 17,
    String = 18,
    Uuid = 19,
    Function = 20,
    Handle = 21,
    Code = 22,
    DataSource = 23,
    Resource = 24,
    Any = 25,
    Compress = 26,
    Dictionary = 27,
    DateHour = 28,
    DateMinute = 29,
    #[strum(serialize = "ipaddr")]
    Ip = 30,
    Int128 = 31,
    Blob = 32,
    Complex = 34,
    Point = 35,
    Duration = 36,
    Decimal32 = 37,
    Decimal64 = 38,
    Decimal128 = 39,
    Object = 40,
}

/// Форма (контейнер) данных.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive, Display, AsRefStr,
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum DataForm {
    Scalar = 0,
    Vector = 1,
    Pair = 2,
    Matrix = 3,
    Set = 4,
    Dictionary = 5,
    Table = 6,
    Chart = 7,
    Chunk = 8,
}

/// Класс хранения: как тип лежит в памяти и на проводе.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Void,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal32,
    Decimal64,
    Decimal128,
    /// Значение и код единицы `duration`.
    Duration,
    /// Две части `complex` и `point`.
    Double2,
    Text,
    Blob,
    Wide,
    Any,
}

/// Категория объекта: форма и тип, как они записаны в двухбайтовом
/// заголовке.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub form: DataForm,
    pub data_type: DataType,
    /// Символьный вектор со словарём (`symbol + 128`).
    pub symbol_extended: bool,
    /// Вектор-массив (`type + 64`): каждая строка сама является массивом.
    pub array: bool,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl DataType {
    /// Парсит имя типа в нижнем регистре (`"int"`, `"ipaddr"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// Класс хранения типа; `None` для типов, которые кодек не переносит.
    pub fn storage(self) -> Option<Storage> {
        let storage = match self {
            Self::Void => Storage::Void,
            Self::Bool | Self::Char => Storage::Byte,
            Self::Short => Storage::Short,
            Self::Int
            | Self::Date
            | Self::Month
            | Self::Time
            | Self::Minute
            | Self::Second
            | Self::DateTime
            | Self::DateHour
            | Self::DateMinute => Storage::Int,
            Self::Long | Self::Timestamp | Self::NanoTime | Self::NanoTimestamp => Storage::Long,
            Self::Float => Storage::Float,
            Self::Double => Storage::Double,
            Self::Decimal32 => Storage::Decimal32,
            Self::Decimal64 => Storage::Decimal64,
            Self::Decimal128 => Storage::Decimal128,
            Self::Duration => Storage::Duration,
            Self::Complex | Self::Point => Storage::Double2,
            Self::Symbol | Self::String | Self::Function | Self::Handle | Self::Code => {
                Storage::Text
            }
            Self::Blob => Storage::Blob,
            Self::Uuid | Self::Ip | Self::Int128 => Storage::Wide,
            Self::Any => Storage::Any,
            _ => return None,
        };
        Some(storage)
    }

    /// Поддерживается ли тип моделью значений и кодеком.
    pub fn is_supported(self) -> bool {
        self.storage().is_some()
    }

    /// Фиксированная ширина элемента на проводе в байтах.
    pub fn width(self) -> Option<usize> {
        match self.storage()? {
            Storage::Byte => Some(1),
            Storage::Short => Some(2),
            Storage::Int | Storage::Float | Storage::Decimal32 => Some(4),
            Storage::Long | Storage::Double | Storage::Decimal64 | Storage::Duration => Some(8),
            Storage::Wide | Storage::Double2 | Storage::Decimal128 => Some(16),
            _ => None,
        }
    }

    /// Временной тип.
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            Self::Date
                | Self::Month
                | Self::Time
                | Self::Minute
                | Self::Second
                | Self::DateTime
                | Self::Timestamp
                | Self::NanoTime
                | Self::NanoTimestamp
                | Self::DateHour
                | Self::DateMinute
        )
    }

    /// Десятичный тип с масштабом.
    pub fn is_decimal(self) -> bool {
        matches!(self, Self::Decimal32 | Self::Decimal64 | Self::Decimal128)
    }

    /// Может ли тип быть элементом вектора-массива: только типы
    /// фиксированной ширины.
    pub fn supports_array(self) -> bool {
        self != Self::Void && self.width().is_some()
    }

    /// Максимальный масштаб десятичного типа.
    pub fn max_scale(self) -> Option<u32> {
        match self {
            Self::Decimal32 => Some(9),
            Self::Decimal64 => Some(18),
            Self::Decimal128 => Some(38),
            _ => None,
        }
    }

    /// Проверяет масштаб десятичного типа.
    pub fn check_scale(
        self,
        scale: u32,
    ) -> DolphinResult<()> {
        match self.max_scale() {
            Some(max) if scale <= max => Ok(()),
            Some(max) => Err(ModelError::InvalidScale {
                data_type: self.to_string(),
                scale,
                max,
            }
            .into()),
            None => Err(ModelError::TypeMismatch {
                from: self.to_string(),
                to: "decimal".to_string(),
            }
            .into()),
        }
    }
}

impl Category {
    pub fn new(
        form: DataForm,
        data_type: DataType,
    ) -> Self {
        Self {
            form,
            data_type,
            symbol_extended: false,
            array: false,
        }
    }

    /// Категория символьного вектора со словарём.
    pub fn symbol_extended(form: DataForm) -> Self {
        Self {
            symbol_extended: true,
            ..Self::new(form, DataType::Symbol)
        }
    }

    /// Категория вектора-массива с элементами `data_type`.
    pub fn array(data_type: DataType) -> Self {
        Self {
            array: true,
            ..Self::new(DataForm::Vector, data_type)
        }
    }

    /// Байт типа, как он записывается на провод.
    pub fn type_byte(&self) -> u8 {
        let base: u8 = self.data_type.into();
        if self.symbol_extended {
            base + SYMBOL_EXTENDED_OFFSET
        } else if self.array {
            base + ARRAY_VECTOR_OFFSET
        } else {
            base
        }
    }

    /// Разбирает байты формы и типа из заголовка.
    pub fn from_bytes(
        form: u8,
        type_byte: u8,
    ) -> Result<Self, CodecError> {
        let form = DataForm::try_from(form).map_err(|_| CodecError::UnknownDataForm(form))?;
        let (raw, symbol_extended) = if type_byte >= SYMBOL_EXTENDED_OFFSET {
            (type_byte - SYMBOL_EXTENDED_OFFSET, true)
        } else {
            (type_byte, false)
        };
        let (raw, array) = if !symbol_extended && raw >= ARRAY_VECTOR_OFFSET {
            (raw - ARRAY_VECTOR_OFFSET, true)
        } else {
            (raw, false)
        };
        let data_type = DataType::try_from(raw).map_err(|_| CodecError::UnknownDataType(type_byte))?;
        if symbol_extended && data_type != DataType::Symbol {
            return Err(CodecError::UnknownDataType(type_byte));
        }
        if array && (form != DataForm::Vector || !data_type.supports_array()) {
            return Err(CodecError::Unsupported {
                form: form.to_string(),
                data_type: format!("{data_type}[]"),
            });
        }
        Ok(Self {
            form,
            data_type,
            symbol_extended,
            array,
        })
    }
}

impl fmt::Display for Category {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let suffix = if self.array { "[]" } else { "" };
        write!(f, "{}<{}{suffix}>", self.form, self.data_type)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    /// Тест проверяет имена типов в нижнем регистре в обе стороны.
    #[rstest]
    #[case(DataType::Int, "int")]
    #[case(DataType::DateTime, "datetime")]
    #[case(DataType::NanoTimestamp, "nanotimestamp")]
    #[case(DataType::Ip, "ipaddr")]
    #[case(DataType::Decimal64, "decimal64")]
    #[case(DataType::DateMinute, "dateminute")]
    fn test_type_names(
        #[case] dt: DataType,
        #[case] name: &str,
    ) {
        assert_eq!(dt.to_string(), name);
        assert_eq!(DataType::from_name(name), Some(dt));
    }

    /// Тест проверяет, что неизвестное имя и имя в другом регистре не
    /// распознаются.
    #[test]
    fn test_unknown_names() {
        assert_eq!(DataType::from_name("varchar"), None);
        assert_eq!(DataType::from_name("INT"), None);
    }

    /// Тест проверяет байтовые значения и ширину элементов.
    #[test]
    fn test_bytes_and_widths() {
        assert_eq!(u8::from(DataType::Blob), 32);
        assert_eq!(DataType::try_from(37u8).unwrap(), DataType::Decimal32);
        assert!(DataType::try_from(33u8).is_err());
        assert_eq!(DataType::Date.width(), Some(4));
        assert_eq!(DataType::NanoTime.width(), Some(8));
        assert_eq!(DataType::Uuid.width(), Some(16));
        assert_eq!(DataType::String.width(), None);
        assert_eq!(DataType::Decimal128.width(), Some(16));
        assert_eq!(DataType::Point.width(), Some(16));
        assert_eq!(DataType::Duration.width(), Some(8));
        assert!(DataType::Function.is_supported());
        assert!(!DataType::Resource.is_supported());
    }

    /// Тест проверяет разбор категории, включая символ со словарём и
    /// векторы-массивы.
    #[test]
    fn test_category_from_bytes() {
        let c = Category::from_bytes(1, 145).unwrap();
        assert_eq!(c.form, DataForm::Vector);
        assert_eq!(c.data_type, DataType::Symbol);
        assert!(c.symbol_extended);
        assert_eq!(c.type_byte(), 145);

        assert_eq!(
            Category::from_bytes(9, 4).unwrap_err(),
            CodecError::UnknownDataForm(9)
        );
        assert_eq!(
            Category::from_bytes(0, 33).unwrap_err(),
            CodecError::UnknownDataType(33)
        );
        let c = Category::from_bytes(1, 68).unwrap();
        assert!(c.array);
        assert_eq!(c.data_type, DataType::Int);
        assert_eq!(c.type_byte(), 68);
        assert_eq!(c.to_string(), "vector<int[]>");
        assert_eq!(Category::array(DataType::Decimal128).type_byte(), 103);

        // строки и скаляры-массивы не бывают
        assert!(matches!(
            Category::from_bytes(1, 82).unwrap_err(),
            CodecError::Unsupported { .. }
        ));
        assert!(matches!(
            Category::from_bytes(0, 68).unwrap_err(),
            CodecError::Unsupported { .. }
        ));
    }

    /// Тест проверяет границы масштаба decimal.
    #[test]
    fn test_check_scale() {
        assert!(DataType::Decimal32.check_scale(9).is_ok());
        assert!(DataType::Decimal32.check_scale(10).is_err());
        assert!(DataType::Decimal64.check_scale(18).is_ok());
        assert!(DataType::Decimal128.check_scale(38).is_ok());
        assert!(DataType::Decimal128.check_scale(39).is_err());
        assert!(DataType::Int.check_scale(0).is_err());
    }
}
