//! Текстовые правила для 128-битных типов: `uuid`, `ipaddr`, `int128`.
//!
//! В памяти значение хранится как `u128` в порядке текстового
//! представления (старший байт слева). Ноль означает null.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use dolphindb_error::ModelError;
use uuid::Uuid;

use super::DataType;

/// Форматирует 128-битное значение указанного типа.
///
/// IP-адрес с нулевыми старшими 96 битами выводится как IPv4.
pub fn format_wide(
    data_type: DataType,
    v: u128,
) -> String {
    match data_type {
        DataType::Uuid => Uuid::from_u128(v).hyphenated().to_string(),
        DataType::Ip if v >> 32 == 0 => Ipv4Addr::from(v as u32).to_string(),
        DataType::Ip => Ipv6Addr::from(v).to_string(),
        _ => format!("{v:032x}"),
    }
}

/// Разбирает текст 128-битного значения. Пустая строка даёт null.
pub fn parse_wide(
    data_type: DataType,
    text: &str,
) -> Result<u128, ModelError> {
    if text.is_empty() {
        return Ok(0);
    }
    let invalid = || ModelError::InvalidLiteral {
        data_type: data_type.to_string(),
        text: text.to_string(),
    };
    match data_type {
        DataType::Uuid => Uuid::parse_str(text).map(|u| u.as_u128()).map_err(|_| invalid()),
        DataType::Ip => match text.parse::<IpAddr>().map_err(|_| invalid())? {
            IpAddr::V4(v4) => Ok(u32::from(v4) as u128),
            IpAddr::V6(v6) => Ok(u128::from(v6)),
        },
        DataType::Int128 if text.len() == 32 => {
            u128::from_str_radix(text, 16).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    /// Тест проверяет разбор и вывод для каждого 128-битного типа.
    #[rstest]
    #[case(DataType::Uuid, "5d212a78-cc48-e3b1-4235-b4d91473ee87")]
    #[case(DataType::Ip, "192.168.1.13")]
    #[case(DataType::Ip, "2001:db8::ff00:42:8329")]
    #[case(DataType::Int128, "e1671797c52e15f763380b45e841ec32")]
    fn test_text_roundtrip(
        #[case] dt: DataType,
        #[case] text: &str,
    ) {
        let v = parse_wide(dt, text).unwrap();
        assert_ne!(v, 0);
        assert_eq!(format_wide(dt, v), text);
    }

    /// Тест проверяет, что IPv4 занимает младшие 32 бита.
    #[test]
    fn test_ipv4_layout() {
        assert_eq!(parse_wide(DataType::Ip, "0.0.0.1").unwrap(), 1);
        assert_eq!(format_wide(DataType::Ip, 0x0a00_0001), "10.0.0.1");
    }

    /// Тест проверяет пустую строку и некорректный ввод.
    #[test]
    fn test_empty_and_invalid() {
        assert_eq!(parse_wide(DataType::Uuid, "").unwrap(), 0);
        assert!(parse_wide(DataType::Uuid, "not-a-uuid").is_err());
        assert!(parse_wide(DataType::Int128, "abc").is_err());
        assert!(parse_wide(DataType::Ip, "300.1.1.1").is_err());
    }
}
