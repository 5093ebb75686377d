//! Временные типы: единицы, эпоха и текстовый формат.
//!
//! Все временные значения хранятся как целое число единиц от эпохи
//! `1970-01-01T00:00:00` (или от полуночи для типов времени суток). Формат
//! вывода повторяет серверный: `2012.06.13`, `2012.06M`, `13:30:10.008`,
//! `2012.06.13T13:30:10.008007006` и т.д.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::{DataType, NULL_INT, NULL_LONG};

const NANOS_PER_MILLI: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000_000_000;

fn epoch() -> NaiveDateTime {
    DateTime::UNIX_EPOCH.naive_utc()
}

/// Дни от эпохи для `date`.
pub fn date_to_days(d: NaiveDate) -> i32 {
    (d - epoch().date()).num_days() as i32
}

/// `month` кодируется как `year * 12 + month - 1`.
pub fn month_of(
    year: i32,
    month: u32,
) -> i32 {
    year * 12 + month as i32 - 1
}

/// Миллисекунды от полуночи для `time`.
pub fn time_to_millis(t: NaiveTime) -> i32 {
    (t.num_seconds_from_midnight() as i64 * 1000 + (t.nanosecond() as i64 / NANOS_PER_MILLI)) as i32
}

/// Наносекунды от полуночи для `nanotime`.
pub fn time_to_nanos(t: NaiveTime) -> i64 {
    t.num_seconds_from_midnight() as i64 * NANOS_PER_SECOND + t.nanosecond() as i64
}

/// Переводит момент времени в сырое значение указанного временного типа.
///
/// Возвращает `None` для невременного типа или при выходе за диапазон
/// хранения (например, `datetime` после 2038 года).
pub fn raw_from_datetime(
    data_type: DataType,
    v: NaiveDateTime,
) -> Option<i64> {
    let utc = v.and_utc();
    let raw = match data_type {
        DataType::Date => date_to_days(v.date()) as i64,
        DataType::Month => month_of(v.year(), v.month()) as i64,
        DataType::Time => time_to_millis(v.time()) as i64,
        DataType::Minute => (v.time().num_seconds_from_midnight() / 60) as i64,
        DataType::Second => v.time().num_seconds_from_midnight() as i64,
        DataType::DateTime => utc.timestamp(),
        DataType::Timestamp => utc.timestamp_millis(),
        DataType::NanoTime => time_to_nanos(v.time()),
        DataType::NanoTimestamp => utc.timestamp_nanos_opt()?,
        DataType::DateHour => utc.timestamp().div_euclid(3600),
        DataType::DateMinute => utc.timestamp().div_euclid(60),
        _ => return None,
    };
    match data_type.width() {
        Some(4) => i32::try_from(raw).ok().filter(|r| *r != NULL_INT).map(i64::from),
        _ => Some(raw).filter(|r| *r != NULL_LONG),
    }
}

/// Переводит сырое значение временного типа в момент времени.
///
/// Типы времени суток отображаются на дату эпохи.
pub fn to_datetime(
    data_type: DataType,
    raw: i64,
) -> Option<NaiveDateTime> {
    let from_nanos = |nanos: i64| {
        DateTime::from_timestamp(
            nanos.div_euclid(NANOS_PER_SECOND),
            nanos.rem_euclid(NANOS_PER_SECOND) as u32,
        )
        .map(|d| d.naive_utc())
    };
    let from_seconds = |secs: i64| DateTime::from_timestamp(secs, 0).map(|d| d.naive_utc());

    match data_type {
        DataType::Date => from_seconds(raw.checked_mul(86_400)?),
        DataType::Month => {
            let year = raw.div_euclid(12) as i32;
            let month = raw.rem_euclid(12) as u32 + 1;
            NaiveDate::from_ymd_opt(year, month, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        DataType::Time | DataType::Timestamp => from_nanos(raw.checked_mul(NANOS_PER_MILLI)?),
        DataType::Minute | DataType::DateMinute => from_seconds(raw.checked_mul(60)?),
        DataType::Second | DataType::DateTime => from_seconds(raw),
        DataType::NanoTime | DataType::NanoTimestamp => from_nanos(raw),
        DataType::DateHour => from_seconds(raw.checked_mul(3600)?),
        _ => None,
    }
}

/// Текстовое представление временного значения в серверном формате.
///
/// Для null и значений вне диапазона возвращает пустую строку.
pub fn format_temporal(
    data_type: DataType,
    raw: i64,
) -> String {
    if data_type == DataType::Month {
        return format!("{:04}.{:02}M", raw.div_euclid(12), raw.rem_euclid(12) + 1);
    }
    let Some(v) = to_datetime(data_type, raw) else {
        return String::new();
    };
    let pattern = match data_type {
        DataType::Date => "%Y.%m.%d",
        DataType::Time => "%H:%M:%S%.3f",
        DataType::Minute => "%H:%Mm",
        DataType::Second => "%H:%M:%S",
        DataType::DateTime => "%Y.%m.%dT%H:%M:%S",
        DataType::Timestamp => "%Y.%m.%dT%H:%M:%S%.3f",
        DataType::NanoTime => "%H:%M:%S%.9f",
        DataType::NanoTimestamp => "%Y.%m.%dT%H:%M:%S%.9f",
        DataType::DateHour => "%Y.%m.%dT%H",
        DataType::DateMinute => "%Y.%m.%dT%H:%M",
        _ => return String::new(),
    };
    v.format(pattern).to_string()
}

/// Суффиксы единиц `duration` в порядке их кодов на проводе.
const DURATION_UNITS: [&str; 11] = ["ns", "us", "ms", "s", "m", "H", "d", "w", "M", "y", "B"];

/// Текст `duration` вида `5ms`; для null пустая строка.
pub fn format_duration(
    value: i32,
    unit: u32,
) -> String {
    if value == NULL_INT {
        return String::new();
    }
    let suffix = DURATION_UNITS.get(unit as usize).copied().unwrap_or("");
    format!("{value}{suffix}")
}

/// Разбирает `duration` вида `-3d` в пару (значение, код единицы).
/// Пустая строка даёт null.
pub fn parse_duration(text: &str) -> Option<(i32, u32)> {
    if text.is_empty() {
        return Some((NULL_INT, 0));
    }
    let split = text.find(|c: char| c.is_ascii_alphabetic())?;
    let (digits, suffix) = text.split_at(split);
    let unit = DURATION_UNITS.iter().position(|u| *u == suffix)?;
    Some((digits.parse().ok()?, unit as u32))
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2012, 6, 13)
            .unwrap()
            .and_hms_nano_opt(13, 30, 10, 8_007_006)
            .unwrap()
    }

    /// Тест проверяет серверный формат каждого временного типа.
    #[rstest]
    #[case(DataType::Date, "2012.06.13")]
    #[case(DataType::Month, "2012.06M")]
    #[case(DataType::Time, "13:30:10.008")]
    #[case(DataType::Minute, "13:30m")]
    #[case(DataType::Second, "13:30:10")]
    #[case(DataType::DateTime, "2012.06.13T13:30:10")]
    #[case(DataType::Timestamp, "2012.06.13T13:30:10.008")]
    #[case(DataType::NanoTime, "13:30:10.008007006")]
    #[case(DataType::NanoTimestamp, "2012.06.13T13:30:10.008007006")]
    #[case(DataType::DateHour, "2012.06.13T13")]
    #[case(DataType::DateMinute, "2012.06.13T13:30")]
    fn test_format_roundtrip(
        #[case] dt: DataType,
        #[case] expected: &str,
    ) {
        let raw = raw_from_datetime(dt, sample()).unwrap();
        assert_eq!(format_temporal(dt, raw), expected);
    }

    /// Тест проверяет единицы: дни, месяцы и миллисекунды от эпохи.
    #[test]
    fn test_units() {
        let d = NaiveDate::from_ymd_opt(1970, 1, 5).unwrap();
        assert_eq!(date_to_days(d), 4);
        assert_eq!(month_of(2020, 5), 2020 * 12 + 4);
        assert_eq!(format_temporal(DataType::Month, month_of(2020, 5) as i64), "2020.05M");
        let raw = raw_from_datetime(DataType::Timestamp, d.and_hms_opt(4, 0, 0).unwrap()).unwrap();
        assert_eq!(raw, 4 * 86_400_000 + 4 * 3_600_000);
    }

    /// Тест проверяет, что даты до эпохи корректно форматируются.
    #[test]
    fn test_before_epoch() {
        assert_eq!(format_temporal(DataType::Date, -1), "1969.12.31");
        assert_eq!(format_temporal(DataType::Timestamp, -1), "1969.12.31T23:59:59.999");
    }

    /// Тест проверяет текст и разбор единиц duration.
    #[rstest]
    #[case("5ms", (5, 2))]
    #[case("-3d", (-3, 6))]
    #[case("12M", (12, 8))]
    #[case("7B", (7, 10))]
    fn test_duration_text(
        #[case] text: &str,
        #[case] parts: (i32, u32),
    ) {
        assert_eq!(parse_duration(text), Some(parts));
        assert_eq!(format_duration(parts.0, parts.1), text);
    }

    /// Тест проверяет null и неверные суффиксы duration.
    #[test]
    fn test_duration_invalid() {
        assert_eq!(format_duration(NULL_INT, 0), "");
        assert_eq!(parse_duration(""), Some((NULL_INT, 0)));
        assert_eq!(parse_duration("5x"), None);
        assert_eq!(parse_duration("ms"), None);
        assert_eq!(parse_duration("5"), None);
    }

    /// Тест проверяет, что datetime вне диапазона i32 не конвертируется.
    #[test]
    fn test_datetime_out_of_range() {
        let far = NaiveDate::from_ymd_opt(2100, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(raw_from_datetime(DataType::DateTime, far), None);
        assert!(raw_from_datetime(DataType::Timestamp, far).is_some());
        assert_eq!(raw_from_datetime(DataType::Int, far), None);
    }
}
