//! Property-based тесты бинарного кодека.
//!
//! Генерируют случайные векторы и таблицы и проверяют, что декодирование
//! возвращает исходное значение в обоих порядках байтов и что байты не
//! зависят от размера диапазона при записи.

use std::io::Cursor;

use dolphindb::{
    create_code, create_complex, create_decimal128, create_duration, create_function,
    create_point,
    model::ColumnData,
    read_value,
    types::{NULL_INT, NULL_INT128},
    write_value, CodecConfig, DataType, Scalar, Table, Value, Vector, WireOrder,
};
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;

const PROPTEST_CASES: u32 = 200;

fn order_strategy() -> impl Strategy<Value = WireOrder> {
    prop_oneof![Just(WireOrder::Little), Just(WireOrder::Big)]
}

/// Векторы основных классов хранения, включая null-значения.
fn vector_strategy() -> impl Strategy<Value = Vector> {
    prop_oneof![
        prop::collection::vec(prop_oneof![Just(NULL_INT), any::<i32>()], 0..300)
            .prop_map(|v| Vector::new(DataType::Int, ColumnData::Int(v)).unwrap()),
        prop::collection::vec(any::<i64>(), 0..300)
            .prop_map(|v| Vector::new(DataType::Timestamp, ColumnData::Long(v)).unwrap()),
        prop::collection::vec(-1.0e12..1.0e12f64, 0..300)
            .prop_map(|v| Vector::new(DataType::Double, ColumnData::Double(v)).unwrap()),
        prop::collection::vec("[a-zA-Z0-9 ]{0,12}", 0..100)
            .prop_map(|v| Vector::new(DataType::String, ColumnData::Text(v)).unwrap()),
        prop::collection::vec("[A-Z]{1,4}", 0..100)
            .prop_map(|v| Vector::new(DataType::Symbol, ColumnData::Text(v)).unwrap()),
        prop::collection::vec(any::<u128>(), 0..50)
            .prop_map(|v| Vector::new(DataType::Uuid, ColumnData::Wide(v)).unwrap()),
        (0u32..9, prop::collection::vec(-1_000_000_000i32..1_000_000_000, 0..100)).prop_map(
            |(scale, values)| {
                Vector::new(DataType::Decimal32, ColumnData::Decimal32 { scale, values }).unwrap()
            }
        ),
        (0u32..39, prop::collection::vec(prop_oneof![Just(NULL_INT128), any::<i128>()], 0..100))
            .prop_map(|(scale, values)| {
                Vector::new(DataType::Decimal128, ColumnData::Decimal128 { scale, values })
                    .unwrap()
            }),
        prop::collection::vec((any::<i32>(), 0u32..11), 0..100)
            .prop_map(|v| Vector::new(DataType::Duration, ColumnData::Duration(v)).unwrap()),
        prop::collection::vec((-1.0e6..1.0e6f64, -1.0e6..1.0e6f64), 0..100).prop_map(|v| {
            let points = v.into_iter().map(|(x, y)| [x, y]).collect();
            Vector::new(DataType::Point, ColumnData::Double2(points)).unwrap()
        }),
    ]
}

/// Векторы-массивы int и decimal64 с пустыми строками.
fn array_vector_strategy() -> impl Strategy<Value = Vector> {
    prop_oneof![
        prop::collection::vec(prop::collection::vec(any::<i32>(), 0..6), 0..120).prop_map(|rows| {
            let rows: Vec<Vector> = rows
                .into_iter()
                .map(|r| Vector::new(DataType::Int, ColumnData::Int(r)).unwrap())
                .collect();
            Vector::array(DataType::Int, &rows).unwrap()
        }),
        (0u32..19, prop::collection::vec(prop::collection::vec(any::<i64>(), 0..4), 1..40))
            .prop_map(|(scale, rows)| {
                let rows: Vec<Vector> = rows
                    .into_iter()
                    .map(|values| {
                        Vector::new(DataType::Decimal64, ColumnData::Decimal64 { scale, values })
                            .unwrap()
                    })
                    .collect();
                Vector::array(DataType::Decimal64, &rows).unwrap()
            }),
    ]
}

fn encode_with(
    value: &Value,
    order: WireOrder,
    chunk_size: usize,
) -> Vec<u8> {
    let config = CodecConfig {
        chunk_size,
        ..CodecConfig::default()
    };
    let mut buf = Vec::new();
    write_value(&mut buf, value, order, &config).unwrap();
    buf
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: PROPTEST_CASES,
        ..ProptestConfig::default()
    })]

    /// Тест проверяет декодирование закодированного вектора.
    #[test]
    fn prop_vector_roundtrip(vector in vector_strategy(), order in order_strategy()) {
        let value: Value = vector.into();
        let bytes = encode_with(&value, order, 65_536);
        let decoded = read_value(&mut Cursor::new(&bytes), order, &CodecConfig::default()).unwrap();
        prop_assert_eq!(decoded, value);
    }

    /// Тест проверяет, что размер диапазона не меняет байты и результат.
    #[test]
    fn prop_chunk_size_independent(vector in vector_strategy(), chunk in 1usize..64) {
        let value: Value = vector.into();
        let reference = encode_with(&value, WireOrder::Little, 65_536);
        let chunked = encode_with(&value, WireOrder::Little, chunk);
        prop_assert_eq!(&chunked, &reference);

        let config = CodecConfig { chunk_size: chunk, ..CodecConfig::default() };
        let decoded = read_value(&mut Cursor::new(&chunked), WireOrder::Little, &config).unwrap();
        prop_assert_eq!(decoded, value);
    }

    /// Тест проверяет таблицу с общим словарём символов.
    #[test]
    fn prop_table_roundtrip(
        rows in prop::collection::vec(("[A-Z]{1,3}", any::<i32>(), "[a-z]{0,5}"), 0..80),
        order in order_strategy(),
    ) {
        let syms = rows.iter().map(|r| r.0.clone()).collect();
        let qty = rows.iter().map(|r| r.1).collect();
        let venue = rows.iter().map(|r| r.2.clone()).collect();
        let table = Table::new(
            vec!["sym".into(), "qty".into(), "venue".into()],
            vec![
                Vector::new(DataType::Symbol, ColumnData::Text(syms)).unwrap(),
                Vector::new(DataType::Int, ColumnData::Int(qty)).unwrap(),
                Vector::new(DataType::Symbol, ColumnData::Text(venue)).unwrap(),
            ],
        )
        .unwrap();
        let value: Value = table.into();
        let bytes = encode_with(&value, order, 65_536);
        let decoded = read_value(&mut Cursor::new(&bytes), order, &CodecConfig::default()).unwrap();
        prop_assert_eq!(decoded, value);
    }

    /// Тест проверяет, что любой обрезанный поток даёт ошибку, а не панику.
    #[test]
    fn prop_truncated_never_panics(vector in vector_strategy(), cut in 0usize..4096) {
        let value: Value = vector.into();
        let bytes = encode_with(&value, WireOrder::Little, 65_536);
        let cut = cut.min(bytes.len().saturating_sub(1));
        let result = read_value(&mut Cursor::new(&bytes[..cut]), WireOrder::Little, &CodecConfig::default());
        prop_assert!(result.is_err());
    }

    /// Тест проверяет вектор-массив при любом размере блока, в том числе
    /// как колонку таблицы.
    #[test]
    fn prop_array_vector_roundtrip(
        vector in array_vector_strategy(),
        order in order_strategy(),
        chunk in 1usize..300,
    ) {
        let value: Value = vector.clone().into();
        let bytes = encode_with(&value, order, chunk);
        let decoded = read_value(&mut Cursor::new(&bytes), order, &CodecConfig::default()).unwrap();
        prop_assert_eq!(decoded, value);

        let rows = vector.len();
        let ids = Vector::new(DataType::Int, ColumnData::Int((0..rows as i32).collect())).unwrap();
        let table: Value = Table::new(vec!["id".into(), "values".into()], vec![ids, vector])
            .unwrap()
            .into();
        let bytes = encode_with(&table, order, chunk);
        let decoded = read_value(&mut Cursor::new(&bytes), order, &CodecConfig::default()).unwrap();
        prop_assert_eq!(decoded, table);
    }
}

/// Тест проверяет скаляры decimal128, функций, кода, duration, complex и point.
#[rstest]
#[case(create_decimal128(Decimal::new(-314159, 5), 30).unwrap(), "-3.14159")]
#[case(create_function("add"), "add")]
#[case(create_code("def f(x) { return x + 1 }"), "def f(x) { return x + 1 }")]
#[case(create_duration("20ms").unwrap(), "20ms")]
#[case(create_complex(1.0, 2.5), "1.00000+2.50000i")]
#[case(create_point(-1.0, 0.5), "(-1.00000, 0.50000)")]
fn test_extended_scalar_roundtrip(
    #[case] scalar: Scalar,
    #[case] text_prefix: &str,
) {
    assert!(scalar.get_string().unwrap().starts_with(text_prefix));
    let value: Value = scalar.into();
    for order in [WireOrder::Little, WireOrder::Big] {
        let bytes = encode_with(&value, order, 65_536);
        let decoded = read_value(&mut Cursor::new(&bytes), order, &CodecConfig::default()).unwrap();
        assert_eq!(decoded, value);
    }
}

/// Тест проверяет вектор-массив decimal128 и его текстовое представление.
#[test]
fn test_decimal128_array_vector() {
    let rows = [
        Vector::new(DataType::Decimal128, ColumnData::Decimal128 { scale: 2, values: vec![150, -1] })
            .unwrap(),
        Vector::new(DataType::Decimal128, ColumnData::Decimal128 { scale: 2, values: vec![] })
            .unwrap(),
    ];
    let vector = Vector::array(DataType::Decimal128, &rows).unwrap();
    assert_eq!(vector.to_string(), "vector<decimal128[]>([[1.50, -0.01], []])");
    let value: Value = vector.into();
    let bytes = encode_with(&value, WireOrder::Big, 65_536);
    let decoded = read_value(&mut Cursor::new(&bytes), WireOrder::Big, &CodecConfig::default()).unwrap();
    assert_eq!(decoded, value);
}
