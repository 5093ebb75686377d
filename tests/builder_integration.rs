use chrono::{NaiveDate, NaiveDateTime};
use dolphindb::{
    decode, encode, table_from_raw_data, table_from_record, ColumnSource, ColumnSpec, DataType,
    DolphinResult, RawColumn, StatusCode, Value, WireOrder,
};
use rust_decimal::Decimal;

struct Quotes {
    sym: Vec<String>,
    ts: Vec<NaiveDateTime>,
    bid: Vec<Decimal>,
    venue: Vec<Option<String>>,
}

impl ColumnSource for Quotes {
    fn columns(&self) -> DolphinResult<Vec<ColumnSpec>> {
        Ok(vec![
            ColumnSpec::from_tag("column:sym;type:symbol", self.sym.clone().into())?,
            ColumnSpec::from_tag("column:ts; type:timestamp", self.ts.clone().into())?,
            ColumnSpec::new("bid", "decimal64", RawColumn::decimal(4, self.bid.clone())),
            ColumnSpec::from_tag("type:string;column:venue", self.venue.clone().into())?,
        ])
    }
}

fn quotes() -> Quotes {
    let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    Quotes {
        sym: vec!["AAPL".into(), "MSFT".into(), "AAPL".into()],
        ts: vec![
            day.and_hms_milli_opt(9, 30, 0, 0).unwrap(),
            day.and_hms_milli_opt(9, 30, 0, 125).unwrap(),
            day.and_hms_milli_opt(16, 0, 0, 999).unwrap(),
        ],
        bid: vec![
            Decimal::new(1715025, 4),
            Decimal::new(4201, 1),
            Decimal::new(171, 0),
        ],
        venue: vec![Some("XNAS".into()), None, Some("ARCX".into())],
    }
}

/// Тест проверяет построение таблицы по записи и её передачу через кодек.
#[test]
fn record_table_survives_codec() {
    let table = table_from_record(Some(&quotes())).unwrap();
    assert_eq!(table.column_names(), &["sym", "ts", "bid", "venue"]);
    assert_eq!(table.rows(), 3);

    let types: Vec<DataType> = table
        .column_vectors()
        .iter()
        .map(|c| c.data_type())
        .collect();
    assert_eq!(
        types,
        vec![
            DataType::Symbol,
            DataType::Timestamp,
            DataType::Decimal64,
            DataType::String
        ]
    );
    assert!(table.get_column(3).unwrap().is_null(1).unwrap());

    let value: Value = table.into();
    for order in [WireOrder::Little, WireOrder::Big] {
        let bytes = encode(&value, order).unwrap();
        assert_eq!(decode(&bytes, order).unwrap(), value);
    }
}

/// Тест проверяет, что записи и сырые колонки дают одинаковые таблицы.
#[test]
fn record_matches_raw_data() {
    let q = quotes();
    let raw = table_from_raw_data(
        &["sym", "ts", "bid", "venue"],
        &[
            DataType::Symbol,
            DataType::Timestamp,
            DataType::Decimal64,
            DataType::String,
        ],
        vec![
            q.sym.clone().into(),
            q.ts.clone().into(),
            RawColumn::decimal(4, q.bid.clone()),
            q.venue.clone().into(),
        ],
    )
    .unwrap();
    assert_eq!(table_from_record(Some(&q)).unwrap(), raw);
}

/// Тест проверяет ошибки построения: формы, типы и длины.
#[test]
fn builder_errors() {
    let err = table_from_raw_data(&["a", "b"], &[DataType::Int], vec![RawColumn::from(vec![1])])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "The length of colNames, colTypes and colValues should be equal."
    );

    let err = table_from_raw_data(
        &["a"],
        &[DataType::Double],
        vec![RawColumn::from(vec!["x"])],
    )
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::TypeError);

    let err = table_from_raw_data(
        &["a", "b"],
        &[DataType::Int, DataType::Int],
        vec![RawColumn::from(vec![1, 2]), RawColumn::from(vec![1])],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "column b has 1 rows, expected 2");
}
