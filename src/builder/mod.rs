//! Построение таблиц из сырых колонок и из записей.

pub mod raw;
pub mod record;

use dolphindb_error::{BuildError, DolphinResult};

// Публичный экспорт сырых колонок и контракта записей, чтобы упростить
// доступ к ним из внешнего кода.
pub use raw::*;
pub use record::*;

use crate::{
    model::{Table, Vector},
    types::DataType,
};

/// Строит таблицу из имён, типов и сырых значений колонок.
///
/// Длины трёх списков должны совпадать. Число строк задаёт первая
/// колонка; колонка другой длины и повтор имени дают ошибку.
pub fn table_from_raw_data<S: AsRef<str>>(
    names: &[S],
    types: &[DataType],
    columns: Vec<RawColumn>,
) -> DolphinResult<Table> {
    if names.len() != types.len() || names.len() != columns.len() {
        return Err(BuildError::LengthMismatch.into());
    }
    let rows = columns.first().map(RawColumn::len).unwrap_or(0);
    let mut vectors: Vec<Vector> = Vec::with_capacity(columns.len());
    for ((name, data_type), column) in names.iter().zip(types).zip(columns) {
        if column.len() != rows {
            return Err(BuildError::RowCountMismatch {
                name: name.as_ref().to_string(),
                expected: rows,
                actual: column.len(),
            }
            .into());
        }
        vectors.push(column.into_vector(*data_type)?);
    }
    let names = names.iter().map(|n| n.as_ref().to_string()).collect();
    Table::new(names, vectors)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use dolphindb_error::StatusCode;

    use super::*;

    /// Тест проверяет точное сообщение о разной длине входных списков.
    #[test]
    fn test_length_mismatch_message() {
        let err = table_from_raw_data(
            &["a", "b"],
            &[DataType::Int],
            vec![vec![1i32].into(), vec![2i32].into()],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The length of colNames, colTypes and colValues should be equal."
        );
    }

    /// Тест проверяет построение таблицы sym/price.
    #[test]
    fn test_raw_table() {
        let table = table_from_raw_data(
            &["sym", "price"],
            &[DataType::Symbol, DataType::Double],
            vec![
                vec!["IBM", "MS", "ORCL"].into(),
                vec![170.5, 56.2, 49.5].into(),
            ],
        )
        .unwrap();
        assert_eq!(table.rows(), 3);
        assert_eq!(table.columns(), 2);
        assert_eq!(
            table.get_column(1).unwrap().get(2).unwrap().get_double().unwrap(),
            49.5
        );
    }

    /// Тест проверяет отказ для колонок разной длины и повтора имён.
    #[test]
    fn test_row_count_and_duplicates() {
        let err = table_from_raw_data(
            &["a", "b"],
            &[DataType::Int, DataType::Int],
            vec![vec![1i32, 2].into(), vec![3i32].into()],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "column b has 1 rows, expected 2");

        let err = table_from_raw_data(
            &["a", "a"],
            &[DataType::Int, DataType::Int],
            vec![vec![1i32].into(), vec![2i32].into()],
        )
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::AlreadyExists);
    }

    /// Тест проверяет пустую таблицу без колонок.
    #[test]
    fn test_empty_table() {
        let table = table_from_raw_data::<&str>(&[], &[], Vec::new()).unwrap();
        assert_eq!(table.rows(), 0);
        assert_eq!(table.columns(), 0);
    }
}
