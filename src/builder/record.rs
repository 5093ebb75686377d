use dolphindb_error::{bail, ensure, BuildError, DolphinResult};

use super::{table_from_raw_data, RawColumn};
use crate::{model::Table, types::DataType};

/// Описание колонки, которое запись отдаёт построителю таблиц.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    /// Имя типа в нижнем регистре (`"int"`, `"symbol"`, `"ipaddr"`, ...).
    pub type_name: String,
    pub values: RawColumn,
}

/// Запись, которая умеет перечислить свои колонки в объявленном порядке.
///
/// Реализация обычно строится на аннотациях полей вида
/// `column:<name>;type:<typename>`:
///
/// ```ignore
/// impl ColumnSource for Trades {
///     fn columns(&self) -> DolphinResult<Vec<ColumnSpec>> {
///         Ok(vec![
///             ColumnSpec::from_tag("column:sym;type:symbol", self.sym.clone().into())?,
///             ColumnSpec::from_tag("column:price;type:double", self.price.clone().into())?,
///         ])
///     }
/// }
/// ```
pub trait ColumnSource {
    fn columns(&self) -> DolphinResult<Vec<ColumnSpec>>;
}

/// Разобранная аннотация `column:<name>;type:<typename>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTag {
    pub column: String,
    pub type_name: String,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ColumnSpec {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        values: impl Into<RawColumn>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            values: values.into(),
        }
    }

    /// Колонка по аннотации и значениям поля.
    pub fn from_tag(
        tag: &str,
        values: RawColumn,
    ) -> DolphinResult<Self> {
        let tag = parse_tag(tag)?;
        Ok(Self {
            name: tag.column,
            type_name: tag.type_name,
            values,
        })
    }
}

/// Разбирает аннотацию поля.
///
/// Пары `ключ:значение` разделены `;`, пробелы вокруг обрезаются, пары без
/// `:` и неизвестные ключи пропускаются. Ключи `column` и `type`
/// обязательны.
pub fn parse_tag(tag: &str) -> DolphinResult<ColumnTag> {
    let mut column = None;
    let mut type_name = None;
    for part in tag.split(';') {
        let Some((key, value)) = part.split_once(':') else {
            continue;
        };
        match key.trim() {
            "column" => column = Some(value.trim().to_string()),
            "type" => type_name = Some(value.trim().to_string()),
            _ => {}
        }
    }
    let (Some(column), Some(type_name)) = (column, type_name) else {
        bail!(BuildError::InvalidTag {
            tag: tag.to_string()
        });
    };
    ensure!(
        !column.is_empty(),
        BuildError::InvalidTag {
            tag: tag.to_string()
        }
    );
    Ok(ColumnTag { column, type_name })
}

/// Строит таблицу по колонкам записи.
///
/// Отсутствующая запись даёт `Input should not be nil`, неизвестное имя
/// типа даёт `Invalid type <typename>`.
pub fn table_from_record<R>(record: Option<&R>) -> DolphinResult<Table>
where
    R: ColumnSource + ?Sized,
{
    let Some(record) = record else {
        bail!(BuildError::NilInput);
    };
    let specs = record.columns()?;

    let mut names = Vec::with_capacity(specs.len());
    let mut types = Vec::with_capacity(specs.len());
    let mut columns = Vec::with_capacity(specs.len());
    for spec in specs {
        let data_type = DataType::from_name(&spec.type_name);
        let Some(data_type) = data_type.filter(|t| t.is_supported() && *t != DataType::Any) else {
            bail!(BuildError::InvalidType {
                name: spec.type_name
            });
        };
        names.push(spec.name);
        types.push(data_type);
        columns.push(spec.values);
    }
    table_from_raw_data(&names, &types, columns)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use dolphindb_error::StatusCode;
    use rstest::rstest;

    use super::*;

    struct Trades {
        sym: Vec<String>,
        price: Vec<f64>,
        qty: Vec<Option<i32>>,
    }

    impl ColumnSource for Trades {
        fn columns(&self) -> DolphinResult<Vec<ColumnSpec>> {
            Ok(vec![
                ColumnSpec::from_tag("column:sym;type:symbol", self.sym.clone().into())?,
                ColumnSpec::from_tag(" column : price ; type : double ", self.price.clone().into())?,
                ColumnSpec::new("qty", "int", self.qty.clone()),
            ])
        }
    }

    struct Broken;

    impl ColumnSource for Broken {
        fn columns(&self) -> DolphinResult<Vec<ColumnSpec>> {
            Ok(vec![ColumnSpec::new("v", "varchar", vec![1i32])])
        }
    }

    /// Тест проверяет разбор аннотаций.
    #[rstest]
    #[case("column:sym;type:symbol", "sym", "symbol")]
    #[case(" column : a ; type : int ;", "a", "int")]
    #[case("type:date;column:day;comment", "day", "date")]
    fn test_parse_tag(
        #[case] tag: &str,
        #[case] column: &str,
        #[case] type_name: &str,
    ) {
        let parsed = parse_tag(tag).unwrap();
        assert_eq!(parsed.column, column);
        assert_eq!(parsed.type_name, type_name);
    }

    /// Тест проверяет отказ для неполной аннотации.
    #[rstest]
    #[case("")]
    #[case("column:sym")]
    #[case("type:int")]
    #[case("column:;type:int")]
    fn test_parse_tag_incomplete(#[case] tag: &str) {
        let err = parse_tag(tag).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidArgs);
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidTag { tag: t }) if t == tag
        ));
    }

    /// Тест проверяет построение таблицы по записи.
    #[test]
    fn test_table_from_record() {
        let trades = Trades {
            sym: vec!["IBM".into(), "MS".into()],
            price: vec![170.5, 56.2],
            qty: vec![Some(100), None],
        };
        let table = table_from_record(Some(&trades)).unwrap();
        assert_eq!(table.column_names(), &["sym", "price", "qty"]);
        assert_eq!(table.rows(), 2);
        assert_eq!(
            table.get_column_by_name("sym").unwrap().data_type(),
            DataType::Symbol
        );
        assert!(table.get_column(2).unwrap().is_null(1).unwrap());
    }

    /// Тест проверяет сообщения для пустой записи и неизвестного типа.
    #[test]
    fn test_record_errors() {
        let err = table_from_record::<Trades>(None).unwrap_err();
        assert_eq!(err.to_string(), "Input should not be nil");

        let err = table_from_record(Some(&Broken)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid type varchar");

        let dynamic: &dyn ColumnSource = &Broken;
        assert!(table_from_record(Some(dynamic)).is_err());
    }
}
