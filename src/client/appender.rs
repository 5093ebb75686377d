use dolphindb_error::{bail, ensure, ClientError, CodecError, DolphinResult, ModelError};
use tracing::debug;

use super::DolphinClient;
use crate::{
    model::{ColumnData, Table, Value, Vector},
    types::{raw_from_datetime, to_datetime, DataType, Storage, NULL_INT, NULL_LONG},
};

/// Дописывает таблицы в серверную таблицу через `tableInsert`.
///
/// Схема цели (`schema(...)`) читается один раз при создании. Перед
/// отправкой колонки получают имена из схемы, а временные колонки другого
/// временного типа приводятся к типу колонки цели.
pub struct TableAppender<'a> {
    client: &'a mut DolphinClient,
    /// `name` или `loadTable("<db>","<name>")`
    target: String,
    names: Vec<String>,
    types: Vec<DataType>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<'a> TableAppender<'a> {
    /// Читает схему таблицы `table_name`; с `db_path` таблица берётся
    /// через `loadTable`.
    pub async fn new(
        client: &'a mut DolphinClient,
        db_path: Option<&str>,
        table_name: &str,
    ) -> DolphinResult<Self> {
        let target = match db_path {
            Some(db) if !db.is_empty() => format!("loadTable(\"{db}\",\"{table_name}\")"),
            _ => table_name.to_string(),
        };
        let script = format!("schema({target})");
        let Some(info) = client.run_script(&script).await? else {
            bail!(ClientError::Protocol {
                reason: format!("{script} returned no value")
            });
        };
        let (names, types) = parse_schema(info)?;
        debug!("Appender for {target}: {} columns", names.len());
        Ok(Self {
            client,
            target,
            names,
            types,
        })
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column_types(&self) -> &[DataType] {
        &self.types
    }

    /// Дописывает строки `table` и возвращает число вставленных строк,
    /// которое сообщил сервер.
    pub async fn append(
        &mut self,
        table: &Table,
    ) -> DolphinResult<usize> {
        let prepared = self.prepare(table)?;
        let rows = prepared.rows();
        let function = format!("tableInsert{{{}}}", self.target);
        let result = self
            .client
            .run_function(&function, vec![Value::from(prepared)])
            .await?;
        match result {
            Some(value) => Ok(value.get_long()?.max(0) as usize),
            None => Ok(rows),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Внутренние методы и функции
////////////////////////////////////////////////////////////////////////////////

impl TableAppender<'_> {
    fn prepare(
        &self,
        table: &Table,
    ) -> DolphinResult<Table> {
        ensure!(
            table.columns() == self.names.len(),
            ModelError::ShapeMismatch {
                reason: format!(
                    "table has {} columns, {} expects {}",
                    table.columns(),
                    self.target,
                    self.names.len()
                ),
            }
        );
        let mut columns = Vec::with_capacity(self.names.len());
        for (i, &target) in self.types.iter().enumerate() {
            let column = table.get_column(i)?;
            let source = column.data_type();
            if source != target
                && source.is_temporal()
                && target.is_temporal()
                && !column.is_array_vector()
            {
                debug!("Casting column {} from {source} to {target}", self.names[i]);
                columns.push(cast_temporal(column, target)?);
            } else {
                columns.push(column.clone());
            }
        }
        Table::new(self.names.clone(), columns)
    }
}

/// Имена и типы колонок из словаря `schema(...)`: таблица `colDefs` с
/// колонками `name` и `typeInt`. Для векторов-массивов берётся тип
/// элемента.
fn parse_schema(info: Value) -> DolphinResult<(Vec<String>, Vec<DataType>)> {
    let defs = info.into_dictionary()?.get_str("colDefs")?.into_table()?;
    let name_column = defs.get_column_by_name("name")?;
    let type_column = defs.get_column_by_name("typeInt")?;

    let mut names = Vec::with_capacity(defs.rows());
    let mut types = Vec::with_capacity(defs.rows());
    for i in 0..defs.rows() {
        names.push(name_column.get_scalar(i)?.get_string()?);
        let id = type_column.get_scalar(i)?.get_int()?;
        let element = if (64..128).contains(&id) { id - 64 } else { id };
        let data_type = u8::try_from(element)
            .ok()
            .and_then(|b| DataType::try_from(b).ok());
        let Some(data_type) = data_type else {
            bail!(CodecError::UnknownDataType(element.clamp(0, 255) as u8));
        };
        types.push(data_type);
    }
    Ok((names, types))
}

/// Приводит временную колонку к другому временному типу через момент
/// времени. Null и значения вне диапазона цели становятся null.
fn cast_temporal(
    column: &Vector,
    target: DataType,
) -> DolphinResult<Vector> {
    let source = column.data_type();
    let raws: Vec<Option<i64>> = match column.data() {
        ColumnData::Int(v) => v
            .iter()
            .map(|&r| (r != NULL_INT).then_some(i64::from(r)))
            .collect(),
        ColumnData::Long(v) => v.iter().map(|&r| (r != NULL_LONG).then_some(r)).collect(),
        _ => bail!(ModelError::TypeMismatch {
            from: source.to_string(),
            to: target.to_string(),
        }),
    };
    let converted = raws.into_iter().map(|raw| {
        raw.and_then(|r| to_datetime(source, r))
            .and_then(|v| raw_from_datetime(target, v))
    });
    let data = match target.storage() {
        Some(Storage::Int) => {
            ColumnData::Int(converted.map(|r| r.map_or(NULL_INT, |r| r as i32)).collect())
        }
        Some(Storage::Long) => ColumnData::Long(converted.map(|r| r.unwrap_or(NULL_LONG)).collect()),
        _ => bail!(ModelError::TypeMismatch {
            from: source.to_string(),
            to: target.to_string(),
        }),
    };
    Vector::new(target, data)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
