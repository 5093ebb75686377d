use std::fmt;

use ahash::AHashMap;
use dolphindb_error::{DolphinResult, ModelError};

use super::Vector;

/// Таблица: именованные колонки одинаковой длины.
///
/// Имена колонок уникальны и сравниваются с учётом регистра.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    names: Vec<String>,
    columns: Vec<Vector>,
    index: AHashMap<String, usize>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Table {
    /// Создаёт таблицу, проверяя число имён, уникальность и длины колонок.
    pub fn new(
        names: Vec<String>,
        columns: Vec<Vector>,
    ) -> DolphinResult<Self> {
        if names.len() != columns.len() {
            return Err(ModelError::ShapeMismatch {
                reason: format!(
                    "table has {} column names and {} columns",
                    names.len(),
                    columns.len()
                ),
            }
            .into());
        }
        let rows = columns.first().map(Vector::len).unwrap_or(0);
        let mut index = AHashMap::with_capacity(names.len());
        for (i, (name, column)) in names.iter().zip(&columns).enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(ModelError::DuplicateColumn { name: name.clone() }.into());
            }
            if column.len() != rows {
                return Err(ModelError::ShapeMismatch {
                    reason: format!("column {name} has {} rows, expected {rows}", column.len()),
                }
                .into());
            }
        }
        Ok(Self {
            name: String::new(),
            names,
            columns,
            index,
        })
    }

    /// Задаёт имя таблицы, передаваемое на провод.
    pub fn with_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map(Vector::len).unwrap_or(0)
    }

    pub fn columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column_vectors(&self) -> &[Vector] {
        &self.columns
    }

    pub fn get_column(
        &self,
        index: usize,
    ) -> DolphinResult<&Vector> {
        self.columns.get(index).ok_or_else(|| {
            ModelError::IndexOutOfBounds {
                index,
                len: self.columns.len(),
            }
            .into()
        })
    }

    pub fn get_column_by_name(
        &self,
        name: &str,
    ) -> DolphinResult<&Vector> {
        self.get_column(self.get_column_index(name)?)
    }

    pub fn get_column_index(
        &self,
        name: &str,
    ) -> DolphinResult<usize> {
        self.index.get(name).copied().ok_or_else(|| {
            ModelError::ColumnNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    pub fn get_column_name(
        &self,
        index: usize,
    ) -> DolphinResult<&str> {
        self.names.get(index).map(String::as_str).ok_or_else(|| {
            ModelError::IndexOutOfBounds {
                index,
                len: self.names.len(),
            }
            .into()
        })
    }

    /// Переименовывает колонку; имя другой колонки использовать нельзя.
    pub fn set_column_name(
        &mut self,
        index: usize,
        name: impl Into<String>,
    ) -> DolphinResult<()> {
        let name = name.into();
        let old = self.get_column_name(index)?.to_string();
        if old == name {
            return Ok(());
        }
        if self.index.contains_key(&name) {
            return Err(ModelError::DuplicateColumn { name }.into());
        }
        self.index.remove(&old);
        self.index.insert(name.clone(), index);
        self.names[index] = name;
        Ok(())
    }

    /// Есть ли колонка с таким именем.
    pub fn contain(
        &self,
        name: &str,
    ) -> bool {
        self.index.contains_key(name)
    }

    pub fn into_columns(self) -> (Vec<String>, Vec<Vector>) {
        (self.names, self.columns)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для Table
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for Table {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "table[{}r][{}c]([", self.rows(), self.columns())?;
        for (name, column) in self.names.iter().zip(&self.columns) {
            writeln!(
                f,
                "\t  {}[{}]('{}', [{}])",
                column.data_type(),
                column.len(),
                name,
                column.format_elements().join(", ")
            )?;
        }
        write!(f, "\t])")
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
