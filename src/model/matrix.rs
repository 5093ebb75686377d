use std::fmt;

use dolphindb_error::{DolphinResult, ModelError};

use super::{Value, Vector};
use crate::types::DataType;

/// Матрица: данные по столбцам и необязательные метки строк и столбцов.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vector,
    rows: usize,
    cols: usize,
    row_labels: Option<Vector>,
    col_labels: Option<Vector>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Matrix {
    /// Создаёт матрицу из данных, уложенных по столбцам.
    pub fn new(
        data: Vector,
        rows: usize,
        cols: usize,
    ) -> DolphinResult<Self> {
        if data.is_array_vector() {
            return Err(ModelError::WrongForm {
                expected: "vector".to_string(),
                actual: "array vector".to_string(),
            }
            .into());
        }
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(ModelError::ShapeMismatch {
                reason: format!("{rows}x{cols} matrix needs {} elements, got {}", rows.saturating_mul(cols), data.len()),
            }
            .into());
        }
        Ok(Self {
            data,
            rows,
            cols,
            row_labels: None,
            col_labels: None,
        })
    }

    /// Добавляет метки; их длина должна совпадать с числом строк и
    /// столбцов соответственно.
    pub fn with_labels(
        mut self,
        row_labels: Option<Vector>,
        col_labels: Option<Vector>,
    ) -> DolphinResult<Self> {
        check_labels("row", row_labels.as_ref(), self.rows)?;
        check_labels("column", col_labels.as_ref(), self.cols)?;
        self.row_labels = row_labels;
        self.col_labels = col_labels;
        Ok(self)
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &Vector {
        &self.data
    }

    pub fn row_labels(&self) -> Option<&Vector> {
        self.row_labels.as_ref()
    }

    pub fn column_labels(&self) -> Option<&Vector> {
        self.col_labels.as_ref()
    }

    pub fn get(
        &self,
        row: usize,
        col: usize,
    ) -> DolphinResult<Value> {
        if row >= self.rows {
            return Err(ModelError::IndexOutOfBounds {
                index: row,
                len: self.rows,
            }
            .into());
        }
        if col >= self.cols {
            return Err(ModelError::IndexOutOfBounds {
                index: col,
                len: self.cols,
            }
            .into());
        }
        self.data.get(col * self.rows + row)
    }

    /// Столбец матрицы как отдельный вектор.
    pub fn get_column(
        &self,
        col: usize,
    ) -> DolphinResult<Vector> {
        if col >= self.cols {
            return Err(ModelError::IndexOutOfBounds {
                index: col,
                len: self.cols,
            }
            .into());
        }
        let indices: Vec<usize> = (col * self.rows..(col + 1) * self.rows).collect();
        self.data.sub_vector(&indices)
    }
}

impl fmt::Display for Matrix {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(
            f,
            "matrix<{}>[{}r][{}c]({{",
            self.data_type(),
            self.rows,
            self.cols
        )?;
        for (name, labels) in [("rows", &self.row_labels), ("cols", &self.col_labels)] {
            match labels {
                Some(v) => writeln!(f, "  {name}: [{}],", v.format_elements().join(", "))?,
                None => writeln!(f, "  {name}: null,")?,
            }
        }
        writeln!(f, "  data: {}Array({}) [", self.data_type(), self.data.len())?;
        for item in self.data.format_elements() {
            writeln!(f, "    {item},")?;
        }
        writeln!(f, "  ]")?;
        write!(f, "}})")
    }
}

fn check_labels(
    what: &str,
    labels: Option<&Vector>,
    expected: usize,
) -> DolphinResult<()> {
    match labels {
        Some(v) if v.len() != expected => Err(ModelError::ShapeMismatch {
            reason: format!("{what} labels have {} entries, expected {expected}", v.len()),
        }
        .into()),
        _ => Ok(()),
    }
}
