use std::fmt;

use dolphindb_error::{DolphinResult, ModelError};

use super::{scalar::render_cell, Cell, ColumnData, Scalar, Value};
use crate::types::DataType;

/// Вектор элементов одного типа.
///
/// Элементы вектора типа `any` сами являются значениями любой формы.
/// Вектор-массив хранит строки подряд в `data`, а `offsets` содержит
/// конец каждой строки.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    data_type: DataType,
    data: ColumnData,
    offsets: Option<Vec<usize>>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Vector {
    /// Создаёт вектор, проверяя соответствие хранилища типу.
    pub fn new(
        data_type: DataType,
        data: ColumnData,
    ) -> DolphinResult<Self> {
        let storage = data_type.storage().ok_or_else(|| ModelError::TypeMismatch {
            from: data_type.to_string(),
            to: "vector".to_string(),
        })?;
        if storage != data.storage() {
            return Err(ModelError::TypeMismatch {
                from: format!("{:?}", data.storage()).to_lowercase(),
                to: data_type.to_string(),
            }
            .into());
        }
        if let Some(scale) = data.scale() {
            data_type.check_scale(scale)?;
        }
        Ok(Self {
            data_type,
            data,
            offsets: None,
        })
    }

    /// Вектор-массив из плоских элементов и концов строк.
    ///
    /// Концы должны не убывать и последний должен совпадать с числом
    /// элементов.
    pub fn from_parts(
        data_type: DataType,
        data: ColumnData,
        offsets: Vec<usize>,
    ) -> DolphinResult<Self> {
        if !data_type.supports_array() {
            return Err(ModelError::TypeMismatch {
                from: data_type.to_string(),
                to: "array vector".to_string(),
            }
            .into());
        }
        let monotonic = offsets.windows(2).all(|w| w[0] <= w[1]);
        if !monotonic || offsets.last().copied().unwrap_or(0) != data.len() {
            return Err(ModelError::ShapeMismatch {
                reason: format!(
                    "array vector offsets do not cover {} elements",
                    data.len()
                ),
            }
            .into());
        }
        let mut v = Self::new(data_type, data)?;
        v.offsets = Some(offsets);
        Ok(v)
    }

    /// Вектор-массив из строк-векторов одного типа.
    pub fn array(
        data_type: DataType,
        rows: &[Vector],
    ) -> DolphinResult<Self> {
        let scale = rows.iter().find_map(Vector::scale).unwrap_or(0);
        let mut v = Self::from_parts(data_type, Self::nulls(data_type, scale, 0)?.data, Vec::new())?;
        for row in rows {
            v.append(&Value::Vector(row.clone()))?;
        }
        Ok(v)
    }

    /// Пустой вектор типа; для decimal используйте [`Vector::nulls`] с
    /// нужным масштабом.
    pub fn empty(data_type: DataType) -> DolphinResult<Self> {
        Self::nulls(data_type, 0, 0)
    }

    /// Вектор из `len` null-слотов.
    pub fn nulls(
        data_type: DataType,
        scale: u32,
        len: usize,
    ) -> DolphinResult<Self> {
        let storage = data_type.storage().ok_or_else(|| ModelError::TypeMismatch {
            from: data_type.to_string(),
            to: "vector".to_string(),
        })?;
        Self::new(data_type, ColumnData::nulls(storage, scale, len))
    }

    /// Собирает вектор из скаляров одного типа.
    pub fn from_scalars(
        data_type: DataType,
        items: &[Scalar],
    ) -> DolphinResult<Self> {
        let scale = items.first().and_then(|s| s.cell().scale()).unwrap_or(0);
        let mut v = Self::nulls(data_type, scale, 0)?;
        for item in items {
            v.append(&Value::Scalar(item.clone()))?;
        }
        Ok(v)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn into_data(self) -> ColumnData {
        self.data
    }

    pub fn size(&self) -> usize {
        self.len()
    }

    /// Число элементов; для вектора-массива число строк.
    pub fn len(&self) -> usize {
        match &self.offsets {
            Some(offsets) => offsets.len(),
            None => self.data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_array_vector(&self) -> bool {
        self.offsets.is_some()
    }

    /// Концы строк вектора-массива.
    pub fn offsets(&self) -> Option<&[usize]> {
        self.offsets.as_deref()
    }

    /// Строка вектора-массива как обычный вектор.
    pub fn row(
        &self,
        index: usize,
    ) -> DolphinResult<Vector> {
        let (start, end) = self.row_bounds(index)?;
        Self::new(self.data_type, self.data.slice(start, end)?)
    }

    pub fn scale(&self) -> Option<u32> {
        self.data.scale()
    }

    /// Элемент по индексу: скаляр для типизированных векторов и вложенное
    /// значение для `any`.
    pub fn get(
        &self,
        index: usize,
    ) -> DolphinResult<Value> {
        if self.is_array_vector() {
            return Ok(Value::Vector(self.row(index)?));
        }
        if let Some(v) = self.data.value_at(index) {
            return Ok(v.clone());
        }
        Ok(Value::Scalar(self.get_scalar(index)?))
    }

    /// Скалярный элемент по индексу.
    pub fn get_scalar(
        &self,
        index: usize,
    ) -> DolphinResult<Scalar> {
        if self.data_type == DataType::Any || self.is_array_vector() {
            return Err(ModelError::WrongForm {
                expected: "scalar".to_string(),
                actual: self.element_name(),
            }
            .into());
        }
        let cell = self.cell_at(index)?;
        Scalar::new(self.data_type, cell)
    }

    pub fn is_null(
        &self,
        index: usize,
    ) -> DolphinResult<bool> {
        if self.is_array_vector() {
            let (start, end) = self.row_bounds(index)?;
            return Ok(start == end);
        }
        if let Some(v) = self.data.value_at(index) {
            return Ok(v.is_null());
        }
        Ok(self.cell_at(index)?.is_null())
    }

    /// Добавляет элемент в конец.
    ///
    /// Скаляр должен совпадать по типу (string и symbol взаимозаменяемы);
    /// вектор `any` принимает значение любой формы, вектор-массив
    /// принимает обычный вектор своего типа как новую строку.
    pub fn append(
        &mut self,
        value: &Value,
    ) -> DolphinResult<()> {
        if self.is_array_vector() {
            return self.append_row(value);
        }
        if self.data_type == DataType::Any {
            self.data.push_value(value.clone())?;
            return Ok(());
        }
        let scalar = value.to_scalar()?;
        if !compatible(self.data_type, scalar.data_type()) {
            return Err(ModelError::TypeMismatch {
                from: scalar.data_type().to_string(),
                to: self.data_type.to_string(),
            }
            .into());
        }
        if self.data.is_empty() && self.data.scale().is_some() {
            if let Some(scale) = scalar.cell().scale() {
                self.data = ColumnData::with_capacity(self.data.storage(), scale, 1);
            }
        }
        self.data.push(scalar.cell().clone())?;
        Ok(())
    }

    /// Новый вектор из элементов с указанными индексами.
    pub fn sub_vector(
        &self,
        indices: &[usize],
    ) -> DolphinResult<Vector> {
        if !self.is_array_vector() {
            return Ok(Self {
                data_type: self.data_type,
                data: self.data.select(indices)?,
                offsets: None,
            });
        }
        let mut flat = Vec::new();
        let mut ends = Vec::with_capacity(indices.len());
        for &i in indices {
            let (start, end) = self.row_bounds(i)?;
            flat.extend(start..end);
            ends.push(flat.len());
        }
        Ok(Self {
            data_type: self.data_type,
            data: self.data.select(&flat)?,
            offsets: Some(ends),
        })
    }

    /// Текст каждого элемента, как он выводится внутри контейнеров.
    pub fn format_elements(&self) -> Vec<String> {
        if self.is_array_vector() {
            return (0..self.len())
                .map(|i| match self.row(i) {
                    Ok(row) => format!("[{}]", row.format_elements().join(", ")),
                    Err(_) => String::new(),
                })
                .collect();
        }
        (0..self.len())
            .map(|i| match self.data.value_at(i) {
                Some(v) => v.to_string(),
                None => self
                    .data
                    .cell(i)
                    .map(|c| render_cell(self.data_type, &c))
                    .unwrap_or_default(),
            })
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для Vector
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for Vector {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let suffix = if self.is_array_vector() { "[]" } else { "" };
        write!(
            f,
            "vector<{}{suffix}>([{}])",
            self.data_type,
            self.format_elements().join(", ")
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Внутренние методы и функции
////////////////////////////////////////////////////////////////////////////////

impl Vector {
    fn element_name(&self) -> String {
        if self.is_array_vector() {
            format!("{}[]", self.data_type)
        } else {
            self.data_type.to_string()
        }
    }

    fn row_bounds(
        &self,
        index: usize,
    ) -> DolphinResult<(usize, usize)> {
        let offsets = self.offsets.as_deref().unwrap_or_default();
        let end = *offsets.get(index).ok_or(ModelError::IndexOutOfBounds {
            index,
            len: offsets.len(),
        })?;
        let start = if index == 0 { 0 } else { offsets[index - 1] };
        Ok((start, end))
    }

    fn append_row(
        &mut self,
        value: &Value,
    ) -> DolphinResult<()> {
        let row = match value {
            Value::Vector(row) if !row.is_array_vector() => row,
            Value::Scalar(s) => {
                let row = Self::from_scalars(s.data_type(), std::slice::from_ref(s))?;
                return self.append_row(&Value::Vector(row));
            }
            other => {
                return Err(ModelError::WrongForm {
                    expected: "vector".to_string(),
                    actual: other.form().to_string(),
                }
                .into())
            }
        };
        if row.data_type != self.data_type {
            return Err(ModelError::TypeMismatch {
                from: row.data_type.to_string(),
                to: self.element_name(),
            }
            .into());
        }
        if self.data.is_empty() && self.data.scale().is_some() {
            if let Some(scale) = row.scale() {
                self.data = ColumnData::with_capacity(self.data.storage(), scale, row.len());
            }
        }
        self.data.extend_from(&row.data)?;
        let end = self.data.len();
        if let Some(offsets) = &mut self.offsets {
            offsets.push(end);
        }
        Ok(())
    }

    fn cell_at(
        &self,
        index: usize,
    ) -> DolphinResult<Cell> {
        self.data.cell(index).ok_or_else(|| {
            ModelError::IndexOutOfBounds {
                index,
                len: self.len(),
            }
            .into()
        })
    }
}

/// Допустим ли элемент типа `item` в контейнере типа `target`.
pub(crate) fn compatible(
    target: DataType,
    item: DataType,
) -> bool {
    let text = |t: DataType| matches!(t, DataType::String | DataType::Symbol);
    target == item || (text(target) && text(item))
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use dolphindb_error::StatusCode;

    use super::*;
    use crate::model::{create_decimal32, create_int, create_string, create_symbol};

    fn ints(values: &[i32]) -> Vector {
        Vector::new(DataType::Int, ColumnData::Int(values.to_vec())).unwrap()
    }

    /// Тест проверяет доступ по индексу и ошибку выхода за границы.
    #[test]
    fn test_get_and_bounds() {
        let v = ints(&[1, 2, 3]);
        assert_eq!(v.get(1).unwrap().get_int().unwrap(), 2);
        let err = v.get(3).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::IndexOutOfBounds);
        assert_eq!(v.to_string(), "vector<int>([1, 2, 3])");
    }

    /// Тест проверяет добавление элементов и отказ для чужого типа.
    #[test]
    fn test_append() {
        let mut v = ints(&[1]);
        v.append(&create_int(5).into()).unwrap();
        assert_eq!(v.len(), 2);
        assert!(v.append(&create_string("x").into()).is_err());

        let mut s = Vector::empty(DataType::Symbol).unwrap();
        s.append(&create_string("a").into()).unwrap();
        s.append(&create_symbol("b").into()).unwrap();
        assert_eq!(s.to_string(), "vector<symbol>([a, b])");
    }

    /// Тест проверяет, что первый decimal задаёт масштаб пустого вектора.
    #[test]
    fn test_append_decimal_takes_scale() {
        let mut v = Vector::empty(DataType::Decimal32).unwrap();
        let d = create_decimal32(rust_decimal::Decimal::new(125, 2), 2).unwrap();
        v.append(&d.clone().into()).unwrap();
        assert_eq!(v.scale(), Some(2));
        assert_eq!(v.get_scalar(0).unwrap(), d);
    }

    /// Тест проверяет вектор any с вложенными значениями.
    #[test]
    fn test_any_vector() {
        let mut v = Vector::empty(DataType::Any).unwrap();
        v.append(&create_int(1).into()).unwrap();
        v.append(&Value::Vector(ints(&[2, 3]))).unwrap();
        assert!(v.get(1).unwrap().is_vector());
        assert!(v.get_scalar(0).is_err());
        assert_eq!(v.to_string(), "vector<any>([int(1), vector<int>([2, 3])])");
    }

    /// Тест проверяет выборку подвектора и null-слоты void-вектора.
    #[test]
    fn test_sub_vector_and_void() {
        let v = ints(&[10, 20, 30]);
        assert_eq!(v.sub_vector(&[2, 0]).unwrap(), ints(&[30, 10]));

        let void = Vector::nulls(DataType::Void, 0, 3).unwrap();
        assert!(void.is_null(2).unwrap());
        assert_eq!(void.to_string(), "vector<void>([, , ])");
    }

    /// Тест проверяет вектор-массив: строки, выборку, добавление и текст.
    #[test]
    fn test_array_vector() {
        let mut v = Vector::array(DataType::Int, &[ints(&[1, 2]), ints(&[]), ints(&[3])]).unwrap();
        assert!(v.is_array_vector());
        assert_eq!(v.len(), 3);
        assert_eq!(v.offsets(), Some(&[2, 2, 3][..]));
        assert_eq!(v.row(0).unwrap(), ints(&[1, 2]));
        assert!(v.is_null(1).unwrap());
        assert!(v.get(2).unwrap().is_vector());
        assert!(v.get_scalar(0).is_err());
        assert_eq!(v.to_string(), "vector<int[]>([[1, 2], [], [3]])");

        v.append(&create_int(9).into()).unwrap();
        assert_eq!(v.row(3).unwrap(), ints(&[9]));
        assert!(v.append(&Value::Vector(Vector::empty(DataType::Long).unwrap())).is_err());

        let picked = v.sub_vector(&[3, 0]).unwrap();
        assert_eq!(picked.offsets(), Some(&[1, 3][..]));
        assert_eq!(picked.to_string(), "vector<int[]>([[9], [1, 2]])");
    }

    /// Тест проверяет, что концы строк должны покрывать все элементы.
    #[test]
    fn test_array_vector_offsets_checked() {
        let data = ColumnData::Int(vec![1, 2, 3]);
        assert!(Vector::from_parts(DataType::Int, data.clone(), vec![1, 2]).is_err());
        assert!(Vector::from_parts(DataType::Int, data.clone(), vec![2, 1, 3]).is_err());
        assert!(Vector::from_parts(DataType::String, ColumnData::Text(vec![]), vec![]).is_err());
        assert!(Vector::from_parts(DataType::Int, data, vec![0, 3]).is_ok());
    }

    /// Тест проверяет, что string и function не взаимозаменяемы.
    #[test]
    fn test_text_types_kept_apart() {
        let mut v = Vector::empty(DataType::String).unwrap();
        assert!(v.append(&crate::model::create_function("f").into()).is_err());
    }

    /// Тест проверяет, что хранилище чужого класса не принимается.
    #[test]
    fn test_new_checks_storage() {
        assert!(Vector::new(DataType::Long, ColumnData::Int(vec![1])).is_err());
        assert!(Vector::new(
            DataType::Decimal64,
            ColumnData::Decimal64 {
                scale: 19,
                values: vec![]
            }
        )
        .is_err());
    }
}
