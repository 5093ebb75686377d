use std::{io::Write, marker::PhantomData};

use byteorder::{ByteOrder, WriteBytesExt};
use dolphindb_error::CodecError;

use super::{CodecConfig, SymbolBase, SymbolBaseWriter};
use crate::{
    model::{Cell, ColumnData, Dictionary, Matrix, Scalar, Set, Table, Value, Vector},
    types::{Category, DataForm, DataType},
};

/// Запись значений в поток в порядке байтов `B`.
pub struct Encoder<'a, W: Write, B: ByteOrder> {
    w: &'a mut W,
    config: &'a CodecConfig,
    scratch: Vec<u8>,
    _order: PhantomData<B>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<'a, W: Write, B: ByteOrder> Encoder<'a, W, B> {
    pub fn new(
        w: &'a mut W,
        config: &'a CodecConfig,
    ) -> Self {
        Self {
            w,
            config,
            scratch: Vec::new(),
            _order: PhantomData,
        }
    }

    /// Записывает значение любой формы вместе с категорией.
    pub fn value(
        &mut self,
        value: &Value,
    ) -> Result<(), CodecError> {
        match value {
            Value::Scalar(v) => self.scalar(v),
            Value::Vector(v) => self.vector(v, None),
            Value::Pair(v) => {
                let vector = v.vector();
                self.category(Category::new(DataForm::Pair, vector.data_type()))?;
                self.dimensions(2, 1)?;
                self.payload(vector)
            }
            Value::Matrix(v) => self.matrix(v),
            Value::Set(v) => self.set(v),
            Value::Dictionary(v) => self.dictionary(v),
            Value::Table(v) => self.table(v),
        }
    }

    pub fn scalar(
        &mut self,
        v: &Scalar,
    ) -> Result<(), CodecError> {
        self.category(Category::new(DataForm::Scalar, v.data_type()))?;
        match v.cell() {
            Cell::Void => self.w.write_u8(0)?,
            Cell::Byte(x) => self.w.write_i8(*x)?,
            Cell::Short(x) => self.w.write_i16::<B>(*x)?,
            Cell::Int(x) => self.w.write_i32::<B>(*x)?,
            Cell::Long(x) => self.w.write_i64::<B>(*x)?,
            Cell::Float(x) => self.w.write_f32::<B>(x.0)?,
            Cell::Double(x) => self.w.write_f64::<B>(x.0)?,
            Cell::Decimal32 { scale, raw } => {
                self.w.write_i32::<B>(*scale as i32)?;
                self.w.write_i32::<B>(*raw)?;
            }
            Cell::Decimal64 { scale, raw } => {
                self.w.write_i32::<B>(*scale as i32)?;
                self.w.write_i64::<B>(*raw)?;
            }
            Cell::Decimal128 { scale, raw } => {
                self.w.write_i32::<B>(*scale as i32)?;
                self.w.write_i128::<B>(*raw)?;
            }
            Cell::Duration { value, unit } => {
                self.w.write_i32::<B>(*value)?;
                self.w.write_u32::<B>(*unit)?;
            }
            Cell::Double2(x, y) => {
                self.w.write_f64::<B>(x.0)?;
                self.w.write_f64::<B>(y.0)?;
            }
            Cell::Text(s) => write_str(self.w, s)?,
            Cell::Blob(b) => write_blob::<W, B>(self.w, b)?,
            Cell::Wide(x) => self.w.write_u128::<B>(*x)?,
        }
        Ok(())
    }

    /// Записывает вектор с категорией. Символьные векторы пишутся со
    /// словарём; внутри таблицы базы разделяются через `symbols`.
    pub fn vector(
        &mut self,
        v: &Vector,
        symbols: Option<&mut SymbolBaseWriter>,
    ) -> Result<(), CodecError> {
        if let Some(offsets) = v.offsets() {
            return self.array_vector(v, offsets);
        }
        if v.data_type() == DataType::Symbol {
            return self.symbol_vector(v, symbols);
        }
        self.category(Category::new(DataForm::Vector, v.data_type()))?;
        self.dimensions(v.len(), 1)?;
        self.payload(v)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Внутренние методы и функции
////////////////////////////////////////////////////////////////////////////////

impl<W: Write, B: ByteOrder> Encoder<'_, W, B> {
    fn category(
        &mut self,
        category: Category,
    ) -> Result<(), CodecError> {
        let form: u8 = category.form.into();
        let raw = ((form as u16) << 8) | category.type_byte() as u16;
        self.w.write_i16::<B>(raw as i16)?;
        Ok(())
    }

    fn dimensions(
        &mut self,
        rows: usize,
        cols: usize,
    ) -> Result<(), CodecError> {
        let limit = u32::MAX as usize;
        if rows > limit || cols > limit {
            return Err(CodecError::SizeLimit {
                rows: rows.max(cols),
                limit,
            });
        }
        self.w.write_u32::<B>(rows as u32)?;
        self.w.write_u32::<B>(cols as u32)?;
        Ok(())
    }

    fn symbol_vector(
        &mut self,
        v: &Vector,
        symbols: Option<&mut SymbolBaseWriter>,
    ) -> Result<(), CodecError> {
        let ColumnData::Text(values) = v.data() else {
            return Err(CodecError::Encoding(format!(
                "symbol vector with {:?} storage",
                v.data().storage()
            )));
        };
        let base = SymbolBase::build(values);
        self.category(Category::symbol_extended(DataForm::Vector))?;
        self.dimensions(values.len(), 1)?;

        let mut local = SymbolBaseWriter::default();
        let (id, existing) = symbols.unwrap_or(&mut local).register(&base.strings);
        self.w.write_u32::<B>(id)?;
        if existing {
            self.w.write_u32::<B>(0)?;
        } else {
            self.w.write_u32::<B>(base.strings.len() as u32)?;
            self.chunked(base.strings.len(), |buf, range| {
                for s in &base.strings[range] {
                    write_str(buf, s)?;
                }
                Ok(())
            })?;
        }
        self.chunked(values.len(), |buf, range| {
            for s in &values[range] {
                let index = base
                    .index_of(s)
                    .ok_or_else(|| CodecError::Encoding(format!("symbol {s:?} missing from base")))?;
                buf.write_i32::<B>(index)?;
            }
            Ok(())
        })
    }

    /// Вектор-массив: масштаб для decimal, затем блоки строк. Каждый блок
    /// несёт число строк, ширину длины, длины строк и их элементы.
    fn array_vector(
        &mut self,
        v: &Vector,
        offsets: &[usize],
    ) -> Result<(), CodecError> {
        self.category(Category::array(v.data_type()))?;
        self.dimensions(offsets.len(), 1)?;
        let data = v.data();
        if let Some(scale) = data.scale() {
            self.w.write_i32::<B>(scale as i32)?;
        }
        let block = self.config.effective_chunk().min(u16::MAX as usize);
        let mut row = 0;
        while row < offsets.len() {
            let end = (row + block).min(offsets.len());
            let first = if row == 0 { 0 } else { offsets[row - 1] };
            let lengths: Vec<usize> = (row..end)
                .map(|i| offsets[i] - if i == 0 { 0 } else { offsets[i - 1] })
                .collect();
            let widest = lengths.iter().copied().max().unwrap_or(0);
            let unit: u16 = if widest <= u8::MAX as usize {
                1
            } else if widest <= u16::MAX as usize {
                2
            } else {
                4
            };
            if widest > u32::MAX as usize {
                return Err(CodecError::SizeLimit {
                    rows: widest,
                    limit: u32::MAX as usize,
                });
            }
            self.w.write_u16::<B>((end - row) as u16)?;
            self.w.write_u16::<B>(unit)?;
            for &len in &lengths {
                match unit {
                    1 => self.w.write_u8(len as u8)?,
                    2 => self.w.write_u16::<B>(len as u16)?,
                    _ => self.w.write_u32::<B>(len as u32)?,
                }
            }
            let last = offsets[end - 1];
            self.chunked(last - first, |buf, range| {
                write_range::<B>(buf, data, first + range.start..first + range.end)
            })?;
            row = end;
        }
        Ok(())
    }

    /// Полезная нагрузка вектора без категории и размеров. Символы здесь
    /// пишутся обычными строками.
    fn payload(
        &mut self,
        v: &Vector,
    ) -> Result<(), CodecError> {
        let data = v.data();
        if let Some(scale) = data.scale() {
            self.w.write_i32::<B>(scale as i32)?;
        }
        match data {
            ColumnData::Void(_) => Ok(()),
            ColumnData::Any(items) => {
                for item in items {
                    self.value(item)?;
                }
                Ok(())
            }
            data => self.chunked(data.len(), |buf, range| write_range::<B>(buf, data, range)),
        }
    }

    /// Пишет `len` элементов диапазонами: каждый диапазон собирается в
    /// промежуточный буфер, записывается и сбрасывается в поток.
    fn chunked<F>(
        &mut self,
        len: usize,
        mut render: F,
    ) -> Result<(), CodecError>
    where
        F: FnMut(&mut Vec<u8>, std::ops::Range<usize>) -> Result<(), CodecError>,
    {
        let chunk = self.config.effective_chunk();
        if len <= chunk {
            self.scratch.clear();
            render(&mut self.scratch, 0..len)?;
            self.w.write_all(&self.scratch)?;
            return Ok(());
        }
        let mut start = 0;
        while start < len {
            let end = (start + chunk).min(len);
            self.scratch.clear();
            render(&mut self.scratch, start..end)?;
            self.w.write_all(&self.scratch)?;
            self.w.flush()?;
            start = end;
        }
        Ok(())
    }

    fn matrix(
        &mut self,
        m: &Matrix,
    ) -> Result<(), CodecError> {
        let category = Category::new(DataForm::Matrix, m.data_type());
        self.category(category)?;
        let flag = m.row_labels().map_or(0u8, |_| 0x01) | m.column_labels().map_or(0u8, |_| 0x02);
        self.w.write_u8(flag)?;
        if let Some(labels) = m.row_labels() {
            self.vector(labels, None)?;
        }
        if let Some(labels) = m.column_labels() {
            self.vector(labels, None)?;
        }
        self.category(category)?;
        self.dimensions(m.rows(), m.columns())?;
        self.payload(m.data())
    }

    fn set(
        &mut self,
        s: &Set,
    ) -> Result<(), CodecError> {
        self.category(Category::new(DataForm::Set, s.data_type()))?;
        let items = s
            .to_vector()
            .map_err(|e| CodecError::Encoding(e.to_string()))?;
        self.vector(&items, None)
    }

    fn dictionary(
        &mut self,
        d: &Dictionary,
    ) -> Result<(), CodecError> {
        self.category(Category::new(DataForm::Dictionary, d.value_type()))?;
        self.vector(d.keys(), None)?;
        self.vector(d.values(), None)
    }

    fn table(
        &mut self,
        t: &Table,
    ) -> Result<(), CodecError> {
        self.category(Category::new(DataForm::Table, DataType::Void))?;
        self.dimensions(t.rows(), t.columns())?;
        write_str(self.w, t.name())?;
        for name in t.column_names() {
            write_str(self.w, name)?;
        }
        let mut symbols = SymbolBaseWriter::default();
        for column in t.column_vectors() {
            self.vector(column, Some(&mut symbols))?;
        }
        Ok(())
    }
}

/// Элементы `range` типизированного хранилища.
fn write_range<B: ByteOrder>(
    buf: &mut Vec<u8>,
    data: &ColumnData,
    range: std::ops::Range<usize>,
) -> Result<(), CodecError> {
    match data {
        ColumnData::Void(_) | ColumnData::Any(_) => {}
        ColumnData::Byte(v) => v[range].iter().try_for_each(|x| buf.write_i8(*x))?,
        ColumnData::Short(v) => v[range].iter().try_for_each(|x| buf.write_i16::<B>(*x))?,
        ColumnData::Int(v) => v[range].iter().try_for_each(|x| buf.write_i32::<B>(*x))?,
        ColumnData::Long(v) => v[range].iter().try_for_each(|x| buf.write_i64::<B>(*x))?,
        ColumnData::Float(v) => v[range].iter().try_for_each(|x| buf.write_f32::<B>(*x))?,
        ColumnData::Double(v) => v[range].iter().try_for_each(|x| buf.write_f64::<B>(*x))?,
        ColumnData::Decimal32 { values, .. } => values[range]
            .iter()
            .try_for_each(|x| buf.write_i32::<B>(*x))?,
        ColumnData::Decimal64 { values, .. } => values[range]
            .iter()
            .try_for_each(|x| buf.write_i64::<B>(*x))?,
        ColumnData::Decimal128 { values, .. } => values[range]
            .iter()
            .try_for_each(|x| buf.write_i128::<B>(*x))?,
        ColumnData::Duration(v) => {
            for &(value, unit) in &v[range] {
                buf.write_i32::<B>(value)?;
                buf.write_u32::<B>(unit)?;
            }
        }
        ColumnData::Double2(v) => {
            for [x, y] in &v[range] {
                buf.write_f64::<B>(*x)?;
                buf.write_f64::<B>(*y)?;
            }
        }
        ColumnData::Text(v) => {
            for s in &v[range] {
                write_str(buf, s)?;
            }
        }
        ColumnData::Blob(v) => {
            for b in &v[range] {
                write_blob::<_, B>(buf, b)?;
            }
        }
        ColumnData::Wide(v) => v[range].iter().try_for_each(|x| buf.write_u128::<B>(*x))?,
    }
    Ok(())
}

/// Строка с завершающим нулём. Встроенный нуль обрывает строку на
/// стороне сервера, поэтому такие строки отвергаются.
fn write_str<W: Write + ?Sized>(
    w: &mut W,
    s: &str,
) -> Result<(), CodecError> {
    if s.as_bytes().contains(&0) {
        return Err(CodecError::Encoding(format!("string contains NUL byte: {s:?}")));
    }
    w.write_all(s.as_bytes())?;
    w.write_u8(0)?;
    Ok(())
}

fn write_blob<W: Write + ?Sized, B: ByteOrder>(
    w: &mut W,
    b: &[u8],
) -> Result<(), CodecError> {
    let len = u32::try_from(b.len()).map_err(|_| CodecError::SizeLimit {
        rows: b.len(),
        limit: u32::MAX as usize,
    })?;
    w.write_u32::<B>(len)?;
    w.write_all(b)?;
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
