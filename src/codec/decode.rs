use std::{
    io::{BufRead, Read},
    marker::PhantomData,
};

use byteorder::{ByteOrder, ReadBytesExt};
use dolphindb_error::{CodecError, StackError};
use ordered_float::OrderedFloat;

use super::{CodecConfig, SymbolBase, SymbolBaseReader};
use crate::{
    model::{
        create_void, Cell, ColumnData, Dictionary, Matrix, Pair, Scalar, Set, Table, Value, Vector,
    },
    types::{Category, DataForm, DataType, Storage},
};

/// Максимальная вложенность значений (векторы `any`, множества, словари).
const MAX_NESTING: usize = 64;

/// Чтение значений из потока в порядке байтов `B`.
pub struct Decoder<'a, R: BufRead, B: ByteOrder> {
    r: &'a mut R,
    config: &'a CodecConfig,
    depth: usize,
    _order: PhantomData<B>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<'a, R: BufRead, B: ByteOrder> Decoder<'a, R, B> {
    pub fn new(
        r: &'a mut R,
        config: &'a CodecConfig,
    ) -> Self {
        Self {
            r,
            config,
            depth: 0,
            _order: PhantomData,
        }
    }

    /// Читает значение любой формы, начиная с категории.
    pub fn value(&mut self) -> Result<Value, CodecError> {
        if self.depth >= MAX_NESTING {
            return Err(CodecError::Malformed {
                reason: format!("nesting deeper than {MAX_NESTING} levels"),
            });
        }
        self.depth += 1;
        let result = self.category().and_then(|c| self.body(c));
        self.depth -= 1;
        result
    }
}

////////////////////////////////////////////////////////////////////////////////
// Внутренние методы и функции
////////////////////////////////////////////////////////////////////////////////

impl<R: BufRead, B: ByteOrder> Decoder<'_, R, B> {
    fn category(&mut self) -> Result<Category, CodecError> {
        let raw = self.r.read_i16::<B>()? as u16;
        Category::from_bytes((raw >> 8) as u8, (raw & 0xff) as u8)
    }

    fn body(
        &mut self,
        category: Category,
    ) -> Result<Value, CodecError> {
        match category.form {
            DataForm::Scalar => self.scalar(category.data_type).map(Value::Scalar),
            DataForm::Vector => self
                .vector_body(category, &mut SymbolBaseReader::default())
                .map(Value::Vector),
            DataForm::Pair => {
                let vector = self.vector_body(category, &mut SymbolBaseReader::default())?;
                Pair::new(vector).map(Value::Pair).map_err(malformed)
            }
            DataForm::Matrix => self.matrix().map(Value::Matrix),
            DataForm::Set => {
                let items = self.nested_vector("set")?;
                Set::from_vector(&items).map(Value::Set).map_err(malformed)
            }
            DataForm::Dictionary => {
                let keys = self.nested_vector("dictionary keys")?;
                let values = self.nested_vector("dictionary values")?;
                Dictionary::new(keys, values)
                    .map(Value::Dictionary)
                    .map_err(malformed)
            }
            DataForm::Table => self.table().map(Value::Table),
            DataForm::Chart | DataForm::Chunk => Err(unsupported(category)),
        }
    }

    fn scalar(
        &mut self,
        data_type: DataType,
    ) -> Result<Scalar, CodecError> {
        let category = Category::new(DataForm::Scalar, data_type);
        let storage = data_type.storage().ok_or_else(|| unsupported(category))?;
        let cell = match storage {
            Storage::Void => {
                self.r.read_u8()?;
                return Ok(create_void());
            }
            Storage::Byte => Cell::Byte(self.r.read_i8()?),
            Storage::Short => Cell::Short(self.r.read_i16::<B>()?),
            Storage::Int => Cell::Int(self.r.read_i32::<B>()?),
            Storage::Long => Cell::Long(self.r.read_i64::<B>()?),
            Storage::Float => Cell::Float(OrderedFloat(self.r.read_f32::<B>()?)),
            Storage::Double => Cell::Double(OrderedFloat(self.r.read_f64::<B>()?)),
            Storage::Decimal32 => {
                let scale = self.scale()?;
                Cell::Decimal32 {
                    scale,
                    raw: self.r.read_i32::<B>()?,
                }
            }
            Storage::Decimal64 => {
                let scale = self.scale()?;
                Cell::Decimal64 {
                    scale,
                    raw: self.r.read_i64::<B>()?,
                }
            }
            Storage::Decimal128 => {
                let scale = self.scale()?;
                Cell::Decimal128 {
                    scale,
                    raw: self.r.read_i128::<B>()?,
                }
            }
            Storage::Duration => Cell::Duration {
                value: self.r.read_i32::<B>()?,
                unit: self.r.read_u32::<B>()?,
            },
            Storage::Double2 => Cell::Double2(
                OrderedFloat(self.r.read_f64::<B>()?),
                OrderedFloat(self.r.read_f64::<B>()?),
            ),
            Storage::Text => Cell::Text(self.string("string scalar")?),
            Storage::Blob => Cell::Blob(self.blob()?),
            Storage::Wide => Cell::Wide(self.r.read_u128::<B>()?),
            Storage::Any => return Err(unsupported(category)),
        };
        Scalar::new(data_type, cell).map_err(malformed)
    }

    /// Тело вектора после категории: размеры и полезная нагрузка.
    fn vector_body(
        &mut self,
        category: Category,
        symbols: &mut SymbolBaseReader,
    ) -> Result<Vector, CodecError> {
        let (rows, cols) = self.dimensions()?;
        if category.array {
            self.element_count(rows, 1)?;
            return self.array_vector(category, rows);
        }
        let n = self.element_count(rows, cols)?;
        if category.form == DataForm::Pair && n != 2 {
            return Err(CodecError::DimensionMismatch { rows, cols, len: 2 });
        }
        if category.symbol_extended {
            return self.symbol_vector(n, symbols);
        }
        let data = self.payload(category, n)?;
        Vector::new(category.data_type, data).map_err(malformed)
    }

    fn symbol_vector(
        &mut self,
        n: usize,
        symbols: &mut SymbolBaseReader,
    ) -> Result<Vector, CodecError> {
        let id = self.r.read_u32::<B>()?;
        let size = self.r.read_u32::<B>()?;
        let base = match symbols.existing(id, size)? {
            Some(base) => base,
            None => {
                let capacity = (size as usize).min(self.config.effective_chunk());
                let mut strings = Vec::with_capacity(capacity);
                for _ in 0..size {
                    strings.push(self.string("symbol base")?);
                }
                symbols.insert(id, strings)
            }
        };
        let indices = self.fixed(n, |r, dst| r.read_i32_into::<B>(dst))?;
        let values = SymbolBase::resolve(&base, &indices)?;
        Vector::new(DataType::Symbol, ColumnData::Text(values)).map_err(malformed)
    }

    /// Полезная нагрузка из `n` элементов. Память растёт диапазонами по мере
    /// поступления байтов, поэтому ложная длина даёт `Truncated`.
    fn payload(
        &mut self,
        category: Category,
        n: usize,
    ) -> Result<ColumnData, CodecError> {
        let storage = category
            .data_type
            .storage()
            .ok_or_else(|| unsupported(category))?;
        let data = match storage {
            Storage::Void => ColumnData::Void(n),
            Storage::Text => {
                let mut values = Vec::with_capacity(n.min(self.config.effective_chunk()));
                for _ in 0..n {
                    values.push(self.string("string vector")?);
                }
                ColumnData::Text(values)
            }
            Storage::Blob => {
                let mut values = Vec::with_capacity(n.min(self.config.effective_chunk()));
                for _ in 0..n {
                    values.push(self.blob()?);
                }
                ColumnData::Blob(values)
            }
            Storage::Any => {
                let mut values = Vec::with_capacity(n.min(self.config.effective_chunk()));
                for _ in 0..n {
                    values.push(self.value()?);
                }
                ColumnData::Any(values)
            }
            fixed => {
                let scale = if category.data_type.is_decimal() {
                    self.scale()?
                } else {
                    0
                };
                self.fixed_column(fixed, scale, n)?
            }
        };
        Ok(data)
    }

    /// `n` элементов класса хранения фиксированной ширины.
    fn fixed_column(
        &mut self,
        storage: Storage,
        scale: u32,
        n: usize,
    ) -> Result<ColumnData, CodecError> {
        let data = match storage {
            Storage::Byte => ColumnData::Byte(self.fixed(n, |r, dst| r.read_i8_into(dst))?),
            Storage::Short => {
                ColumnData::Short(self.fixed(n, |r, dst| r.read_i16_into::<B>(dst))?)
            }
            Storage::Int => ColumnData::Int(self.fixed(n, |r, dst| r.read_i32_into::<B>(dst))?),
            Storage::Long => ColumnData::Long(self.fixed(n, |r, dst| r.read_i64_into::<B>(dst))?),
            Storage::Float => {
                ColumnData::Float(self.fixed(n, |r, dst| r.read_f32_into::<B>(dst))?)
            }
            Storage::Double => {
                ColumnData::Double(self.fixed(n, |r, dst| r.read_f64_into::<B>(dst))?)
            }
            Storage::Decimal32 => ColumnData::Decimal32 {
                scale,
                values: self.fixed(n, |r, dst| r.read_i32_into::<B>(dst))?,
            },
            Storage::Decimal64 => ColumnData::Decimal64 {
                scale,
                values: self.fixed(n, |r, dst| r.read_i64_into::<B>(dst))?,
            },
            Storage::Decimal128 => ColumnData::Decimal128 {
                scale,
                values: self.fixed(n, |r, dst| r.read_i128_into::<B>(dst))?,
            },
            Storage::Wide => ColumnData::Wide(self.fixed(n, |r, dst| r.read_u128_into::<B>(dst))?),
            Storage::Duration => {
                let raw = self.fixed(pairs(n)?, |r, dst| r.read_u32_into::<B>(dst))?;
                ColumnData::Duration(raw.chunks_exact(2).map(|p| (p[0] as i32, p[1])).collect())
            }
            Storage::Double2 => {
                let raw = self.fixed(pairs(n)?, |r, dst| r.read_f64_into::<B>(dst))?;
                ColumnData::Double2(raw.chunks_exact(2).map(|p| [p[0], p[1]]).collect())
            }
            other => {
                return Err(CodecError::Malformed {
                    reason: format!("{other:?} storage has no fixed width"),
                })
            }
        };
        Ok(data)
    }

    /// Вектор-массив из `rows` строк: масштаб для decimal, затем блоки с
    /// числом строк, шириной длины, длинами и элементами.
    fn array_vector(
        &mut self,
        category: Category,
        rows: usize,
    ) -> Result<Vector, CodecError> {
        let data_type = category.data_type;
        let storage = data_type.storage().ok_or_else(|| unsupported(category))?;
        let scale = if data_type.is_decimal() {
            self.scale()?
        } else {
            0
        };
        let limit = self.config.max_rows as usize;
        let mut data = ColumnData::with_capacity(storage, scale, 0);
        let mut offsets = Vec::with_capacity(rows.min(self.config.effective_chunk()));
        while offsets.len() < rows {
            let count = self.r.read_u16::<B>()? as usize;
            let unit = self.r.read_u16::<B>()?;
            if count == 0 || offsets.len() + count > rows {
                return Err(CodecError::Malformed {
                    reason: format!("array vector block of {count} rows after {} of {rows}", offsets.len()),
                });
            }
            let mut total = data.len();
            for _ in 0..count {
                let len = match unit {
                    1 => self.r.read_u8()? as usize,
                    2 => self.r.read_u16::<B>()? as usize,
                    4 => self.r.read_u32::<B>()? as usize,
                    other => {
                        return Err(CodecError::Malformed {
                            reason: format!("array vector length unit {other}"),
                        })
                    }
                };
                total = total.saturating_add(len);
                if total > limit {
                    return Err(CodecError::SizeLimit { rows: total, limit });
                }
                offsets.push(total);
            }
            let block = self.fixed_column(storage, scale, total - data.len())?;
            data.extend_from(&block).map_err(|e| malformed(e.into()))?;
        }
        Vector::from_parts(data_type, data, offsets).map_err(malformed)
    }

    /// Читает `n` элементов фиксированной ширины диапазонами.
    fn fixed<T, F>(
        &mut self,
        n: usize,
        mut fill: F,
    ) -> Result<Vec<T>, CodecError>
    where
        T: Default + Clone,
        F: FnMut(&mut R, &mut [T]) -> std::io::Result<()>,
    {
        let chunk = self.config.effective_chunk();
        let mut out: Vec<T> = Vec::with_capacity(n.min(chunk));
        while out.len() < n {
            let start = out.len();
            let end = (start + chunk).min(n);
            out.resize(end, T::default());
            fill(&mut *self.r, &mut out[start..])?;
        }
        Ok(out)
    }

    fn matrix(&mut self) -> Result<Matrix, CodecError> {
        let flag = self.r.read_u8()?;
        let row_labels = if flag & 0x01 != 0 {
            Some(self.nested_vector("matrix row labels")?)
        } else {
            None
        };
        let col_labels = if flag & 0x02 != 0 {
            Some(self.nested_vector("matrix column labels")?)
        } else {
            None
        };
        let category = self.category()?;
        if category.form != DataForm::Matrix {
            return Err(CodecError::Malformed {
                reason: format!("matrix data has category {category}"),
            });
        }
        let (rows, cols) = self.dimensions()?;
        let n = self.element_count(rows, cols)?;
        let data = self.payload(category, n)?;
        let data = Vector::new(category.data_type, data).map_err(malformed)?;
        Matrix::new(data, rows, cols)
            .and_then(|m| m.with_labels(row_labels, col_labels))
            .map_err(malformed)
    }

    fn table(&mut self) -> Result<Table, CodecError> {
        let (rows, cols) = self.dimensions()?;
        self.element_count(rows, 1)?;
        let name = self.string("table name")?;
        let mut names = Vec::with_capacity(cols.min(self.config.effective_chunk()));
        for _ in 0..cols {
            names.push(self.string("column name")?);
        }
        let mut symbols = SymbolBaseReader::default();
        let mut columns = Vec::with_capacity(names.len());
        for _ in 0..cols {
            let category = self.category()?;
            if category.form != DataForm::Vector {
                return Err(CodecError::Malformed {
                    reason: format!("table column has category {category}"),
                });
            }
            self.depth += 1;
            let column = self.vector_body(category, &mut symbols);
            self.depth -= 1;
            let column = column?;
            if column.len() != rows {
                return Err(CodecError::DimensionMismatch {
                    rows,
                    cols,
                    len: column.len(),
                });
            }
            columns.push(column);
        }
        Table::new(names, columns)
            .map(|t| t.with_name(name))
            .map_err(malformed)
    }

    /// Вложенное значение, которое обязано быть вектором.
    fn nested_vector(
        &mut self,
        what: &str,
    ) -> Result<Vector, CodecError> {
        match self.value()? {
            Value::Vector(v) => Ok(v),
            other => Err(CodecError::Malformed {
                reason: format!("{what} must be a vector, found {}", other.form()),
            }),
        }
    }

    fn dimensions(&mut self) -> Result<(usize, usize), CodecError> {
        let rows = self.r.read_u32::<B>()? as usize;
        let cols = self.r.read_u32::<B>()? as usize;
        Ok((rows, cols))
    }

    fn element_count(
        &self,
        rows: usize,
        cols: usize,
    ) -> Result<usize, CodecError> {
        let limit = self.config.max_rows as usize;
        match rows.checked_mul(cols) {
            Some(n) if n <= limit => Ok(n),
            _ => Err(CodecError::SizeLimit {
                rows: rows.saturating_mul(cols),
                limit,
            }),
        }
    }

    fn scale(&mut self) -> Result<u32, CodecError> {
        let scale = self.r.read_i32::<B>()?;
        u32::try_from(scale).map_err(|_| CodecError::Malformed {
            reason: format!("negative decimal scale {scale}"),
        })
    }

    fn string(
        &mut self,
        what: &str,
    ) -> Result<String, CodecError> {
        let mut buf = Vec::new();
        self.r.read_until(0, &mut buf)?;
        if buf.pop() != Some(0) {
            return Err(CodecError::truncated(what));
        }
        String::from_utf8(buf).map_err(|_| CodecError::InvalidUtf8 {
            what: what.to_string(),
        })
    }

    fn blob(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.r.read_u32::<B>()? as u64;
        let mut buf = Vec::new();
        self.r.by_ref().take(len).read_to_end(&mut buf)?;
        if buf.len() as u64 != len {
            return Err(CodecError::truncated("blob"));
        }
        Ok(buf)
    }
}

fn malformed(err: StackError) -> CodecError {
    CodecError::Malformed {
        reason: err.to_string(),
    }
}

/// Число слотов для `n` элементов из двух частей.
fn pairs(n: usize) -> Result<usize, CodecError> {
    n.checked_mul(2).ok_or(CodecError::SizeLimit {
        rows: n,
        limit: usize::MAX / 2,
    })
}

fn unsupported(category: Category) -> CodecError {
    CodecError::Unsupported {
        form: category.form.to_string(),
        data_type: category.data_type.to_string(),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
