//! Бинарный кодек значений.
//!
//! Каждое значение начинается с категории: `i16` вида `(form << 8) | type`
//! в порядке байтов соединения. Дальше идёт тело формы: размеры, полезная
//! нагрузка и вложенные значения. Длинные векторы пишутся и читаются
//! диапазонами по [`CodecConfig::chunk_size`] элементов.

pub mod chunk;
pub mod decode;
pub mod encode;
pub mod symbol;

use std::io::{BufRead, Cursor, Write};

use byteorder::{BigEndian, LittleEndian};
use dolphindb_error::CodecError;
use serde::Deserialize;

// Публичный экспорт из вложенных модулей, чтобы упростить доступ к ним
// из внешнего кода.
pub use chunk::*;
pub use decode::*;
pub use encode::*;
pub use symbol::*;

use crate::{model::Value, types::WireOrder};

/// Число элементов в одном диапазоне длинного вектора по умолчанию.
pub const DEFAULT_CHUNK_SIZE: usize = 65_536;

/// Параметры кодека.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Векторы длиннее этого значения пишутся диапазонами.
    pub chunk_size: usize,
    /// Предел `rows * cols` для читаемых векторов и таблиц.
    pub max_rows: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_rows: u32::MAX,
        }
    }
}

impl CodecConfig {
    pub(crate) fn effective_chunk(&self) -> usize {
        self.chunk_size.max(1)
    }
}

/// Записывает значение в поток в указанном порядке байтов.
pub fn write_value<W: Write>(
    w: &mut W,
    value: &Value,
    order: WireOrder,
    config: &CodecConfig,
) -> Result<(), CodecError> {
    match order {
        WireOrder::Little => Encoder::<W, LittleEndian>::new(w, config).value(value),
        WireOrder::Big => Encoder::<W, BigEndian>::new(w, config).value(value),
    }
}

/// Читает одно значение из потока.
///
/// При нехватке данных возвращает [`CodecError::Truncated`]: вызывающий
/// может дочитать байты и повторить попытку с начала.
pub fn read_value<R: BufRead>(
    r: &mut R,
    order: WireOrder,
    config: &CodecConfig,
) -> Result<Value, CodecError> {
    match order {
        WireOrder::Little => Decoder::<R, LittleEndian>::new(r, config).value(),
        WireOrder::Big => Decoder::<R, BigEndian>::new(r, config).value(),
    }
}

/// Кодирует значение в буфер с параметрами по умолчанию.
pub fn encode(
    value: &Value,
    order: WireOrder,
) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    write_value(&mut buf, value, order, &CodecConfig::default())?;
    Ok(buf)
}

/// Декодирует значение из буфера с параметрами по умолчанию.
pub fn decode(
    bytes: &[u8],
    order: WireOrder,
) -> Result<Value, CodecError> {
    read_value(&mut Cursor::new(bytes), order, &CodecConfig::default())
}
