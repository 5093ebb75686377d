//! Словарь символов: строки колонки заменяются индексами в базе.
//!
//! Индекс 0 базы всегда занят пустой строкой (null). Остальные строки
//! уникальны и идут в порядке первого появления.

use std::sync::Arc;

use ahash::AHashMap;
use dolphindb_error::CodecError;

/// База символов колонки и позиции строк в ней.
///
/// Индексы самой колонки не хранятся: кодировщик получает их через
/// [`SymbolBase::index_of`] по мере записи.
#[derive(Debug, Clone)]
pub struct SymbolBase<'a> {
    pub strings: Vec<String>,
    positions: AHashMap<&'a str, i32>,
}

impl<'a> SymbolBase<'a> {
    /// Строит базу по значениям колонки.
    pub fn build(values: &'a [String]) -> Self {
        let mut positions: AHashMap<&str, i32> = AHashMap::new();
        let mut strings = vec![String::new()];
        positions.insert("", 0);
        for v in values {
            positions.entry(v.as_str()).or_insert_with(|| {
                strings.push(v.clone());
                (strings.len() - 1) as i32
            });
        }
        Self { strings, positions }
    }

    /// Индекс строки в базе.
    pub fn index_of(
        &self,
        value: &str,
    ) -> Option<i32> {
        self.positions.get(value).copied()
    }

    /// Восстанавливает строки колонки по базе и индексам.
    pub fn resolve(
        base: &[String],
        indices: &[i32],
    ) -> Result<Vec<String>, CodecError> {
        indices
            .iter()
            .map(|&i| {
                usize::try_from(i)
                    .ok()
                    .and_then(|i| base.get(i))
                    .cloned()
                    .ok_or(CodecError::SymbolIndexOutOfRange {
                        index: i,
                        size: base.len(),
                    })
            })
            .collect()
    }
}

/// Базы, уже записанные в текущую таблицу.
///
/// Повторная база записывается только идентификатором с размером 0.
#[derive(Debug, Default)]
pub struct SymbolBaseWriter {
    ids: AHashMap<Vec<String>, u32>,
}

impl SymbolBaseWriter {
    /// Идентификатор базы и признак того, что она уже была записана.
    pub fn register(
        &mut self,
        base: &[String],
    ) -> (u32, bool) {
        if let Some(&id) = self.ids.get(base) {
            return (id, true);
        }
        let id = self.ids.len() as u32;
        self.ids.insert(base.to_vec(), id);
        (id, false)
    }
}

/// Базы, прочитанные из текущей таблицы.
#[derive(Debug, Default)]
pub struct SymbolBaseReader {
    bases: AHashMap<u32, Arc<Vec<String>>>,
}

impl SymbolBaseReader {
    /// Ранее прочитанная база. Неизвестный идентификатор с размером 0
    /// означает пустую базу из одной строки `""`: она запоминается и
    /// возвращается сразу.
    pub fn existing(
        &mut self,
        id: u32,
        size: u32,
    ) -> Result<Option<Arc<Vec<String>>>, CodecError> {
        match self.bases.get(&id) {
            Some(_) if size != 0 => Err(CodecError::InvalidSymbolBase { id }),
            Some(base) => Ok(Some(Arc::clone(base))),
            None if size == 0 => Ok(Some(self.insert(id, vec![String::new()]))),
            None => Ok(None),
        }
    }

    pub fn insert(
        &mut self,
        id: u32,
        base: Vec<String>,
    ) -> Arc<Vec<String>> {
        let base = Arc::new(base);
        self.bases.insert(id, Arc::clone(&base));
        base
    }
}
