use dolphindb_error::CodecError;

/// Порядок байтов соединения.
///
/// Сервер указывает порядок в заголовке ответа, клиент в командах
/// `function` и `variable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireOrder {
    #[default]
    Little,
    Big,
}

impl WireOrder {
    /// Флаг порядка в текстовой части протокола (`'1'` little, `'0'` big).
    pub fn flag(self) -> u8 {
        match self {
            Self::Little => b'1',
            Self::Big => b'0',
        }
    }

    pub fn from_flag(flag: u8) -> Result<Self, CodecError> {
        match flag {
            b'1' => Ok(Self::Little),
            b'0' => Ok(Self::Big),
            other => Err(CodecError::InvalidByteOrder(other)),
        }
    }
}
