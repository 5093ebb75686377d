use dolphindb_error::{ClientError, DolphinResult};

use crate::{model::Value, types::WireOrder};

/// Первая строка ответа: `<session_id> <object_count> <order>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    pub session_id: String,
    pub object_count: usize,
    pub order: WireOrder,
}

/// Разобранный ответ сервера.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub header: ResponseHeader,
    /// Единственный объект ответа, если `object_count == 1`.
    pub value: Option<Value>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ResponseHeader {
    /// Разбирает строку заголовка без завершающего перевода строки.
    pub fn parse(line: &str) -> DolphinResult<Self> {
        let parts: Vec<&str> = line.split(' ').collect();
        if parts.len() < 3 {
            return Err(protocol(format!(
                "first line items count [{}] is less than 3",
                parts.len()
            )));
        }
        let object_count = parts[1]
            .parse()
            .map_err(|_| protocol(format!("invalid object count '{}'", parts[1])))?;
        let flag = parts[2]
            .bytes()
            .next()
            .ok_or_else(|| protocol("missing byte order flag".to_string()))?;
        let order = WireOrder::from_flag(flag)?;
        Ok(Self {
            session_id: parts[0].to_string(),
            object_count,
            order,
        })
    }
}

/// Вторая строка ответа: `OK` или текст ошибки сервера без изменений.
pub fn check_status(line: &str) -> Result<(), ClientError> {
    if line == "OK" {
        Ok(())
    } else {
        Err(ClientError::ServerError {
            message: line.to_string(),
        })
    }
}

fn protocol(reason: String) -> dolphindb_error::StackError {
    ClientError::Protocol { reason }.into()
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
