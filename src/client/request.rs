use std::{fmt, sync::Arc};

use dolphindb_error::{ClientError, DolphinResult};
use serde::Deserialize;

use crate::{model::Value, types::WireOrder};

/// Наименьший допустимый ненулевой размер порции выборки.
pub const MIN_FETCH_SIZE: u32 = 8192;

/// Флаг очистки памяти сессии после выполнения.
const FLAG_CLEAR_SESSION_MEMORY: u32 = 16;
/// Флаг обратной потоковой подписки.
const FLAG_REVERSE_STREAMING: u32 = 131_072;

/// Параметры поведения, которые добавляются к заголовку запросов
/// `connect`, `script` и `function`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BehaviorOptions {
    pub priority: u32,
    pub parallelism: u32,
    /// 0 означает выборку целиком.
    pub fetch_size: u32,
    pub clear_session_memory: bool,
    pub reverse_streaming: bool,
}

/// Вид команды протокола.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Connect,
    Script,
    Function,
    Variable,
}

/// Запрос к серверу: текст команды и аргументы для кодека.
///
/// Аргументы лежат в `Arc`, поэтому запрос дёшево повторить на другом
/// узле и передать в блокирующую задачу кодирования.
#[derive(Debug, Clone)]
pub struct Request {
    kind: CommandKind,
    command: Vec<u8>,
    args: Arc<[Value]>,
    order: WireOrder,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl BehaviorOptions {
    /// Отказ для `fetch_size` в интервале `(0, 8192)`.
    pub fn validate(&self) -> DolphinResult<()> {
        if self.fetch_size > 0 && self.fetch_size < MIN_FETCH_SIZE {
            return Err(ClientError::InvalidOptions {
                reason: format!(
                    "fetchSize {} must be greater than {MIN_FETCH_SIZE}",
                    self.fetch_size
                ),
            }
            .into());
        }
        Ok(())
    }

    /// Сумма флагов запроса.
    pub fn request_flag(&self) -> u32 {
        let mut flag = 0;
        if self.clear_session_memory {
            flag += FLAG_CLEAR_SESSION_MEMORY;
        }
        if self.reverse_streaming {
            flag += FLAG_REVERSE_STREAMING;
        }
        flag
    }

    /// Хвост заголовка: ` / <flag>_1_<priority>_<parallelism>[__<fetch>]`.
    pub fn header_suffix(&self) -> String {
        let mut suffix = format!(
            " / {}_1_{}_{}",
            self.request_flag(),
            self.priority,
            self.parallelism
        );
        if self.fetch_size > 0 {
            suffix.push_str(&format!("__{}", self.fetch_size));
        }
        suffix
    }
}

impl Request {
    /// Рукопожатие, открывающее сессию.
    pub fn connect() -> Self {
        Self::without_args(CommandKind::Connect, b"connect\n".to_vec())
    }

    pub fn script(script: &str) -> Self {
        let mut command = b"script\n".to_vec();
        command.extend_from_slice(script.as_bytes());
        Self::without_args(CommandKind::Script, command)
    }

    /// Вызов функции: `function\n<name>\n<nargs>\n<order>\n`, затем аргументы.
    pub fn function(
        name: &str,
        args: Vec<Value>,
        order: WireOrder,
    ) -> Self {
        let command = format!("function\n{name}\n{}\n", args.len());
        let mut command = command.into_bytes();
        command.push(order.flag());
        command.push(b'\n');
        Self {
            kind: CommandKind::Function,
            command,
            args: args.into(),
            order,
        }
    }

    /// Загрузка переменных: `variable\n<names>\n<count>\n<order>`, затем
    /// значения в том же порядке.
    pub fn variables(
        names: &[String],
        values: Vec<Value>,
        order: WireOrder,
    ) -> Self {
        let command = format!("variable\n{}\n{}\n", names.join(","), values.len());
        let mut command = command.into_bytes();
        command.push(order.flag());
        Self {
            kind: CommandKind::Variable,
            command,
            args: values.into(),
            order,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn command(&self) -> &[u8] {
        &self.command
    }

    pub fn args(&self) -> &Arc<[Value]> {
        &self.args
    }

    pub fn order(&self) -> WireOrder {
        self.order
    }

    /// Первая строка запроса вместе с переводом строки.
    pub fn header(
        &self,
        session_id: &str,
        options: &BehaviorOptions,
    ) -> Vec<u8> {
        let mut header = format!("API {session_id} {}", self.command.len());
        if self.kind != CommandKind::Variable {
            header.push_str(&options.header_suffix());
        }
        header.push('\n');
        header.into_bytes()
    }

    fn without_args(
        kind: CommandKind,
        command: Vec<u8>,
    ) -> Self {
        Self {
            kind,
            command,
            args: Arc::from(Vec::new()),
            order: WireOrder::default(),
        }
    }
}

/// Допустимое имя переменной: буква, затем буквы, цифры и `_`.
pub fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для BehaviorOptions и CommandKind
////////////////////////////////////////////////////////////////////////////////

impl Default for BehaviorOptions {
    fn default() -> Self {
        Self {
            priority: 4,
            parallelism: 64,
            fetch_size: 0,
            clear_session_memory: false,
            reverse_streaming: false,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Script => "script",
            Self::Function => "function",
            Self::Variable => "variable",
        };
        f.write_str(name)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
