//! Однопоточный фейковый сервер протокола для интеграционных тестов.
//!
//! Принимает соединения по очереди, разбирает запросы, декодирует аргументы
//! кодеком крейта и отвечает тем, что вернёт обработчик.

#![allow(dead_code)]

use std::{
    io::{BufRead, BufReader, Read, Write},
    net::{TcpListener, TcpStream},
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use dolphindb::{encode, read_value, CodecConfig, Value, WireOrder};

pub const SESSION_ID: &str = "20267359";

/// Разобранный запрос клиента.
#[derive(Debug, Clone)]
pub struct Received {
    /// Первая строка без `\n`
    pub header: String,
    /// Вид команды: `connect`, `script`, `function`, `variable`
    pub kind: String,
    /// Текст скрипта, имя функции или имена переменных через запятую
    pub body: String,
    pub args: Vec<Value>,
}

/// Ответ на запрос.
pub enum Reply {
    Ok(Option<Value>),
    Error(String),
    /// Закрыть соединение без ответа
    Close,
    /// Подождать и закрыть соединение
    Stall(Duration),
    /// Отправить байты как есть
    Raw(Vec<u8>),
}

pub struct FakeServer {
    pub addr: String,
    pub log: Arc<Mutex<Vec<Received>>>,
}

impl FakeServer {
    /// Запускает сервер; `handler` вызывается для каждого запроса,
    /// включая рукопожатие.
    pub fn spawn<F>(handler: F) -> Self
    where
        F: FnMut(&Received) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let log = Arc::new(Mutex::new(Vec::new()));
        let server_log = log.clone();
        thread::spawn(move || {
            let mut handler = handler;
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve(stream, &mut handler, &server_log);
            }
        });
        Self { addr, log }
    }

    /// Сервер, отвечающий `OK` на всё, кроме заданных скриптов.
    pub fn echo() -> Self {
        Self::spawn(|_| Reply::Ok(None))
    }

    pub fn received(&self) -> Vec<Received> {
        self.log.lock().unwrap().clone()
    }

    /// Запросы, кроме рукопожатий.
    pub fn requests(&self) -> Vec<Received> {
        self.received()
            .into_iter()
            .filter(|r| r.kind != "connect")
            .collect()
    }
}

/// Адрес, на котором гарантированно никто не слушает.
pub fn dead_address() -> String {
    let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
    listener.local_addr().unwrap().to_string()
}

fn serve<F>(
    stream: TcpStream,
    handler: &mut F,
    log: &Mutex<Vec<Received>>,
) where
    F: FnMut(&Received) -> Reply,
{
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);
    while let Some(request) = read_request(&mut reader) {
        log.lock().unwrap().push(request.clone());
        let bytes = match handler(&request) {
            Reply::Ok(value) => ok_response(value.as_ref()),
            Reply::Error(message) => format!("{SESSION_ID} 0 1\n{message}\n").into_bytes(),
            Reply::Raw(bytes) => bytes,
            Reply::Close => return,
            Reply::Stall(delay) => {
                thread::sleep(delay);
                return;
            }
        };
        if writer.write_all(&bytes).is_err() {
            return;
        }
    }
}

/// Ответ `OK` с объектом или без него.
pub fn ok_response(value: Option<&Value>) -> Vec<u8> {
    match value {
        None => format!("{SESSION_ID} 0 1\nOK\n").into_bytes(),
        Some(value) => {
            let mut bytes = format!("{SESSION_ID} 1 1\nOK\n").into_bytes();
            bytes.extend(encode(value, WireOrder::Little).unwrap());
            bytes
        }
    }
}

fn read_request<R: BufRead>(r: &mut R) -> Option<Received> {
    let header = read_line(r)?;
    let len: usize = header.split(' ').nth(2)?.parse().ok()?;
    let mut command = vec![0u8; len];
    r.read_exact(&mut command).ok()?;
    let command = String::from_utf8(command).ok()?;

    let (kind, rest) = command.split_once('\n')?;
    let mut received = Received {
        header,
        kind: kind.to_string(),
        body: String::new(),
        args: Vec::new(),
    };
    match kind {
        "connect" => {}
        "script" => received.body = rest.to_string(),
        "function" | "variable" => {
            let lines: Vec<&str> = rest.split('\n').collect();
            received.body = lines[0].to_string();
            let count: usize = lines[1].parse().ok()?;
            let order = WireOrder::from_flag(lines[2].bytes().next()?).ok()?;
            for _ in 0..count {
                received
                    .args
                    .push(read_value(r, order, &CodecConfig::default()).ok()?);
            }
        }
        _ => return None,
    }
    Some(received)
}

fn read_line<R: BufRead>(r: &mut R) -> Option<String> {
    let mut buf = Vec::new();
    let n = r.read_until(b'\n', &mut buf).ok()?;
    if n == 0 {
        return None;
    }
    buf.pop();
    String::from_utf8(buf).ok()
}
