//! Выбор узла кластера и разбор сигналов переключения.

use std::{fmt, sync::Arc, time::Duration};

use dolphindb_error::{ClientError, ClusterError, StackError};
use parking_lot::Mutex;
use rand::Rng;

/// Пауза между попытками подключения по умолчанию.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(100);

const NOT_LEADER: &str = "<NotLeader>";
const NODE_NOT_AVAILABLE: &str = "<DataNodeNotAvail>";
const NOT_INITIALIZED: &str = "The datanode isn't initialized yet";

/// Политика выбора следующего узла из списка кандидатов.
pub trait SelectionPolicy: Send + Sync + fmt::Debug {
    /// Индекс кандидата; `candidates` не пуст.
    fn select(
        &self,
        candidates: &[String],
    ) -> usize;
}

/// Узлы по кругу.
#[derive(Debug, Default)]
pub struct RoundRobin {
    next: Mutex<usize>,
}

/// Случайный узел.
#[derive(Debug, Default)]
pub struct Random;

/// Узлы кластера и политика переключения между ними.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Адреса `host:port`.
    pub nodes: Vec<String>,
    pub policy: Arc<dyn SelectionPolicy>,
    pub retry_backoff: Duration,
}

/// Что делать после ошибки запроса.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failover {
    /// Сервер назвал нового лидера.
    Leader(String),
    /// Перейти на любой другой узел.
    AnyNode,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ClusterConfig {
    pub fn new(nodes: Vec<String>) -> Self {
        Self {
            nodes,
            policy: Arc::new(RoundRobin::default()),
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    pub fn with_policy(
        mut self,
        policy: Arc<dyn SelectionPolicy>,
    ) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_backoff(
        mut self,
        backoff: Duration,
    ) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Порядок обхода узлов, кроме `current`: сначала названный лидер,
    /// затем остальные в порядке политики.
    pub fn candidates(
        &self,
        current: Option<&str>,
        leader: Option<&str>,
    ) -> Vec<String> {
        let mut rest: Vec<String> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if Some(node.as_str()) != current && Some(node.as_str()) != leader && !rest.contains(node) {
                rest.push(node.clone());
            }
        }
        let mut order = Vec::with_capacity(rest.len() + 1);
        if let Some(leader) = leader.filter(|l| Some(*l) != current) {
            order.push(leader.to_string());
        }
        while !rest.is_empty() {
            let i = self.policy.select(&rest).min(rest.len() - 1);
            order.push(rest.remove(i));
        }
        order
    }
}

impl Failover {
    /// Разбирает ошибку запроса. `None` означает, что ошибку нужно отдать
    /// вызывающему без переключения.
    pub fn classify(err: &StackError) -> Option<Self> {
        if let Some(ClientError::ServerError { message }) = err.downcast_ref::<ClientError>() {
            return Self::from_server_message(message);
        }
        if let Some(ClusterError::NotLeader { leader }) = err.downcast_ref::<ClusterError>() {
            return Some(leader.clone().map_or(Self::AnyNode, Self::Leader));
        }
        err.is_retryable().then_some(Self::AnyNode)
    }

    /// Маркеры кластера в тексте ошибки сервера.
    pub fn from_server_message(message: &str) -> Option<Self> {
        if let Some(pos) = message.find(NOT_LEADER) {
            let rest = &message[pos + NOT_LEADER.len()..];
            return Some(parse_address(rest).map_or(Self::AnyNode, Self::Leader));
        }
        if message.contains(NODE_NOT_AVAILABLE) || message.contains(NOT_INITIALIZED) {
            return Some(Self::AnyNode);
        }
        None
    }

    pub fn leader(&self) -> Option<&str> {
        match self {
            Self::Leader(addr) => Some(addr),
            Self::AnyNode => None,
        }
    }
}

/// `host:port` из начала строки; хвост после порта отбрасывается.
pub fn parse_address(raw: &str) -> Option<String> {
    let token = raw.split_whitespace().next()?;
    let mut parts = token.split(':');
    let host = parts.next().filter(|h| !h.is_empty())?;
    let port: String = parts.next()?.chars().take_while(char::is_ascii_digit).collect();
    let port: u16 = port.parse().ok()?;
    Some(format!("{host}:{port}"))
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для политик
////////////////////////////////////////////////////////////////////////////////

impl SelectionPolicy for RoundRobin {
    fn select(
        &self,
        candidates: &[String],
    ) -> usize {
        let mut next = self.next.lock();
        let i = *next % candidates.len();
        *next = next.wrapping_add(1);
        i
    }
}

impl SelectionPolicy for Random {
    fn select(
        &self,
        candidates: &[String],
    ) -> usize {
        rand::thread_rng().gen_range(0..candidates.len())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
