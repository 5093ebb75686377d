use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибки кластерной маршрутизации.
#[derive(Debug, Clone)]
pub enum ClusterError {
    /// Узел больше не является лидером; сервер может указать нового
    NotLeader { leader: Option<String> },
    /// Узел данных недоступен
    NodeUnavailable { node: String, reason: String },
    /// Узел ещё не инициализирован
    NodeNotInitialized { node: String },
    /// Не осталось кандидатов для переключения
    AllNodesFailed { attempts: usize, last_error: String },
    /// Список узлов пуст
    NoCandidates,
}

impl std::fmt::Display for ClusterError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::NotLeader { leader: Some(l) } => write!(f, "Node is not the leader, new leader is {l}"),
            Self::NotLeader { leader: None } => write!(f, "Node is not the leader"),
            Self::NodeUnavailable { node, reason } => {
                write!(f, "Node {node} unavailable: {reason}")
            }
            Self::NodeNotInitialized { node } => {
                write!(f, "Node {node} isn't initialized yet")
            }
            Self::AllNodesFailed {
                attempts,
                last_error,
            } => write!(
                f,
                "All cluster nodes failed after {attempts} attempts, last error: {last_error}"
            ),
            Self::NoCandidates => write!(f, "Cluster node list is empty"),
        }
    }
}

impl std::error::Error for ClusterError {}

impl ErrorExt for ClusterError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotLeader { .. } => StatusCode::NotLeader,
            Self::NodeUnavailable { .. } => StatusCode::NodeUnavailable,
            Self::NodeNotInitialized { .. } => StatusCode::NodeNotInitialized,
            Self::AllNodesFailed { .. } => StatusCode::ClusterDown,
            Self::NoCandidates => StatusCode::InvalidArgs,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
