use std::{path::Path, sync::Arc, time::Duration};

use config::{Config, Environment, File};
use dolphindb_error::{ConfigError, DolphinResult};
use serde::Deserialize;

use crate::{
    client::{BehaviorOptions, ClientConfig, ClusterConfig, Random, RoundRobin, SelectionPolicy},
    codec::{CodecConfig, DEFAULT_CHUNK_BYTES},
};

/// Префикс переменных окружения: `DOLPHINDB_HOST`, `DOLPHINDB_PORT`, ...
pub const ENV_PREFIX: &str = "DOLPHINDB";

/// Политика выбора узла в настройках.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    RoundRobin,
    Random,
}

/// Настройки клиента.
///
/// Вложенные поля задаются через `__`: `DOLPHINDB_BEHAVIOR__FETCH_SIZE`.
/// Список узлов кластера задаётся через запятую в `DOLPHINDB_CLUSTER_NODES`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub behavior: BehaviorOptions,
    pub codec: CodecConfig,
    pub upload_chunk_bytes: usize,
    pub upload_channel_capacity: usize,
    pub cluster_nodes: Vec<String>,
    pub cluster_policy: PolicyKind,
    pub retry_backoff_ms: u64,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ClientSettings {
    /// Загружает настройки из окружения поверх значений по умолчанию.
    pub fn load() -> DolphinResult<Self> {
        Self::build(None)
    }

    /// Загружает настройки из файла, затем применяет окружение.
    pub fn load_from(path: &Path) -> DolphinResult<Self> {
        Self::build(Some(path))
    }

    /// Адрес основного узла.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Проверяет настройки и собирает конфигурацию клиента.
    pub fn to_client_config(&self) -> DolphinResult<ClientConfig> {
        if self.host.is_empty() {
            return Err(invalid("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(invalid("port", "must not be 0"));
        }
        if self.upload_chunk_bytes == 0 {
            return Err(invalid("upload_chunk_bytes", "must be positive"));
        }
        self.behavior.validate()?;

        let cluster = if self.cluster_nodes.is_empty() {
            None
        } else {
            let policy: Arc<dyn SelectionPolicy> = match self.cluster_policy {
                PolicyKind::RoundRobin => Arc::new(RoundRobin::default()),
                PolicyKind::Random => Arc::new(Random),
            };
            Some(
                ClusterConfig::new(self.cluster_nodes.clone())
                    .with_policy(policy)
                    .with_backoff(Duration::from_millis(self.retry_backoff_ms)),
            )
        };

        Ok(ClientConfig {
            address: self.address(),
            user: self.user.clone(),
            password: self.password.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            behavior: self.behavior.clone(),
            codec: self.codec.clone(),
            upload_chunk_bytes: self.upload_chunk_bytes,
            upload_channel_capacity: self.upload_channel_capacity,
            cluster,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Внутренние методы и функции
////////////////////////////////////////////////////////////////////////////////

impl ClientSettings {
    fn build(path: Option<&Path>) -> DolphinResult<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("host", defaults.host)
            .map_err(load_error)?
            .set_default("port", i64::from(defaults.port))
            .map_err(load_error)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let cfg = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cluster_nodes")
                    .try_parsing(true),
            )
            .build()
            .map_err(load_error)?;

        cfg.try_deserialize().map_err(load_error)
    }
}

fn load_error(err: config::ConfigError) -> dolphindb_error::StackError {
    ConfigError::Load {
        reason: err.to_string(),
    }
    .into()
}

fn invalid(
    field: &str,
    reason: &str,
) -> dolphindb_error::StackError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для ClientSettings
////////////////////////////////////////////////////////////////////////////////

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8848,
            user: String::new(),
            password: String::new(),
            connect_timeout_ms: 5_000,
            read_timeout_ms: 30_000,
            write_timeout_ms: 10_000,
            behavior: BehaviorOptions::default(),
            codec: CodecConfig::default(),
            upload_chunk_bytes: DEFAULT_CHUNK_BYTES,
            upload_channel_capacity: 8,
            cluster_nodes: Vec::new(),
            cluster_policy: PolicyKind::default(),
            retry_backoff_ms: 100,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use dolphindb_error::StatusCode;

    use super::*;

    /// Тест проверяет, что настройки по умолчанию дают рабочую конфигурацию
    /// без кластера.
    #[test]
    fn test_default_to_client_config() {
        let config = ClientSettings::default().to_client_config().unwrap();
        assert_eq!(config.address, "localhost:8848");
        assert_eq!(config.read_timeout, Duration::from_secs(30));
        assert!(config.cluster.is_none());
        assert_eq!(config.behavior, BehaviorOptions::default());
    }

    /// Тест проверяет сборку конфигурации кластера.
    #[test]
    fn test_cluster_settings() {
        let settings = ClientSettings {
            cluster_nodes: vec!["a:1".into(), "b:2".into()],
            cluster_policy: PolicyKind::Random,
            retry_backoff_ms: 5,
            ..ClientSettings::default()
        };
        let cluster = settings.to_client_config().unwrap().cluster.unwrap();
        assert_eq!(cluster.nodes, vec!["a:1", "b:2"]);
        assert_eq!(cluster.retry_backoff, Duration::from_millis(5));
    }

    /// Тест проверяет отказ для недопустимых значений.
    #[test]
    fn test_invalid_settings() {
        let zero_port = ClientSettings {
            port: 0,
            ..ClientSettings::default()
        };
        let err = zero_port.to_client_config().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidConfig);

        let small_fetch = ClientSettings {
            behavior: BehaviorOptions {
                fetch_size: 10,
                ..BehaviorOptions::default()
            },
            ..ClientSettings::default()
        };
        let err = small_fetch.to_client_config().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidArgs);
    }
}
