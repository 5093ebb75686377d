use std::time::Duration;

use dolphindb_error::{ClientError, ClusterError, DolphinResult, StackError, StatusCode};
use tracing::{debug, info, warn};

use super::{is_variable_name, BehaviorOptions, ClusterConfig, DolphinConnection, Failover, Request};
use crate::{
    codec::{CodecConfig, DEFAULT_CHUNK_BYTES},
    model::Value,
    types::WireOrder,
};

/// Конфигурация клиента.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Адрес основного узла `host:port`
    pub address: String,
    /// Пользователь; пустое имя отключает вход
    pub user: String,
    pub password: String,
    /// Таймаут подключения
    pub connect_timeout: Duration,
    /// Таймаут чтения
    pub read_timeout: Duration,
    /// Таймаут записи
    pub write_timeout: Duration,
    pub behavior: BehaviorOptions,
    pub codec: CodecConfig,
    /// Размер куска при потоковой отправке аргументов
    pub upload_chunk_bytes: usize,
    /// Сколько кусков может ждать отправки
    pub upload_channel_capacity: usize,
    /// Узлы для переключения; `None` отключает переключение
    pub cluster: Option<ClusterConfig>,
}

/// Клиент DolphinDB.
///
/// Держит одну сессию. При настроенном кластере транспортная ошибка или
/// сигнал `<NotLeader>` переводят сессию на другой узел, после чего
/// неудавшийся запрос повторяется один раз.
pub struct DolphinClient {
    config: ClientConfig,
    connection: Option<DolphinConnection>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl DolphinClient {
    /// Подключается к узлу и, если `user` не пуст, выполняет вход.
    pub async fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
    ) -> DolphinResult<Self> {
        Self::connect_with(ClientConfig {
            address: format!("{host}:{port}"),
            user: user.to_string(),
            password: password.to_string(),
            ..ClientConfig::default()
        })
        .await
    }

    /// Подключается по готовой конфигурации.
    pub async fn connect_with(config: ClientConfig) -> DolphinResult<Self> {
        info!("Connecting to DolphinDB at {}", config.address);
        let connection = match open(&config, &config.address).await {
            Ok(conn) => conn,
            Err(err) => match (&config.cluster, Failover::classify(&err)) {
                (Some(cluster), Some(failover)) => {
                    warn!("Node {} unavailable: {err}", config.address);
                    switch_node(&config, cluster, Some(&config.address), failover.leader(), err)
                        .await?
                }
                _ => return Err(err),
            },
        };
        info!(
            "Connected to {}, session {}",
            connection.address(),
            connection.session_id()
        );
        Ok(Self {
            config,
            connection: Some(connection),
        })
    }

    /// Вход под другим пользователем в текущей сессии.
    pub async fn login(
        &mut self,
        user: &str,
        password: &str,
    ) -> DolphinResult<()> {
        let behavior = self.config.behavior.clone();
        let conn = self.connection_mut()?;
        login(conn, &behavior, user, password).await?;
        self.config.user = user.to_string();
        self.config.password = password.to_string();
        Ok(())
    }

    /// Выполняет скрипт и возвращает его результат, если он есть.
    pub async fn run_script(
        &mut self,
        script: &str,
    ) -> DolphinResult<Option<Value>> {
        debug!("Running script ({} bytes)", script.len());
        self.call(Request::script(script)).await
    }

    /// Вызывает функцию сервера с аргументами.
    pub async fn run_function(
        &mut self,
        name: &str,
        args: Vec<Value>,
    ) -> DolphinResult<Option<Value>> {
        debug!("Running function {name} with {} args", args.len());
        self.call(Request::function(name, args, WireOrder::default()))
            .await
    }

    /// Загружает значения в переменные сессии.
    ///
    /// Имена проверяются до отправки: буква, затем буквы, цифры и `_`.
    pub async fn upload<K, I>(
        &mut self,
        variables: I,
    ) -> DolphinResult<Option<Value>>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let (names, values): (Vec<String>, Vec<Value>) = variables
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .unzip();
        if let Some(name) = names.iter().find(|n| !is_variable_name(n)) {
            return Err(ClientError::InvalidVariableName { name: name.clone() }.into());
        }
        debug!("Uploading {} variables", names.len());
        self.call(Request::variables(&names, values, WireOrder::default()))
            .await
    }

    /// Проверяет текущую сессию скриптом `1+1`.
    ///
    /// Запрос идёт только в текущее соединение: ошибка не переключает узел.
    pub async fn is_connected(&mut self) -> bool {
        let behavior = self.config.behavior.clone();
        let Some(conn) = self.connection.as_mut() else {
            return false;
        };
        match conn.execute(&Request::script("1+1"), &behavior).await {
            Ok(response) => response.value.and_then(|v| v.get_int().ok()) == Some(2),
            Err(err) => {
                debug!("Session check on {} failed: {err}", conn.address());
                false
            }
        }
    }

    /// Переоткрывает сессию на текущем узле.
    pub async fn reconnect(&mut self) -> DolphinResult<()> {
        let address = self.address().to_string();
        if let Some(old) = self.connection.take() {
            debug!("Dropping session {} before reconnect", old.session_id());
        }
        self.connection = Some(open(&self.config, &address).await?);
        info!("Reconnected to {address}");
        Ok(())
    }

    /// Адрес узла текущей сессии.
    pub fn address(&self) -> &str {
        self.connection
            .as_ref()
            .map_or(self.config.address.as_str(), |c| c.address())
    }

    pub fn session_id(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.session_id())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn close(mut self) -> DolphinResult<()> {
        info!("Closing DolphinDB session at {}", self.address());
        match self.connection.take() {
            Some(conn) => conn.close().await,
            None => Ok(()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Внутренние методы и функции
////////////////////////////////////////////////////////////////////////////////

impl DolphinClient {
    fn connection_mut(&mut self) -> DolphinResult<&mut DolphinConnection> {
        self.connection
            .as_mut()
            .ok_or_else(|| ClientError::NotConnected.into())
    }

    async fn call(
        &mut self,
        request: Request,
    ) -> DolphinResult<Option<Value>> {
        let behavior = self.config.behavior.clone();
        let err = match self.connection_mut()?.execute(&request, &behavior).await {
            Ok(response) => return Ok(response.value),
            Err(err) => err,
        };

        let (Some(cluster), Some(failover)) = (&self.config.cluster, Failover::classify(&err))
        else {
            return Err(err);
        };
        warn!("Request to {} failed: {err}", self.address());

        let current = self.address().to_string();
        let conn = switch_node(&self.config, cluster, Some(&current), failover.leader(), err).await?;
        self.connection = Some(conn);

        info!("Retrying {} request on {}", request.kind(), self.address());
        let response = self.connection_mut()?.execute(&request, &behavior).await?;
        Ok(response.value)
    }
}

/// Открывает сессию на узле: рукопожатие и вход.
async fn open(
    config: &ClientConfig,
    address: &str,
) -> DolphinResult<DolphinConnection> {
    let mut conn = DolphinConnection::connect(address, config).await?;
    if !config.user.is_empty() {
        login(&mut conn, &config.behavior, &config.user, &config.password).await?;
    }
    Ok(conn)
}

async fn login(
    conn: &mut DolphinConnection,
    behavior: &BehaviorOptions,
    user: &str,
    password: &str,
) -> DolphinResult<()> {
    debug!("Logging in as {user}");
    let request = Request::script(&format!("login('{user}','{password}')"));
    match conn.execute(&request, behavior).await {
        Ok(_) => Ok(()),
        Err(err) if err.status_code() == StatusCode::ServerError => {
            Err(ClientError::AuthenticationFailed {
                user: user.to_string(),
                reason: err.to_string(),
            }
            .into())
        }
        Err(err) => Err(err),
    }
}

/// Обходит кандидатов, пока один из них не откроет сессию.
async fn switch_node(
    config: &ClientConfig,
    cluster: &ClusterConfig,
    current: Option<&str>,
    leader: Option<&str>,
    cause: StackError,
) -> DolphinResult<DolphinConnection> {
    let candidates = cluster.candidates(current, leader);
    if candidates.is_empty() {
        return Err(ClusterError::NoCandidates.into());
    }

    let mut last_error = cause;
    for (attempt, node) in candidates.iter().enumerate() {
        tokio::time::sleep(cluster.retry_backoff).await;
        info!("Switching to node {node} (attempt {})", attempt + 1);
        match open(config, node).await {
            Ok(conn) => return Ok(conn),
            Err(err) => {
                warn!("Node {node} failed: {err}");
                last_error = err;
            }
        }
    }

    Err(ClusterError::AllNodesFailed {
        attempts: candidates.len(),
        last_error: last_error.to_string(),
    }
    .into())
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для ClientConfig
////////////////////////////////////////////////////////////////////////////////

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "localhost:8848".to_string(),
            user: String::new(),
            password: String::new(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(10),
            behavior: BehaviorOptions::default(),
            codec: CodecConfig::default(),
            upload_chunk_bytes: DEFAULT_CHUNK_BYTES,
            upload_channel_capacity: 8,
            cluster: None,
        }
    }
}
