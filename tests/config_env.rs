use std::{env, io::Write, time::Duration};

use dolphindb::{config::PolicyKind, ClientSettings, StatusCode};
use serial_test::serial;

const VARS: &[&str] = &[
    "DOLPHINDB_HOST",
    "DOLPHINDB_PORT",
    "DOLPHINDB_USER",
    "DOLPHINDB_PASSWORD",
    "DOLPHINDB_READ_TIMEOUT_MS",
    "DOLPHINDB_BEHAVIOR__FETCH_SIZE",
    "DOLPHINDB_BEHAVIOR__PRIORITY",
    "DOLPHINDB_CLUSTER_NODES",
    "DOLPHINDB_CLUSTER_POLICY",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

/// Тест проверяет значения по умолчанию без переменных окружения.
#[test]
#[serial]
fn defaults_without_env() {
    clear_env();
    let settings = ClientSettings::load().unwrap();
    assert_eq!(settings, ClientSettings::default());
    assert_eq!(settings.address(), "localhost:8848");
}

/// Тест проверяет переопределения из окружения, включая вложенные поля
/// и список узлов.
#[test]
#[serial]
fn env_overrides() {
    clear_env();
    env::set_var("DOLPHINDB_HOST", "10.0.0.7");
    env::set_var("DOLPHINDB_PORT", "8902");
    env::set_var("DOLPHINDB_USER", "admin");
    env::set_var("DOLPHINDB_PASSWORD", "123456");
    env::set_var("DOLPHINDB_READ_TIMEOUT_MS", "1500");
    env::set_var("DOLPHINDB_BEHAVIOR__FETCH_SIZE", "10000");
    env::set_var("DOLPHINDB_BEHAVIOR__PRIORITY", "8");
    env::set_var("DOLPHINDB_CLUSTER_NODES", "10.0.0.7:8902,10.0.0.8:8902");
    env::set_var("DOLPHINDB_CLUSTER_POLICY", "random");

    let settings = ClientSettings::load();
    clear_env();
    let settings = settings.unwrap();

    assert_eq!(settings.address(), "10.0.0.7:8902");
    assert_eq!(settings.password, "123456");
    assert_eq!(settings.behavior.fetch_size, 10_000);
    assert_eq!(settings.behavior.priority, 8);
    assert_eq!(settings.behavior.parallelism, 64);
    assert_eq!(settings.cluster_policy, PolicyKind::Random);

    let config = settings.to_client_config().unwrap();
    assert_eq!(config.user, "admin");
    assert_eq!(config.read_timeout, Duration::from_millis(1500));
    assert_eq!(
        config.cluster.unwrap().nodes,
        vec!["10.0.0.7:8902", "10.0.0.8:8902"]
    );
}

/// Тест проверяет чтение файла настроек с переопределением из окружения.
#[test]
#[serial]
fn file_then_env() {
    clear_env();
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "host = \"db.local\"\nport = 9000\n[behavior]\nparallelism = 16"
    )
    .unwrap();
    env::set_var("DOLPHINDB_PORT", "9100");

    let settings = ClientSettings::load_from(file.path());
    clear_env();
    let settings = settings.unwrap();
    assert_eq!(settings.address(), "db.local:9100");
    assert_eq!(settings.behavior.parallelism, 16);
}

/// Тест проверяет ошибку для нечислового порта.
#[test]
#[serial]
fn bad_port() {
    clear_env();
    env::set_var("DOLPHINDB_PORT", "eighty");
    let err = ClientSettings::load().unwrap_err();
    clear_env();
    assert_eq!(err.status_code(), StatusCode::InvalidConfig);
}
