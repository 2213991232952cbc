//! Tests for configuration loading.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use bellbook::config::{BackoffConfig, ClientConfig, DEFAULT_BASE_URL};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 3] = ["BELLBOOK_BASE_URL", "BELLBOOK_HOME", "BELLBOOK_TIMEOUT_SECS"];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[test]
fn defaults_match_service_contract() {
    let config = ClientConfig::new();
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(
        config.backoff,
        BackoffConfig {
            initial: Duration::from_secs(3),
            max: Duration::from_secs(30),
        }
    );
    assert_eq!(config.query.stale_time, Duration::from_secs(120));
    assert_eq!(config.query.gc_time, Duration::from_secs(600));
    assert_eq!(config.session_stale_time, Duration::from_secs(300));
}

#[test]
fn from_env_applies_overrides() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);

    std::env::set_var("BELLBOOK_BASE_URL", "https://bellbook.example/api");
    std::env::set_var("BELLBOOK_HOME", "/tmp/bellbook-test-home");
    std::env::set_var("BELLBOOK_TIMEOUT_SECS", "7");

    let config = ClientConfig::from_env();
    assert_eq!(config.base_url, "https://bellbook.example/api");
    assert_eq!(config.credentials_dir, PathBuf::from("/tmp/bellbook-test-home"));
    assert_eq!(config.request_timeout, Duration::from_secs(7));
    assert_eq!(
        config.endpoint("/auth/me"),
        "https://bellbook.example/api/auth/me"
    );
}

#[test]
fn from_env_ignores_invalid_timeout() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);

    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
    std::env::set_var("BELLBOOK_TIMEOUT_SECS", "soon");

    let config = ClientConfig::from_env();
    assert_eq!(config.request_timeout, ClientConfig::new().request_timeout);
}

#[test]
fn clients_build_from_config() {
    let config = ClientConfig::new().with_request_timeout(Duration::from_secs(5));
    assert!(config.http_client().is_ok());
    assert!(config.streaming_client().is_ok());
}
