//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from `.env` and environment variables.
//! Every value has a default so binaries and tests can start without a `.env`.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock, RwLockReadGuard};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    /// Lifetime of a QR session when the creator does not pass one.
    pub qr_default_duration_minutes: i64,
    /// Capacity of the notification hub's command queue.
    pub hub_queue_capacity: usize,
    /// Frames buffered per WebSocket client before a send counts as failed.
    pub ws_outbound_buffer: usize,
    pub ws_ping_seconds: u64,
}

static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Malformed numeric values fall back to their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            project_name: var_or("PROJECT_NAME", "qr-attendance"),
            log_level: var_or("LOG_LEVEL", "api=info"),
            log_file: var_or("LOG_FILE", "api.log"),
            log_to_stdout: var_or("LOG_TO_STDOUT", "false") == "true",
            database_path: var_or("DATABASE_PATH", "data/attendance.db"),
            host: var_or("HOST", "127.0.0.1"),
            port: parsed_or("PORT", 3000),
            qr_default_duration_minutes: parsed_or("QR_DEFAULT_DURATION_MINUTES", 30),
            hub_queue_capacity: parsed_or("HUB_QUEUE_CAPACITY", 256),
            ws_outbound_buffer: parsed_or("WS_OUTBOUND_BUFFER", 64),
            ws_ping_seconds: parsed_or("WS_PING_SECONDS", 30),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn global() -> RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            if let Ok(mut guard) = lock.write() {
                *guard = AppConfig::from_env();
            }
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_port(value: u16) {
        AppConfig::set_field(|cfg| cfg.port = value);
    }

    pub fn set_qr_default_duration_minutes(value: i64) {
        AppConfig::set_field(|cfg| cfg.qr_default_duration_minutes = value);
    }

    pub fn set_hub_queue_capacity(value: usize) {
        AppConfig::set_field(|cfg| cfg.hub_queue_capacity = value);
    }

    pub fn set_ws_outbound_buffer(value: usize) {
        AppConfig::set_field(|cfg| cfg.ws_outbound_buffer = value);
    }
}

// --- Free accessors used by binaries ---

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn qr_default_duration_minutes() -> i64 {
    AppConfig::global().qr_default_duration_minutes
}

pub fn hub_queue_capacity() -> usize {
    AppConfig::global().hub_queue_capacity.max(1)
}

pub fn ws_outbound_buffer() -> usize {
    AppConfig::global().ws_outbound_buffer.max(1)
}

pub fn ws_ping_seconds() -> u64 {
    AppConfig::global().ws_ping_seconds.max(1)
}
