use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level application configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfigInner {
    pub database: DatabaseSettings,
    pub pool: PoolSettings,
    pub users: UserSettings,
    pub logging: LoggingSettings,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(flatten, default)]
    inner: Arc<AppConfigInner>,
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AppConfig {
    fn deref_mut(&mut self) -> &mut AppConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// In-memory store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub name: String,
}

/// Blocking pool sizing and backpressure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Concurrent blocking tasks. `None` means ten per available core.
    pub max_concurrency: Option<usize>,
    /// Waiting tasks before new work is shed. `None` keeps the pool default.
    pub queue_capacity: Option<usize>,
    /// Longest wait for a free worker, in milliseconds. `None` waits indefinitely.
    pub queue_timeout_ms: Option<u64>,
}

/// User business rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub min_name_length: usize,
    pub email_change_cooldown_days: u32,
    /// Delivery budget of the fire-and-forget welcome notification.
    pub welcome_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Module-directed filter such as `strata_users=debug`. Overrides `RUST_LOG`.
    pub filter: Option<String>,
    pub json: bool,
    /// Directory for rolling log files. Console only when unset.
    pub directory: Option<PathBuf>,
    pub rotation: LogRotation,
    /// Rolled files to keep. `None` keeps the logger default.
    pub max_files: Option<usize>,
}

/// How often rolling log files are started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

// --- Default ---

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { name: "strata".to_owned() }
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self { min_name_length: 2, email_change_cooldown_days: 30, welcome_timeout_ms: 5_000 }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            filter: None,
            json: false,
            directory: None,
            rotation: LogRotation::default(),
            max_files: None,
        }
    }
}
