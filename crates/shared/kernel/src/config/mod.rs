use config::{Config, ConfigBuilder, Environment, File, Map, Source, builder::DefaultState};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `STRATA__POOL__MAX_CONCURRENCY=8`.
pub const ENV_PREFIX: &str = "STRATA";
const DEFAULT_CONFIG_FILE: &str = "strata";

/// Custom error type for config loading.
#[strata_derive::strata_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Layered configuration loader: a required file, then `STRATA__` environment overrides.
///
/// 1. **Base File**: the format follows the extension (`.toml`, `.yaml`, `.json`). Without a
///    path, `strata.{toml,yaml,json}` in the working directory is used.
/// 2. **Environment Overrides**: `STRATA__SECTION__KEY` maps to `section.key`. Values are
///    parsed, so `STRATA__LOGGING__JSON=true` yields a boolean.
///
/// # Errors
/// Returns [`ConfigError::Config`] when the file is missing or unreadable, or the merged
/// values do not deserialize into `T`.
///
/// # Example
/// ```rust,ignore
/// use strata_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct Settings {
///     port: u16,
/// }
///
/// let cfg: Settings = load_config(Some("config/local.toml")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());
    load_layered(Some(&effective_path), None)
}

/// Like [`load_config`], but starts from `T::default()` when no file is given.
///
/// Environment overrides still apply on top of the defaults.
///
/// # Errors
/// See [`load_config`].
pub fn load_config_or_default<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    match path {
        Some(path) => load_layered(Some(path.as_ref()), None),
        None => load_env_or_default(None),
    }
}

/// `env` replaces the process environment when set.
pub(crate) fn load_layered<T>(
    path: Option<&Path>,
    env: Option<Map<String, String>>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let mut builder = Config::builder();
    if let Some(path) = path {
        info!(path = %path.display(), "Loading configuration");
        builder = builder.add_source(File::from(path).required(true));
    }

    with_env(builder, env)
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}

pub(crate) fn load_env_or_default<T>(env: Option<Map<String, String>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    let config = with_env(Config::builder(), env).build().context("Failed to build config")?;
    let overrides = config.collect().context("Failed to read environment overrides")?;
    if overrides.is_empty() {
        return Ok(T::default());
    }

    info!(keys = overrides.len(), "Loading configuration from environment only");
    config.try_deserialize::<T>().context("Failed to deserialize config")
}

fn with_env(
    builder: ConfigBuilder<DefaultState>,
    env: Option<Map<String, String>>,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(env),
    )
}
