use std::path::PathBuf;

use modelschema_core::StoreConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.store.max_depth == 0 {
            return Err("store.max_depth must be at least 1".into());
        }
        if self.logging.level.trim().is_empty() {
            return Err("logging.level must not be empty".into());
        }
        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(format!("logging.level is not a valid filter: {e}"));
        }
        if let Some(path) = &self.catalog.path
            && path.as_os_str().is_empty()
        {
            return Err("catalog.path must not be empty".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "warn".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// Type catalog loaded when `--catalog` is not given.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

pub mod loader {
    use super::AppConfig;
    use anyhow::{Context, Result, bail};
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    const DEFAULT_CONFIG_FILE: &str = "modelschema.toml";

    /// Loads configuration from a file plus `MODELSCHEMA__*` environment overrides.
    ///
    /// An explicit `path` must exist; without one, `modelschema.toml` in the
    /// working directory is used when present.
    pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
        // Environment variable overrides, e.g., MODELSCHEMA__STORE__DUPLICATE_PROPERTIES=last_wins
        let env = Environment::with_prefix("MODELSCHEMA")
            .prefix_separator("__")
            .try_parsing(true)
            .separator("__");
        load_with_env(path, env)
    }

    pub(crate) fn load_with_env(path: Option<&Path>, env: Environment) -> Result<AppConfig> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                if !p.exists() {
                    bail!("Config file not found: {}", p.display());
                }
                builder = builder.add_source(File::from(p.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(env);

        let cfg = builder.build().context("config build error")?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .context("config deserialize error")?;
        merged.validate().map_err(anyhow::Error::msg)?;
        Ok(merged)
    }
}
