//! Runtime configuration.
//!
//! Priority: CLI / env var  >  TOML file at `{data_dir}/config.toml`  >
//! built-in default.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::error;

use crate::bootstrap;

const DEFAULT_LOG: &str = "info";
const DEFAULT_LOG_FORMAT: &str = "pretty";
const DEFAULT_GATEWAY_COMMAND: &str = "mcpstore-helper";

/// `{data_dir}/config.toml` — all fields are optional overrides.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// Log level filter string, e.g. "debug", "info,mcpstore=trace".
    log: Option<String>,
    /// Log output format: "pretty" (default) | "json".
    log_format: Option<String>,
    /// Executable for the native gateway helper.
    gateway_command: Option<String>,
    /// Arguments passed to the gateway helper.
    gateway_args: Option<Vec<String>>,
    /// Environment-ensure attempts at startup (default: 3, minimum 1).
    env_max_attempts: Option<u32>,
    /// Fixed delay between environment-ensure attempts, in milliseconds.
    env_retry_delay_ms: Option<u64>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Data directory for settings and the config file.
    pub data_dir: PathBuf,
    pub log: String,
    pub log_format: String,
    pub gateway_command: String,
    pub gateway_args: Vec<String>,
    pub env_max_attempts: u32,
    pub env_retry_delay: std::time::Duration,
}

impl StoreConfig {
    /// Resolve configuration from CLI overrides, the TOML file, and
    /// defaults, in that priority order.
    pub fn new(
        data_dir: Option<PathBuf>,
        log: Option<String>,
        gateway_command: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let toml = load_toml(&data_dir).unwrap_or_default();

        let env_retry_delay_ms = toml
            .env_retry_delay_ms
            .unwrap_or(bootstrap::ENV_RETRY_DELAY.as_millis() as u64);

        Self {
            log: log
                .or(toml.log)
                .unwrap_or_else(|| DEFAULT_LOG.to_string()),
            log_format: toml
                .log_format
                .unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_string()),
            gateway_command: gateway_command
                .or(toml.gateway_command)
                .unwrap_or_else(|| DEFAULT_GATEWAY_COMMAND.to_string()),
            gateway_args: toml.gateway_args.unwrap_or_default(),
            env_max_attempts: toml
                .env_max_attempts
                .unwrap_or(bootstrap::ENV_MAX_ATTEMPTS)
                .max(1),
            env_retry_delay: std::time::Duration::from_millis(env_retry_delay_ms),
            data_dir,
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/mcpstore
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("mcpstore");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("mcpstore");
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("mcpstore");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("mcpstore");
        }
    }

    PathBuf::from(".mcpstore")
}
