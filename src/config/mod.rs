mod schema;

pub use schema::{
    Config, NotificationConfig, QualificationConfig, StoreConfig, DEFAULT_RETRIES, DEFAULT_TOP_K,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Get the config directory path (<config dir>/judge-desk/)
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("judge-desk")
}

/// Get the default config file path (<config dir>/judge-desk/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path,
///   and a missing default file means built-in defaults.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    parse_config(&config_content)
        .with_context(|| {
            format!(
                "Failed to parse config: invalid YAML in {}",
                config_path.display()
            )
        })
}

pub fn parse_config(content: &str) -> Result<Config> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_saphyr::from_str(content)?;
    Ok(config)
}

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.qualification.top_k == 0 {
        errors.push("qualification.top_k: must be at least 1".to_string());
    }

    if let Some(ref timeout) = config.store.timeout {
        if let Err(e) = humantime::parse_duration(timeout) {
            errors.push(format!("store.timeout: invalid duration '{}' - {}", timeout, e));
        }
    }

    if let Some(ref url) = config.store.url {
        if !is_http_url(url) {
            errors.push(format!("store.url: '{}' must start with http:// or https://", url));
        }
    }

    if let Some(ref webhook) = config.notifications.webhook {
        if !is_http_url(webhook) {
            errors.push(format!(
                "notifications.webhook: '{}' must start with http:// or https://",
                webhook
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        self.timeout
            .as_deref()
            .and_then(|raw| humantime::parse_duration(raw).ok())
            .unwrap_or(Duration::from_secs(10))
    }

    pub fn retries(&self) -> usize {
        self.retries.unwrap_or(DEFAULT_RETRIES)
    }

    pub fn local_path(&self) -> PathBuf {
        self.path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(crate::store::get_store_path)
    }
}
