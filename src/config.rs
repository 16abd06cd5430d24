//! Process configuration read from the environment

use std::path::PathBuf;

use crate::error::{Result, TemplateError};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_TEMPLATES_PATH: &str = "webhook_templates.toml";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    /// TOML or JSON file with extra template definitions
    pub templates_path: PathBuf,
    /// Enables rolling file logs when set
    pub log_dir: Option<PathBuf>,
    pub load_seed_templates: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            templates_path: PathBuf::from(DEFAULT_TEMPLATES_PATH),
            log_dir: None,
            load_seed_templates: true,
        }
    }
}

impl AppConfig {
    /// Reads `BIND_ADDRESS`, `TEMPLATES_CONFIG`, `LOG_DIR` and
    /// `LOAD_SEED_TEMPLATES`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let load_seed_templates = match lookup("LOAD_SEED_TEMPLATES") {
            Some(value) => parse_flag("LOAD_SEED_TEMPLATES", &value)?,
            None => defaults.load_seed_templates,
        };

        Ok(Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            templates_path: lookup("TEMPLATES_CONFIG")
                .map(PathBuf::from)
                .unwrap_or(defaults.templates_path),
            log_dir: lookup("LOG_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            load_seed_templates,
        })
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(TemplateError::ConfigError(format!(
            "{} must be true or false, got '{}'",
            key, other
        ))),
    }
}
