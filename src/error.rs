use std::io;

use crate::template::ContentKind;

/// Error type for template registration and resolution
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Invalid template definition '{id}': {reason}")]
    InvalidDefinition { id: String, reason: String },

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template item {item_id} not found in template '{template_id}'")]
    ItemNotFound { template_id: String, item_id: u32 },

    #[error("Unknown build state: {0}")]
    InvalidBuildState(String),

    #[error("No {kind} content configured for state '{state}' in template '{template_id}' item {item_id}")]
    ContentNotConfigured {
        template_id: String,
        item_id: u32,
        state: String,
        kind: ContentKind,
    },

    #[error("Invalid template path: {0}")]
    InvalidPath(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

impl TemplateError {
    pub(crate) fn invalid(id: &str, reason: impl Into<String>) -> Self {
        TemplateError::InvalidDefinition {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the "nothing configured" negative result, which callers
    /// usually treat as an empty answer rather than a failure.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, TemplateError::ContentNotConfigured { .. })
    }
}

/// Helper type for Results that use TemplateError
pub type Result<T> = std::result::Result<T, TemplateError>;
