pub mod api;
pub mod build_state;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod resolve;
pub mod seed;
pub mod source;
pub mod template;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::Result;
use crate::registry::{BulkRegistration, TemplateRegistry};
use crate::resolve::TemplateResolver;
use crate::source::FileSource;

pub use crate::build_state::BuildState;
pub use crate::error::TemplateError;
pub use crate::template::{ContentKind, TemplateContent, TemplateDefinition, TemplateItem};

pub struct AppState {
    /// Serializes reloads; readers never take it
    pub reload_lock: Mutex<()>,
    pub registry: Arc<TemplateRegistry>,
    pub config: AppConfig,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(registry: Arc<TemplateRegistry>, config: AppConfig) -> Self {
        Self {
            reload_lock: Mutex::new(()),
            registry,
            config,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn resolver(&self) -> TemplateResolver<'_> {
        TemplateResolver::new(&self.registry)
    }

    pub fn templates_source(&self) -> FileSource {
        FileSource::new(&self.config.templates_path)
    }
}

pub type SharedState = Arc<AppState>;

/// Fills a fresh registry at startup: built-in templates first, then the
/// definitions file if it exists, so file entries override seeds with the
/// same id.
pub fn bootstrap_registry(config: &AppConfig) -> Result<TemplateRegistry> {
    let registry = TemplateRegistry::new();

    if config.load_seed_templates {
        seed::register_seeds(&registry);
    }

    let source = FileSource::new(&config.templates_path);
    if source.exists() {
        let report = registry.load_from(&source)?;
        log_bulk_report(&source, &report);
    } else {
        info!(
            "No templates file at {:?}, using built-in templates only",
            config.templates_path
        );
    }

    Ok(registry)
}

/// Re-reads the definitions file into the live registry.
pub async fn reload_templates(state: &AppState) -> Result<BulkRegistration> {
    let _guard = state.reload_lock.lock().await;
    let source = state.templates_source();
    let definitions = source.load_definitions_async().await?;
    let report = state.registry.register_many(definitions);
    log_bulk_report(&source, &report);
    Ok(report)
}

fn log_bulk_report(source: &FileSource, report: &BulkRegistration) {
    info!(
        "Loaded {} templates from {:?}",
        report.registered.len(),
        source.path()
    );
    for failure in &report.failures {
        warn!("Template '{}' rejected: {}", failure.id, failure.error);
    }
}
