use std::path::PathBuf;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{Result, TemplateError};

const DEFAULT_LOG_FILTER: &str = "info";
const LOG_FILE_PREFIX: &str = "webhook_templates";

/// Daily rolling log files in a directory
pub struct FileLogger {
    log_directory: PathBuf,
    rotation: Rotation,
}

impl FileLogger {
    pub fn new(log_directory: PathBuf) -> Self {
        Self {
            log_directory,
            rotation: Rotation::DAILY,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn setup_file_logging(&self) -> Result<(NonBlocking, WorkerGuard)> {
        std::fs::create_dir_all(&self.log_directory).map_err(|e| {
            TemplateError::ConfigError(format!(
                "Failed to create log directory '{}': {}",
                self.log_directory.display(),
                e
            ))
        })?;

        let file_appender =
            RollingFileAppender::new(self.rotation.clone(), &self.log_directory, LOG_FILE_PREFIX);
        Ok(tracing_appender::non_blocking(file_appender))
    }
}

/// Installs the global subscriber: console output, plus log files when a
/// `FileLogger` is given. Keep the returned guard alive until shutdown so
/// buffered file output is flushed.
pub fn setup_logging(file_logger: Option<&FileLogger>) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, guard) = match file_logger {
        Some(logger) => {
            let (writer, guard) = logger.setup_file_logging()?;
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_logging_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");
        let logger = FileLogger::new(log_dir.clone()).with_rotation(Rotation::NEVER);
        let (_writer, _guard) = logger.setup_file_logging().unwrap();
        assert!(log_dir.is_dir());
    }
}
