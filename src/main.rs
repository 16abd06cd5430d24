use std::sync::Arc;
use tracing::{error, info};
use webhook_templates::config::AppConfig;
use webhook_templates::logging::{FileLogger, setup_logging};
use webhook_templates::{AppState, api, bootstrap_registry};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let file_logger = config.log_dir.clone().map(FileLogger::new);
    // Held for the lifetime of the process so file logs are flushed
    let _log_guard = match setup_logging(file_logger.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Logging setup error: {}", e);
            std::process::exit(1);
        }
    };

    let registry = match bootstrap_registry(&config) {
        Ok(registry) => registry,
        Err(e) => {
            error!("Failed to load templates: {}", e);
            std::process::exit(1);
        }
    };
    info!("{} templates registered", registry.count());

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState::new(Arc::new(registry), config));
    let app = api::router(state);

    info!("Listening on {}", bind_address);
    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", bind_address, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
