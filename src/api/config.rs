//! Template reload endpoint

use axum::{Json, extract::State as AxumState, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::{error, info};

use crate::{SharedState, reload_templates};

/// POST /api/reload - Re-read the templates file into the registry
/// Templates that are no longer in the file stay registered
pub async fn reload_templates_endpoint(AxumState(state): AxumState<SharedState>) -> impl IntoResponse {
    match reload_templates(&state).await {
        Ok(report) => {
            info!(
                "Templates reloaded from {:?}",
                state.config.templates_path
            );
            let registered: Vec<_> = report
                .registered
                .iter()
                .map(|(id, outcome)| json!({ "id": id, "result": outcome }))
                .collect();
            let rejected: Vec<_> = report
                .failures
                .iter()
                .map(|f| json!({ "id": f.id, "error": f.error.to_string() }))
                .collect();
            let status = if report.is_clean() { "success" } else { "partial" };

            Json(json!({
                "status": status,
                "registered": registered,
                "rejected": rejected,
                "total_templates": state.registry.count()
            }))
            .into_response()
        }
        Err(e) => {
            error!("Failed to reload templates: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::registry::TemplateRegistry;
    use crate::AppState;
    use axum::body::to_bytes;
    use std::sync::Arc;

    fn state_for(path: std::path::PathBuf) -> SharedState {
        let config = AppConfig {
            templates_path: path,
            ..AppConfig::default()
        };
        Arc::new(AppState::new(Arc::new(TemplateRegistry::new()), config))
    }

    #[tokio::test]
    async fn reload_reports_partial_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.toml");
        std::fs::write(
            &path,
            r#"
[[template]]
id = "good"
[[template.items]]
id = 1
[[template.items.states]]
state = "success"
content = "ok"

[[template]]
id = "bad"
"#,
        )
        .unwrap();

        let state = state_for(path);
        let resp = reload_templates_endpoint(AxumState(state.clone()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "partial");
        assert_eq!(body["registered"][0]["result"]["outcome"], "added");
        assert_eq!(body["rejected"][0]["id"], "bad");
        assert_eq!(state.registry.count(), 1);
    }

    #[tokio::test]
    async fn reload_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path().join("absent.toml"));
        let resp = reload_templates_endpoint(AxumState(state))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
