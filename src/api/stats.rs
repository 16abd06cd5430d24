//! Health, stats and build state catalog endpoints

use axum::{
    Json,
    extract::{Query, State as AxumState},
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

use crate::SharedState;
use crate::build_state::{self, BuildStateDescriptor};

/// Root health check endpoint
/// Supports ?format=json for a JSON response
pub async fn root(
    AxumState(state): AxumState<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if params.get("format").map(|s| s.as_str()) == Some("json") {
        Json(json!({
            "name": "webhook_templates",
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": state.start_time.elapsed().as_secs(),
            "total_templates": state.registry.count(),
            "status": "healthy"
        }))
        .into_response()
    } else {
        "webhook_templates - healthy".into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ServerStats {
    pub name: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub started_at: String,
}

#[derive(Debug, Serialize)]
pub struct TemplateStats {
    pub templates: usize,
    pub items: usize,
    /// Ordinary plus branch state entries across all items
    pub state_entries: usize,
    pub branch_state_entries: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub server: ServerStats,
    pub templates: TemplateStats,
}

/// GET /api/stats - Server uptime and registry totals
pub async fn get_stats(AxumState(state): AxumState<SharedState>) -> Json<StatsResponse> {
    let definitions = state.registry.all();
    let items = definitions.iter().flat_map(|d| d.items.iter());

    let templates = TemplateStats {
        templates: definitions.len(),
        items: items.clone().count(),
        state_entries: items
            .clone()
            .map(|i| i.states.len() + i.branch_states.len())
            .sum(),
        branch_state_entries: items.map(|i| i.branch_states.len()).sum(),
    };

    let server = ServerStats {
        name: "webhook_templates".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        started_at: state.started_at.to_rfc3339(),
    };

    Json(StatsResponse { server, templates })
}

/// GET /api/build-states - The build state catalog
pub async fn get_build_states() -> Json<serde_json::Value> {
    let states: Vec<BuildStateDescriptor> = build_state::all_states()
        .iter()
        .copied()
        .map(BuildStateDescriptor::from)
        .collect();

    Json(json!({
        "states": states,
        "count": states.len()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::registry::TemplateRegistry;
    use crate::{AppState, seed};
    use std::sync::Arc;

    #[tokio::test]
    async fn stats_count_seeded_templates() {
        let registry = TemplateRegistry::new();
        seed::register_seeds(&registry);
        let state = Arc::new(AppState::new(Arc::new(registry), AppConfig::default()));

        let Json(stats) = get_stats(AxumState(state)).await;
        assert_eq!(stats.templates.templates, seed::SEED_TEMPLATES.len());
        assert_eq!(stats.templates.items, seed::SEED_TEMPLATES.len() + 1);
        assert!(stats.templates.branch_state_entries > 0);
        assert!(stats.templates.state_entries > stats.templates.branch_state_entries);
    }

    #[tokio::test]
    async fn build_states_lists_catalog() {
        let Json(body) = get_build_states().await;
        assert_eq!(body["count"], build_state::all_states().len());
        assert_eq!(body["states"][0]["short_name"], "started");
        assert_eq!(body["states"][4]["notify_eligible"], false);
    }
}
