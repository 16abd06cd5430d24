//! REST adapter over the template registry
//!
//! Maps request paths onto the resolver entry points and error kinds onto
//! status codes.

pub mod config;
pub mod stats;
pub mod templates;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing,
};
use serde_json::json;

use crate::SharedState;
use crate::error::TemplateError;

// Re-export handlers
pub use config::reload_templates_endpoint;
pub use stats::{get_build_states, get_stats, root};
pub use templates::{
    get_branch_content, get_build_state, get_content, get_template, get_template_item,
    list_templates, resolve_path,
};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::get(root))
        .route("/api/stats", routing::get(get_stats))
        .route("/api/build-states", routing::get(get_build_states))
        .route("/api/reload", routing::post(reload_templates_endpoint))
        .route("/api/templates", routing::get(list_templates))
        .route("/api/templates/{template_id}", routing::get(get_template))
        .route(
            "/api/templates/{template_id}/items/{item_id}",
            routing::get(get_template_item),
        )
        .route(
            "/api/templates/{template_id}/items/{item_id}/states/{state}",
            routing::get(get_build_state),
        )
        .route(
            "/api/templates/{template_id}/items/{item_id}/states/{state}/content",
            routing::get(get_content),
        )
        .route(
            "/api/templates/{template_id}/items/{item_id}/states/{state}/branch-content",
            routing::get(get_branch_content),
        )
        .route("/api/resolve/{*path}", routing::get(resolve_path))
        .with_state(state)
}

pub fn status_for(err: &TemplateError) -> StatusCode {
    match err {
        TemplateError::TemplateNotFound(_) | TemplateError::ItemNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        TemplateError::InvalidBuildState(_) | TemplateError::InvalidPath(_) => {
            StatusCode::BAD_REQUEST
        }
        TemplateError::ContentNotConfigured { .. } => StatusCode::NO_CONTENT,
        TemplateError::InvalidDefinition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(err: &TemplateError) -> Response {
    let status = status_for(err);
    if status == StatusCode::NO_CONTENT {
        return status.into_response();
    }
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentKind;

    #[test]
    fn each_error_kind_has_its_own_status() {
        let cases = [
            (TemplateError::TemplateNotFound("x".into()), StatusCode::NOT_FOUND),
            (
                TemplateError::ItemNotFound {
                    template_id: "x".into(),
                    item_id: 1,
                },
                StatusCode::NOT_FOUND,
            ),
            (TemplateError::InvalidBuildState("bogus".into()), StatusCode::BAD_REQUEST),
            (
                TemplateError::ContentNotConfigured {
                    template_id: "x".into(),
                    item_id: 1,
                    state: "fixed".into(),
                    kind: ContentKind::Branch,
                },
                StatusCode::NO_CONTENT,
            ),
            (
                TemplateError::InvalidDefinition {
                    id: "x".into(),
                    reason: "no items".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                TemplateError::ConfigError("unreadable".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(status_for(&err), expected, "{}", err);
            assert_eq!(error_response(&err).status(), expected);
        }
    }
}
