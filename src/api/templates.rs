//! Template API endpoints

use axum::{
    Json,
    extract::{Path, State as AxumState},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::error_response;
use crate::SharedState;
use crate::resolve::{ContentLookup, Resolved, TemplatePath};
use crate::template::ContentKind;

/// GET /api/templates - All registered templates with their count
pub async fn list_templates(AxumState(state): AxumState<SharedState>) -> impl IntoResponse {
    Json(state.resolver().list_templates())
}

/// GET /api/templates/{template_id}
pub async fn get_template(
    AxumState(state): AxumState<SharedState>,
    Path(template_id): Path<String>,
) -> Response {
    match state.resolver().get_template(&template_id) {
        Ok(template) => Json(template).into_response(),
        Err(e) => error_response(&e),
    }
}

// Item ids and content kinds arrive as raw segments and are only parsed once
// the template above them has been found.

/// GET /api/templates/{template_id}/items/{item_id}
pub async fn get_template_item(
    AxumState(state): AxumState<SharedState>,
    Path((template_id, item_id)): Path<(String, String)>,
) -> Response {
    resolved_response(&state, TemplatePath::template(template_id).item(item_id))
}

/// GET /api/templates/{template_id}/items/{item_id}/states/{state}
pub async fn get_build_state(
    AxumState(state): AxumState<SharedState>,
    Path((template_id, item_id, build_state)): Path<(String, String, String)>,
) -> Response {
    let path = TemplatePath::template(template_id)
        .item(item_id)
        .state(build_state);
    resolved_response(&state, path)
}

/// GET /api/templates/{template_id}/items/{item_id}/states/{state}/content
pub async fn get_content(
    AxumState(state): AxumState<SharedState>,
    Path((template_id, item_id, build_state)): Path<(String, String, String)>,
) -> Response {
    let path = TemplatePath::template(template_id)
        .item(item_id)
        .state(build_state)
        .kind(ContentKind::Ordinary);
    resolved_response(&state, path)
}

/// GET /api/templates/{template_id}/items/{item_id}/states/{state}/branch-content
pub async fn get_branch_content(
    AxumState(state): AxumState<SharedState>,
    Path((template_id, item_id, build_state)): Path<(String, String, String)>,
) -> Response {
    let path = TemplatePath::template(template_id)
        .item(item_id)
        .state(build_state)
        .kind(ContentKind::Branch);
    resolved_response(&state, path)
}

/// GET /api/resolve/{*path} - Resolves a `/`-separated template path of 1 to 4 segments
pub async fn resolve_path(
    AxumState(state): AxumState<SharedState>,
    Path(path): Path<String>,
) -> Response {
    match path.parse() {
        Ok(path) => resolved_response(&state, path),
        Err(e) => error_response(&e),
    }
}

fn resolved_response(state: &SharedState, path: TemplatePath) -> Response {
    match state.resolver().resolve(&path) {
        Ok(Resolved::Template(template)) => Json(template).into_response(),
        Ok(Resolved::Item(item)) => Json(item).into_response(),
        Ok(Resolved::BuildState(info)) => Json(info).into_response(),
        Ok(Resolved::Content(lookup)) => lookup_response(lookup),
        Err(e) => error_response(&e),
    }
}

fn lookup_response(lookup: ContentLookup) -> Response {
    match lookup.into_text() {
        Ok(text) => ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response(),
        Err(e) => {
            debug!("{}", e);
            StatusCode::NO_CONTENT.into_response()
        }
    }
}
