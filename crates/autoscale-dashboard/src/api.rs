//! REST API handlers.
//!
//! Each handler reads/writes via the `Catalog` and returns JSON responses.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::catalog::{CatalogError, Group, Template};
use crate::hub::ScalingActivity;
use crate::DashboardState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn catalog_error(e: CatalogError) -> axum::response::Response {
    let status = match e {
        CatalogError::AlreadyExists { .. } | CatalogError::TemplateInUse { .. } => StatusCode::CONFLICT,
        CatalogError::Invalid { .. } => StatusCode::BAD_REQUEST,
    };
    error_response(&e.to_string(), status).into_response()
}

// ── Groups ─────────────────────────────────────────────────────

/// GET /api/v1/groups
pub async fn list_groups(State(state): State<DashboardState>) -> impl IntoResponse {
    match state.catalog.list_groups() {
        Ok(groups) => ApiResponse::ok(groups).into_response(),
        Err(e) => catalog_error(e),
    }
}

/// GET /api/v1/groups/:id
pub async fn get_group(
    State(state): State<DashboardState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.catalog.get_group(&id) {
        Ok(Some(group)) => ApiResponse::ok(group).into_response(),
        Ok(None) => error_response("group not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => catalog_error(e),
    }
}

/// POST /api/v1/groups
pub async fn create_group(
    State(state): State<DashboardState>,
    Json(group): Json<Group>,
) -> impl IntoResponse {
    match state.catalog.create_group(group) {
        Ok(group) => (StatusCode::CREATED, ApiResponse::ok(group)).into_response(),
        Err(e) => catalog_error(e),
    }
}

/// DELETE /api/v1/groups/:id
pub async fn delete_group(
    State(state): State<DashboardState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.catalog.delete_group(&id) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response("group not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => catalog_error(e),
    }
}

// ── Templates ──────────────────────────────────────────────────

/// GET /api/v1/templates
pub async fn list_templates(State(state): State<DashboardState>) -> impl IntoResponse {
    match state.catalog.list_templates() {
        Ok(templates) => ApiResponse::ok(templates).into_response(),
        Err(e) => catalog_error(e),
    }
}

/// GET /api/v1/templates/:name
pub async fn get_template(
    State(state): State<DashboardState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.catalog.get_template(&name) {
        Ok(Some(template)) => ApiResponse::ok(template).into_response(),
        Ok(None) => error_response("template not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => catalog_error(e),
    }
}

/// POST /api/v1/templates
pub async fn create_template(
    State(state): State<DashboardState>,
    Json(template): Json<Template>,
) -> impl IntoResponse {
    match state.catalog.create_template(template) {
        Ok(template) => (StatusCode::CREATED, ApiResponse::ok(template)).into_response(),
        Err(e) => catalog_error(e),
    }
}

/// DELETE /api/v1/templates/:name
pub async fn delete_template(
    State(state): State<DashboardState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.catalog.delete_template(&name) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response("template not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => catalog_error(e),
    }
}

// ── Activity ───────────────────────────────────────────────────

/// POST /api/v1/activity
///
/// Entry point for the autoscaler to report a scaling step. The group
/// must exist in the catalog. Steps with a zero delta are accepted but
/// not broadcast.
pub async fn report_activity(
    State(state): State<DashboardState>,
    Json(activity): Json<ScalingActivity>,
) -> impl IntoResponse {
    if activity.group_id.is_empty() {
        return error_response("groupID is required", StatusCode::BAD_REQUEST).into_response();
    }

    let group = match state.catalog.get_group(&activity.group_id) {
        Ok(Some(group)) => group,
        Ok(None) => return error_response("group not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => return catalog_error(e),
    };

    let published = state.hub.publish(activity, &group);
    (StatusCode::ACCEPTED, ApiResponse::ok(published)).into_response()
}
