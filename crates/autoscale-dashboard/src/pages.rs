//! Dashboard page handlers.
//!
//! Each handler reads the catalog and the notification feed, builds view
//! types, and renders an Askama template. HTMX partials are in `partials.rs`.

use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::DashboardState;
use crate::views::*;

pub(crate) fn render<T: Template>(tmpl: T) -> Html<String> {
    Html(tmpl.render().unwrap_or_else(|e| {
        format!("<pre>Template error: {e}</pre>")
    }))
}

// ── Overview ────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "overview.html")]
struct OverviewTemplate {
    active_page: &'static str,
    groups: Vec<GroupRow>,
    templates: Vec<TemplateRow>,
    panel: NotificationPanel,
}

pub async fn overview(State(state): State<DashboardState>) -> Html<String> {
    let groups = state.catalog.list_groups().unwrap_or_default();
    let templates = state.catalog.list_templates().unwrap_or_default();
    let log = state.feed.snapshot();

    render(OverviewTemplate {
        active_page: "overview",
        groups: build_group_rows(&groups, &log),
        templates: templates.iter().map(TemplateRow::from_template).collect(),
        panel: NotificationPanel::from_feed(&state.feed),
    })
}

// ── Group Detail ────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "group_detail.html")]
struct GroupDetailTemplate {
    active_page: &'static str,
    group: GroupRow,
    template: Option<TemplateRow>,
    entries: Vec<autoscale_notify::EntryView>,
    panel: NotificationPanel,
}

pub async fn group_detail(
    State(state): State<DashboardState>,
    Path(id): Path<String>,
) -> Response {
    let group = match state.catalog.get_group(&id) {
        Ok(Some(group)) => group,
        Ok(None) => return (StatusCode::NOT_FOUND, Html("group not found".to_string())).into_response(),
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(e.to_string())).into_response();
        }
    };

    let template = state
        .catalog
        .get_template(&group.template_name)
        .ok()
        .flatten()
        .map(|t| TemplateRow::from_template(&t));
    let log = state.feed.snapshot();

    render(GroupDetailTemplate {
        active_page: "groups",
        group: GroupRow::from_group(&group, &log),
        template,
        entries: group_entries(&group.id, &log),
        panel: NotificationPanel::from_feed(&state.feed),
    })
    .into_response()
}

// ── Templates ───────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "templates.html")]
struct TemplatesTemplate {
    active_page: &'static str,
    templates: Vec<TemplateRow>,
    panel: NotificationPanel,
}

pub async fn templates(State(state): State<DashboardState>) -> Html<String> {
    let templates = state.catalog.list_templates().unwrap_or_default();

    render(TemplatesTemplate {
        active_page: "templates",
        templates: templates.iter().map(TemplateRow::from_template).collect(),
        panel: NotificationPanel::from_feed(&state.feed),
    })
}
