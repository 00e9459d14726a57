//! View types for dashboard template rendering.
//!
//! These types are purpose-built for Askama templates: they carry
//! pre-formatted strings and computed fields so templates stay simple.

use autoscale_notify::{
    ConnectionState, EntryView, LogSnapshot, NotificationFeed, NotificationView, project,
};

use crate::catalog::{Group, Template};

// ── Notification Panel ──────────────────────────────────────────

pub struct NotificationPanel {
    pub badge_class: &'static str,
    pub has_alerts: bool,
    pub count: usize,
    pub entries: Vec<EntryView>,
    pub connection: &'static str,
    pub connection_color: &'static str,
}

impl NotificationPanel {
    pub fn from_feed(feed: &NotificationFeed) -> Self {
        Self::from_view(feed.view(), feed.connection_state())
    }

    pub fn from_view(view: NotificationView, state: ConnectionState) -> Self {
        Self {
            badge_class: view.badge.css_class(),
            has_alerts: view.badge.has_alerts(),
            count: view.entries.len(),
            entries: view.entries,
            connection: state.as_str(),
            connection_color: connection_color(state),
        }
    }
}

pub fn connection_color(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Open => "text-emerald-400",
        ConnectionState::Connecting => "text-sky-400",
        ConnectionState::Reconnecting => "text-amber-400",
        ConnectionState::Closing | ConnectionState::Disconnected => "text-slate-500",
    }
}

// ── Group View ──────────────────────────────────────────────────

pub struct GroupRow {
    pub id: String,
    pub name: String,
    pub base_name: String,
    pub template_name: String,
    pub metric_type: String,
    pub policy_type: String,
    /// Latest scaling message seen for this group, if any.
    pub last_event: Option<String>,
}

impl GroupRow {
    pub fn from_group(group: &Group, log: &LogSnapshot) -> Self {
        let last_event = log
            .iter()
            .rev()
            .find(|n| n.group_id == group.id)
            .map(|n| EntryView::from_notification(n).message);

        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            base_name: group.base_name.clone(),
            template_name: group.template_name.clone(),
            metric_type: display_or_dash(&group.metric_type),
            policy_type: display_or_dash(&group.policy_type),
            last_event,
        }
    }
}

pub fn build_group_rows(groups: &[Group], log: &LogSnapshot) -> Vec<GroupRow> {
    groups.iter().map(|g| GroupRow::from_group(g, log)).collect()
}

/// Notifications for a single group, in arrival order.
pub fn group_entries(group_id: &str, log: &LogSnapshot) -> Vec<EntryView> {
    project(log)
        .entries
        .into_iter()
        .filter(|e| e.group_id == group_id)
        .collect()
}

// ── Template View ───────────────────────────────────────────────

pub struct TemplateRow {
    pub name: String,
    pub region: String,
    pub size: String,
    pub image: String,
    pub ssh_key_count: usize,
}

impl TemplateRow {
    pub fn from_template(template: &Template) -> Self {
        Self {
            name: template.name.clone(),
            region: template.region.clone(),
            size: template.size.clone(),
            image: template.image.clone(),
            ssh_key_count: template.ssh_keys.len(),
        }
    }
}

fn display_or_dash(value: &str) -> String {
    if value.is_empty() {
        "—".to_string()
    } else {
        value.to_string()
    }
}
