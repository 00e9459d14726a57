//! Display state derived from the notification log.
//!
//! Pure functions: renderers call [`project`] whenever they observe a
//! log change (or on every request) and get a fresh view.

use chrono::{DateTime, Utc};

use crate::log::LogSnapshot;
use crate::notification::Notification;

/// Everything the notification panel needs to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    pub entries: Vec<EntryView>,
    pub badge: Badge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub group_id: String,
    /// `"<groupID> grew to <count>"` or `"<groupID> shrank to <count>"`.
    pub message: String,
    pub created_at_display: String,
    /// Failure reported by the autoscaler alongside the event.
    pub error: Option<String>,
}

/// Whether there is anything to look at. Depends only on log length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    HasAlerts,
    NoAlerts,
}

impl Badge {
    pub fn for_len(len: usize) -> Self {
        if len > 0 {
            Badge::HasAlerts
        } else {
            Badge::NoAlerts
        }
    }

    pub fn has_alerts(&self) -> bool {
        *self == Badge::HasAlerts
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Badge::HasAlerts => "badge-with-alerts",
            Badge::NoAlerts => "badge-with-no-alerts",
        }
    }
}

pub fn project(log: &LogSnapshot) -> NotificationView {
    NotificationView {
        entries: log.iter().map(EntryView::from_notification).collect(),
        badge: Badge::for_len(log.len()),
    }
}

impl EntryView {
    pub fn from_notification(n: &Notification) -> Self {
        let error = if n.is_error {
            Some(n.message.clone().unwrap_or_else(|| "scaling failed".to_string()))
        } else {
            None
        };

        Self {
            group_id: n.group_id.clone(),
            message: entry_message(n),
            created_at_display: format_created_at(&n.created_at),
            error,
        }
    }
}

pub fn entry_message(n: &Notification) -> String {
    let verb = if n.grew() { "grew" } else { "shrank" };
    format!("{} {verb} to {}", n.group_id, n.count)
}

fn format_created_at(created_at: &DateTime<Utc>) -> String {
    created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
