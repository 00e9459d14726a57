//! HTMX partial endpoints.
//!
//! These return HTML fragments (not full pages) for HTMX to swap
//! into specific DOM sections, enabling live updates without full reloads.

use askama::Template;
use axum::extract::State;
use axum::response::Html;

use crate::DashboardState;
use crate::pages::render;
use crate::views::NotificationPanel;

#[derive(Template)]
#[template(path = "_partials/notifications.html")]
struct NotificationsPartial {
    panel: NotificationPanel,
}

/// Re-projected from the log on every poll.
pub async fn notifications(State(state): State<DashboardState>) -> Html<String> {
    render(NotificationsPartial {
        panel: NotificationPanel::from_feed(&state.feed),
    })
}
