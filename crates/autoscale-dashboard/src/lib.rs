//! autoscale-dashboard — server-rendered web UI for the autoscaler.
//!
//! Lists scaling groups and server templates, and shows the live
//! notification panel fed by `autoscale-notify`. Also serves the
//! notification hub that pushes scaling events to dashboards.
//!
//! # Routes
//!
//! | Route | Handler |
//! |---|---|
//! | `/dashboard/` | Overview: groups, templates, notifications |
//! | `/dashboard/groups/:id` | Group detail with its scaling history |
//! | `/dashboard/templates` | Template list |
//! | `/dashboard/partials/notifications` | HTMX notification panel |
//! | `/api/v1/groups`, `/api/v1/templates` | Catalog CRUD (JSON) |
//! | `/api/v1/activity` | Report a scaling step (JSON) |
//! | `/api/notifications` | Notification websocket |

pub mod api;
pub mod catalog;
pub mod hub;
pub mod pages;
pub mod partials;
pub mod views;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use autoscale_notify::NotificationFeed;

pub use catalog::{Catalog, CatalogError, Group, MemoryCatalog, Template};
pub use hub::{NotificationHub, ScalingActivity};

/// Shared state for dashboard handlers.
#[derive(Clone)]
pub struct DashboardState {
    pub catalog: Arc<dyn Catalog>,
    pub feed: NotificationFeed,
    pub hub: NotificationHub,
}

/// Build the dashboard router (pages + partials).
pub fn dashboard_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(pages::overview))
        .route("/groups/{id}", get(pages::group_detail))
        .route("/templates", get(pages::templates))
        .route("/partials/notifications", get(partials::notifications))
        .with_state(state)
}

/// Build the complete router (REST + notification hub + dashboard).
pub fn build_router(state: DashboardState) -> Router {
    let api_routes = Router::new()
        .route("/groups", get(api::list_groups).post(api::create_group))
        .route("/groups/{id}", get(api::get_group).delete(api::delete_group))
        .route("/templates", get(api::list_templates).post(api::create_template))
        .route("/templates/{name}", get(api::get_template).delete(api::delete_template))
        .route("/activity", post(api::report_activity))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route(
            autoscale_notify::NOTIFICATIONS_PATH,
            get(hub::notifications_ws).with_state(state.clone()),
        )
        .nest("/dashboard", dashboard_router(state))
}
