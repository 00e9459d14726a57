//! Notification hub — the server side of `/api/notifications`.
//!
//! Scaling activity from the autoscaler is turned into `Notification`s
//! and fanned out to every connected websocket client, one JSON object
//! per text frame. Clients never send anything meaningful back; inbound
//! messages are read only to notice the close.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use autoscale_notify::Notification;

use crate::DashboardState;
use crate::catalog::Group;

/// One scaling step reported by the autoscaler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingActivity {
    #[serde(rename = "groupID")]
    pub group_id: String,
    #[serde(default)]
    pub delta: i64,
    #[serde(default)]
    pub count: i64,
    /// Set when the scaling step failed.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct NotificationHub {
    tx: broadcast::Sender<Notification>,
    next_id: Arc<AtomicU64>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Publish an activity for a known group to all connected clients.
    ///
    /// Steps with a zero delta are dropped, failed ones included. The
    /// display name comes from the stored group. A failed step carries
    /// its error text and reports neither delta nor count.
    pub fn publish(&self, activity: ScalingActivity, group: &Group) -> Option<Notification> {
        if activity.delta == 0 {
            debug!(group = %activity.group_id, "skipping scaling activity with zero delta");
            return None;
        }

        let (delta, count) = if activity.error.is_some() {
            (0, 0)
        } else {
            (activity.delta, activity.count)
        };
        let mut notification = Notification::new(activity.group_id, delta, count, Utc::now());
        notification.id = Some(format!("n-{}", self.next_id.fetch_add(1, Ordering::Relaxed)));
        notification.name = Some(group.name.clone());
        if let Some(error) = activity.error {
            notification.is_error = true;
            notification.message = Some(error);
        }

        match self.tx.send(notification.clone()) {
            Ok(receivers) => debug!(
                group = %notification.group_id,
                receivers,
                "notification published"
            ),
            Err(_) => debug!(group = %notification.group_id, "notification published with no listeners"),
        }
        Some(notification)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// GET /api/notifications (websocket upgrade)
pub async fn notifications_ws(
    ws: WebSocketUpgrade,
    State(state): State<DashboardState>,
) -> Response {
    // Subscribe before the handshake completes so nothing published right
    // after the client sees the socket open is missed.
    let rx = state.hub.subscribe();
    ws.on_upgrade(move |socket| stream_notifications(socket, rx))
}

async fn stream_notifications(mut socket: WebSocket, mut rx: broadcast::Receiver<Notification>) {
    info!("notification client connected");

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(notification) => match serde_json::to_string(&notification) {
                    Ok(json) => {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to encode notification"),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification client lagging, dropped notifications");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    info!("notification client disconnected");
}
