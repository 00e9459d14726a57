//! End-to-end notification stream.
//!
//! Serves the full router on a loopback port and points a real
//! `NotificationSurface` at its `/api/notifications` hub.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;

use autoscale_dashboard::*;
use autoscale_notify::{
    ConnectionState, NotificationFeed, NotificationSurface, PageLocation, ReconnectPolicy,
    WsTransport, resolve_endpoint,
};

const WAIT: Duration = Duration::from_secs(10);

fn group(id: &str) -> Group {
    Group {
        id: id.to_string(),
        name: id.to_string(),
        base_name: id.to_string(),
        template_name: "small".to_string(),
        metric_type: String::new(),
        policy_type: String::new(),
    }
}

struct Server {
    location: PageLocation,
    hub: NotificationHub,
    shutdown: watch::Sender<bool>,
}

async fn serve() -> Server {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // The server-side feed is unused here; its surface is never started.
    let idle = NotificationSurface::new("ws://unused", WsTransport, ReconnectPolicy::default());
    let hub = NotificationHub::new(64);
    let state = DashboardState {
        catalog: Arc::new(MemoryCatalog::new()),
        feed: idle.feed(),
        hub: hub.clone(),
    };

    let (shutdown, mut rx) = watch::channel(false);
    tokio::spawn(async move {
        axum::serve(listener, build_router(state))
            .with_graceful_shutdown(async move {
                let _ = rx.changed().await;
            })
            .await
            .unwrap();
    });

    Server {
        location: PageLocation::new(false, addr.to_string()),
        hub,
        shutdown,
    }
}

async fn wait_for_state(feed: &NotificationFeed, want: ConnectionState) {
    let mut states = feed.state_watcher();
    tokio::time::timeout(WAIT, states.wait_for(|s| *s == want))
        .await
        .expect("timed out waiting for connection state")
        .unwrap();
}

async fn wait_for_len(feed: &mut NotificationFeed, len: usize) {
    tokio::time::timeout(WAIT, async {
        while feed.snapshot().len() < len {
            assert!(feed.changed().await, "feed closed");
        }
    })
    .await
    .expect("timed out waiting for notifications");
}

async fn wait_for_subscribers(hub: &NotificationHub, count: usize) {
    tokio::time::timeout(WAIT, async {
        while hub.subscriber_count() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for hub subscriber");
}

#[tokio::test]
async fn published_activity_reaches_the_panel() {
    let server = serve().await;
    let endpoint = resolve_endpoint(None, &server.location);
    assert!(endpoint.starts_with("ws://127.0.0.1:"));
    assert!(endpoint.ends_with("/api/notifications"));

    let mut surface = NotificationSurface::new(endpoint, WsTransport, ReconnectPolicy::default());
    let mut feed = surface.feed();
    surface.start();

    wait_for_state(&feed, ConnectionState::Open).await;
    wait_for_subscribers(&server.hub, 1).await;

    server.hub.publish(
        ScalingActivity {
            group_id: "web".to_string(),
            delta: 2,
            count: 5,
            error: None,
        },
        &group("web"),
    );
    server.hub.publish(
        ScalingActivity {
            group_id: "jobs".to_string(),
            delta: -1,
            count: 2,
            error: Some("droplet quota exceeded".to_string()),
        },
        &group("jobs"),
    );

    wait_for_len(&mut feed, 2).await;

    let view = feed.view();
    assert!(view.badge.has_alerts());
    assert_eq!(view.entries[0].message, "web grew to 5");
    assert_eq!(view.entries[1].message, "jobs shrank to 0");
    assert_eq!(view.entries[1].error.as_deref(), Some("droplet quota exceeded"));

    surface.stop().await;
    assert_eq!(feed.connection_state(), ConnectionState::Disconnected);
    assert_eq!(feed.view().entries.len(), 2);

    server.shutdown.send_replace(true);
}

#[tokio::test]
async fn reconnects_when_the_server_returns() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Nothing listens until the surface has already failed once.
    drop(listener);

    let endpoint = resolve_endpoint(None, &PageLocation::new(false, addr.to_string()));
    let mut surface = NotificationSurface::new(
        endpoint,
        WsTransport,
        ReconnectPolicy::from_millis(50),
    );
    let feed = surface.feed();
    surface.start();

    wait_for_state(&feed, ConnectionState::Reconnecting).await;

    let listener = TcpListener::bind(addr).await.unwrap();
    let hub = NotificationHub::new(16);
    let idle = NotificationSurface::new("ws://unused", WsTransport, ReconnectPolicy::default());
    let state = DashboardState {
        catalog: Arc::new(MemoryCatalog::new()),
        feed: idle.feed(),
        hub: hub.clone(),
    };
    let server = tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    wait_for_state(&feed, ConnectionState::Open).await;

    surface.stop().await;
    assert_eq!(feed.connection_state(), ConnectionState::Disconnected);
    server.abort();
}
