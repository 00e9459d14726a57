//! autoscale-dashd — the autoscale dashboard daemon.
//!
//! Single binary that assembles:
//! - Group / template catalog (in memory, seeded from config)
//! - Notification hub (`/api/notifications`)
//! - Notification surface (self-healing stream client feeding the panel)
//! - REST API + dashboard
//!
//! # Usage
//!
//! ```text
//! autoscale-dashd serve --config dashboard.toml --listen 0.0.0.0:8080
//! ```

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use autoscale_dashboard::{DashboardState, MemoryCatalog, NotificationHub, build_router};
use autoscale_notify::{
    NotificationSurface, PageLocation, ReconnectPolicy, WsTransport, resolve_endpoint,
};

use crate::config::DashboardConfig;

#[derive(Parser)]
#[command(name = "autoscale-dashd", about = "Autoscale dashboard daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the dashboard, API and notification hub.
    Serve {
        /// Path to dashboard.toml. A missing file means defaults.
        #[arg(long, default_value = "dashboard.toml")]
        config: PathBuf,

        /// Address to listen on (overrides the config file).
        #[arg(long)]
        listen: Option<String>,

        /// Origin browsers load the dashboard from.
        #[arg(long)]
        public_url: Option<String>,

        /// Explicit notification stream endpoint.
        #[arg(long, env = "AUTOSCALE_WEBSOCKET_URL")]
        websocket_url: Option<String>,

        /// Upper bound of the reconnect delay, in milliseconds.
        #[arg(long)]
        max_jitter_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,autoscale=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            listen,
            public_url,
            websocket_url,
            max_jitter_ms,
        } => {
            let mut cfg = DashboardConfig::load(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            if let Some(listen) = listen {
                cfg.listen = listen;
            }
            if let Some(public_url) = public_url {
                cfg.public_url = public_url;
            }
            if let Some(websocket_url) = websocket_url {
                cfg.notifications.websocket_url = websocket_url;
            }
            if let Some(max_jitter_ms) = max_jitter_ms {
                cfg.notifications.max_jitter_ms = max_jitter_ms;
            }
            run_serve(cfg).await
        }
    }
}

async fn run_serve(cfg: DashboardConfig) -> anyhow::Result<()> {
    info!("autoscale dashboard starting");

    // ── Notification stream ────────────────────────────────────

    let page = PageLocation::parse(&cfg.public_url())?;
    let endpoint = resolve_endpoint(cfg.websocket_url(), &page);
    let mut surface = NotificationSurface::new(
        endpoint,
        WsTransport,
        ReconnectPolicy::from_millis(cfg.notifications.max_jitter_ms),
    );
    info!(
        endpoint = %surface.endpoint(),
        max_jitter_ms = cfg.notifications.max_jitter_ms,
        "notification surface initialized"
    );

    // ── Catalog + hub ──────────────────────────────────────────

    let catalog = MemoryCatalog::seeded(cfg.templates.clone(), cfg.groups.clone())?;
    info!(
        templates = cfg.templates.len(),
        groups = cfg.groups.len(),
        "catalog seeded"
    );
    let hub = NotificationHub::new(cfg.notifications.hub_capacity);

    let state = DashboardState {
        catalog: Arc::new(catalog),
        feed: surface.feed(),
        hub,
    };

    // ── Start API server ───────────────────────────────────────

    let router = build_router(state);
    let addr: SocketAddr = cfg
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {:?}", cfg.listen))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    // The hub may be the stream's own origin, so connect once it listens.
    surface.start();

    // Graceful shutdown on Ctrl-C. The surface goes first so its own
    // socket to the hub is closed before the server drains.
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
            surface.stop().await;
        })
        .await?;

    info!("autoscale dashboard stopped");
    Ok(())
}
