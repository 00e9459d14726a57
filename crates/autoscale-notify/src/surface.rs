//! Notification surface — the lifecycle owner for one dashboard session.
//!
//! Composes the log, the supervisor task and the read-only feed handed to
//! renderers. `start` opens the stream on first display; `stop` tears it
//! down on session end.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backoff::ReconnectPolicy;
use crate::log::{EventIngestion, LogSnapshot, LogWatcher};
use crate::machine::{ConnectionMachine, ConnectionState};
use crate::projector::{project, NotificationView};
use crate::supervisor::Supervisor;
use crate::transport::Transport;

/// Read-only access to the live notification state.
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    log: LogWatcher,
    state: watch::Receiver<ConnectionState>,
}

impl NotificationFeed {
    pub fn snapshot(&self) -> LogSnapshot {
        self.log.snapshot()
    }

    /// Project the current log into display state.
    pub fn view(&self) -> NotificationView {
        project(&self.log.snapshot())
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Wait for the next log append; `false` once the surface is gone.
    pub async fn changed(&mut self) -> bool {
        self.log.changed().await
    }

    /// Watch connection state transitions.
    pub fn state_watcher(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

enum Phase<T: Transport> {
    Idle(Supervisor<T, EventIngestion>),
    Running(JoinHandle<()>),
    Stopped,
}

pub struct NotificationSurface<T: Transport> {
    endpoint: String,
    feed: NotificationFeed,
    shutdown_tx: watch::Sender<bool>,
    phase: Phase<T>,
}

impl<T: Transport> NotificationSurface<T> {
    pub fn new(endpoint: impl Into<String>, transport: T, policy: ReconnectPolicy) -> Self {
        Self::with_machine(endpoint, transport, ConnectionMachine::new(policy))
    }

    /// Build a surface around a pre-configured state machine.
    pub fn with_machine(endpoint: impl Into<String>, transport: T, machine: ConnectionMachine) -> Self {
        let endpoint = endpoint.into();
        let ingestion = EventIngestion::new();
        let log = ingestion.subscribe();
        let supervisor = Supervisor::new(endpoint.clone(), transport, ingestion, machine);
        let feed = NotificationFeed {
            log,
            state: supervisor.state_watcher(),
        };
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            endpoint,
            feed,
            shutdown_tx,
            phase: Phase::Idle(supervisor),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn feed(&self) -> NotificationFeed {
        self.feed.clone()
    }

    pub fn view(&self) -> NotificationView {
        self.feed.view()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.feed.connection_state()
    }

    pub fn is_running(&self) -> bool {
        matches!(&self.phase, Phase::Running(handle) if !handle.is_finished())
    }

    /// Open the stream. Only the first call has any effect.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        let supervisor = match std::mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Idle(supervisor) => supervisor,
            other => {
                debug!(endpoint = %self.endpoint, "notification surface already started");
                self.phase = other;
                return;
            }
        };

        let shutdown = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(supervisor.run(shutdown));
        self.phase = Phase::Running(handle);
        info!(endpoint = %self.endpoint, "notification surface started");
    }

    /// Tear the stream down: close the socket, cancel any pending
    /// reconnect and wait for the supervisor to finish.
    ///
    /// Idempotent; valid before `start` and after a previous `stop`.
    pub async fn stop(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Running(handle) => {
                self.shutdown_tx.send_replace(true);
                if let Err(e) = handle.await {
                    warn!(endpoint = %self.endpoint, error = %e, "notification supervisor ended abnormally");
                }
                info!(endpoint = %self.endpoint, "notification surface stopped");
            }
            Phase::Idle(_) | Phase::Stopped => {}
        }
    }
}

impl<T: Transport> Drop for NotificationSurface<T> {
    fn drop(&mut self) {
        if matches!(self.phase, Phase::Running(_)) {
            self.shutdown_tx.send_replace(true);
        }
    }
}
