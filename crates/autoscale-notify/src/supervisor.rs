//! Connection supervisor — the task that keeps the notification stream up.
//!
//! Runs the [`ConnectionMachine`] against a real [`Transport`]. The task
//! only ever waits on three things: a connect attempt, the next inbound
//! frame, and the backoff timer. Each of those waits also watches the
//! shutdown signal, so teardown is honoured from any state.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::machine::{Action, ConnectionEvent, ConnectionMachine, ConnectionState};
use crate::transport::{Connection, Frame, Transport};

/// Bound on the close handshake during teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Receives every inbound frame, in arrival order, while the stream is open.
pub trait FrameSink: Send + 'static {
    fn deliver(&self, frame: Frame);
}

/// What woke the supervisor up while idle.
enum Wake {
    Shutdown,
    BackoffElapsed,
    Frame(Option<Result<Frame, TransportError>>),
}

pub struct Supervisor<T: Transport, S: FrameSink> {
    endpoint: String,
    transport: T,
    sink: S,
    machine: ConnectionMachine,
    state_tx: watch::Sender<ConnectionState>,
}

impl<T: Transport, S: FrameSink> Supervisor<T, S> {
    pub fn new(endpoint: impl Into<String>, transport: T, sink: S, machine: ConnectionMachine) -> Self {
        let (state_tx, _) = watch::channel(machine.state());
        Self {
            endpoint: endpoint.into(),
            transport,
            sink,
            machine,
            state_tx,
        }
    }

    /// Observe connection state changes.
    pub fn state_watcher(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Run until shutdown is signalled (or its sender is dropped).
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(endpoint = %self.endpoint, "notification supervisor started");

        let mut conn: Option<T::Conn> = None;
        let mut deadline: Option<Instant> = None;
        let mut next = Some(if *shutdown.borrow_and_update() {
            ConnectionEvent::Teardown
        } else {
            ConnectionEvent::Start
        });

        loop {
            if let Some(event) = next.take() {
                let actions = self.machine.handle(event);
                self.publish();
                for action in actions {
                    if let Some(follow_up) = self
                        .perform(action, &mut conn, &mut deadline, &mut shutdown)
                        .await
                    {
                        next = Some(follow_up);
                    }
                }
                continue;
            }

            if self.machine.is_torn_down() && self.machine.state() == ConnectionState::Disconnected {
                break;
            }

            let wake = tokio::select! {
                biased;
                _ = shutdown.changed() => Wake::Shutdown,
                _ = backoff_elapsed(deadline) => Wake::BackoffElapsed,
                frame = next_frame(&mut conn) => Wake::Frame(frame),
            };

            next = match wake {
                Wake::Shutdown => Some(ConnectionEvent::Teardown),
                Wake::BackoffElapsed => {
                    deadline = None;
                    Some(ConnectionEvent::BackoffElapsed)
                }
                Wake::Frame(Some(Ok(frame))) => {
                    if self.machine.accepts_frames() {
                        self.sink.deliver(frame);
                    }
                    None
                }
                Wake::Frame(Some(Err(e))) => {
                    warn!(endpoint = %self.endpoint, error = %e, "notification stream dropped");
                    conn = None;
                    Some(ConnectionEvent::Closed)
                }
                Wake::Frame(None) => {
                    info!(endpoint = %self.endpoint, "notification stream closed by server");
                    conn = None;
                    Some(ConnectionEvent::Closed)
                }
            };
        }

        info!(endpoint = %self.endpoint, "notification supervisor stopped");
    }

    /// Carry out one action; returns the event it produced, if any.
    async fn perform(
        &mut self,
        action: Action,
        conn: &mut Option<T::Conn>,
        deadline: &mut Option<Instant>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<ConnectionEvent> {
        match action {
            Action::Connect => {
                debug!(endpoint = %self.endpoint, "connecting to notification stream");
                let attempt = tokio::select! {
                    biased;
                    _ = shutdown.changed() => None,
                    result = self.transport.connect(&self.endpoint) => Some(result),
                };
                match attempt {
                    None => Some(ConnectionEvent::Teardown),
                    Some(Ok(opened)) => {
                        info!(endpoint = %self.endpoint, "notification stream open");
                        *conn = Some(opened);
                        Some(ConnectionEvent::Opened)
                    }
                    Some(Err(e)) => {
                        warn!(endpoint = %self.endpoint, error = %e, "notification stream connect failed");
                        Some(ConnectionEvent::ConnectFailed)
                    }
                }
            }
            Action::ScheduleReconnect(delay) => {
                debug!(delay_ms = delay.as_millis() as u64, "reconnect scheduled");
                *deadline = Some(Instant::now() + delay);
                None
            }
            Action::CancelTimer => {
                *deadline = None;
                None
            }
            Action::CloseSocket => {
                if let Some(mut open) = conn.take()
                    && tokio::time::timeout(CLOSE_TIMEOUT, open.close()).await.is_err()
                {
                    debug!("close handshake timed out");
                }
                Some(ConnectionEvent::Closed)
            }
        }
    }

    fn publish(&self) {
        let state = self.machine.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

async fn backoff_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn next_frame<C: Connection>(conn: &mut Option<C>) -> Option<Result<Frame, TransportError>> {
    match conn {
        Some(open) => open.next_frame().await,
        None => std::future::pending().await,
    }
}
