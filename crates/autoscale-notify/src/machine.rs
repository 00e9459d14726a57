//! Connection state machine.
//!
//! Pure transition logic with no I/O: the supervisor feeds it events and
//! performs the actions it returns. Keeping it free of sockets and timers
//! lets every transition be exercised directly in tests.
//!
//! ```text
//! Disconnected ──Start──► Connecting ──Opened──► Open
//!                            │  ▲                  │
//!             ConnectFailed  │  │ BackoffElapsed   │ Closed
//!                 / Closed   ▼  │                  │
//!                          Reconnecting ◄──────────┘
//!
//! any ──Teardown──► Disconnected   (via Closing while a socket is live)
//! ```

use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::backoff::ReconnectPolicy;

/// Lifecycle state of the notification connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    /// Teardown is closing a live socket.
    Closing,
    /// Waiting out the backoff delay before the next attempt.
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happened to the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Start,
    Opened,
    ConnectFailed,
    /// The socket closed, cleanly or with an error.
    Closed,
    BackoffElapsed,
    Teardown,
}

/// Work the supervisor must perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Connect,
    ScheduleReconnect(Duration),
    CancelTimer,
    CloseSocket,
}

pub struct ConnectionMachine {
    state: ConnectionState,
    policy: ReconnectPolicy,
    rng: StdRng,
    timer_pending: bool,
    socket_live: bool,
    torn_down: bool,
}

impl ConnectionMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self::with_rng(policy, StdRng::from_entropy())
    }

    /// Create a machine with a caller-supplied RNG (for deterministic tests).
    pub fn with_rng(policy: ReconnectPolicy, rng: StdRng) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            policy,
            rng,
            timer_pending: false,
            socket_live: false,
            torn_down: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a backoff timer is scheduled and not yet elapsed or cancelled.
    pub fn timer_pending(&self) -> bool {
        self.timer_pending
    }

    /// Whether a socket is open or still being closed.
    pub fn socket_live(&self) -> bool {
        self.socket_live
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Inbound frames are only forwarded while open.
    pub fn accepts_frames(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Apply an event and return the actions it requires.
    ///
    /// Events that have no transition from the current state are ignored.
    pub fn handle(&mut self, event: ConnectionEvent) -> Vec<Action> {
        use ConnectionEvent as E;
        use ConnectionState as S;

        let from = self.state;
        let actions = match (from, event) {
            (_, E::Teardown) => self.teardown(),

            (S::Disconnected, E::Start) if !self.torn_down => {
                self.state = S::Connecting;
                vec![Action::Connect]
            }

            (S::Connecting, E::Opened) => {
                self.state = S::Open;
                self.socket_live = true;
                Vec::new()
            }

            (S::Connecting, E::ConnectFailed | E::Closed) => self.schedule_reconnect(),

            (S::Open, E::Closed) => {
                self.socket_live = false;
                self.schedule_reconnect()
            }

            (S::Closing, E::Closed) => {
                self.socket_live = false;
                self.state = S::Disconnected;
                Vec::new()
            }

            (S::Reconnecting, E::BackoffElapsed) if self.timer_pending => {
                self.timer_pending = false;
                self.state = S::Connecting;
                vec![Action::Connect]
            }

            _ => {
                debug!(state = %from, ?event, "ignoring event with no transition");
                return Vec::new();
            }
        };

        if self.state != from {
            debug!(from = %from, to = %self.state, ?event, "connection transition");
        }
        actions
    }

    fn schedule_reconnect(&mut self) -> Vec<Action> {
        let delay = self.policy.sample(&mut self.rng);
        self.state = ConnectionState::Reconnecting;
        self.timer_pending = true;
        vec![Action::ScheduleReconnect(delay)]
    }

    fn teardown(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.torn_down {
            return actions;
        }
        self.torn_down = true;

        if self.timer_pending {
            self.timer_pending = false;
            actions.push(Action::CancelTimer);
        }

        if self.socket_live {
            self.state = ConnectionState::Closing;
            actions.push(Action::CloseSocket);
        } else {
            self.state = ConnectionState::Disconnected;
        }
        actions
    }
}
