//! autoscale-notify — live scaling notifications for the dashboard.
//!
//! Keeps one websocket connection to the autoscaler's notification
//! endpoint alive for the lifetime of a dashboard session, ingests every
//! pushed scaling event into an append-only log, and projects that log
//! into display state for the rendering layer.
//!
//! # Architecture
//!
//! ```text
//! resolve_endpoint(config, page) ──► Supervisor task
//!                                      ├── ConnectionMachine (pure transitions)
//!                                      ├── Transport / Connection (websocket)
//!                                      └── FrameSink ──► EventIngestion (log owner)
//!                                                           │ watch
//!                                                           ▼
//!                                  NotificationFeed ──► project() ──► NotificationView
//! ```
//!
//! # Reconnects
//!
//! Every drop, refusal or protocol error is handled the same way: the
//! supervisor waits a flat random delay in `[0, 3000)` ms and dials again,
//! forever. Teardown via [`NotificationSurface::stop`] closes the socket,
//! cancels the pending timer and ends the task; it is safe from any state.

pub mod backoff;
pub mod endpoint;
pub mod error;
pub mod log;
pub mod machine;
pub mod notification;
pub mod projector;
pub mod supervisor;
pub mod surface;
pub mod transport;

pub use backoff::ReconnectPolicy;
pub use endpoint::{resolve_endpoint, PageLocation, NOTIFICATIONS_PATH};
pub use error::{EndpointError, FrameError, TransportError};
pub use log::{EventIngestion, LogSnapshot, LogWatcher};
pub use machine::{Action, ConnectionEvent, ConnectionMachine, ConnectionState};
pub use notification::Notification;
pub use projector::{project, Badge, EntryView, NotificationView};
pub use supervisor::{FrameSink, Supervisor};
pub use surface::{NotificationFeed, NotificationSurface};
pub use transport::{Connection, Frame, Transport, WsConnection, WsTransport};
