//! Endpoint resolution for the notification stream.
//!
//! An explicitly configured endpoint always wins. Without one, the
//! endpoint is derived from the origin the dashboard is served from,
//! mirroring its security so a page served over TLS never dials a
//! plaintext socket.

use url::Url;

use crate::error::EndpointError;

/// Path the autoscaler serves notifications on.
pub const NOTIFICATIONS_PATH: &str = "/api/notifications";

/// Where the dashboard is being served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Whether the page was loaded over a secure transport.
    pub secure: bool,
    /// Host, including an explicit port when one was given.
    pub host: String,
}

impl PageLocation {
    pub fn new(secure: bool, host: impl Into<String>) -> Self {
        Self {
            secure,
            host: host.into(),
        }
    }

    /// Parse an origin such as `https://dash.example.com:8443`.
    pub fn parse(origin: &str) -> Result<Self, EndpointError> {
        let url = Url::parse(origin).map_err(|e| EndpointError::InvalidOrigin {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;

        let secure = match url.scheme() {
            "https" | "wss" => true,
            "http" | "ws" => false,
            other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
        };

        let host = url
            .host_str()
            .ok_or_else(|| EndpointError::MissingHost(origin.to_string()))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self { secure, host })
    }
}

/// Resolve the websocket endpoint for the notification stream.
///
/// Returns `explicit` unchanged when it is non-empty.
pub fn resolve_endpoint(explicit: Option<&str>, page: &PageLocation) -> String {
    match explicit {
        Some(endpoint) if !endpoint.is_empty() => endpoint.to_string(),
        _ => {
            let scheme = if page.secure { "wss" } else { "ws" };
            format!("{scheme}://{}{NOTIFICATIONS_PATH}", page.host)
        }
    }
}
