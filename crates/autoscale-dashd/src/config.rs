//! dashboard.toml configuration parser.

use std::path::Path;

use serde::{Deserialize, Serialize};

use autoscale_dashboard::{Group, Template};
use autoscale_notify::backoff::DEFAULT_MAX_JITTER;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Address the HTTP server binds.
    pub listen: String,
    /// Origin browsers load the dashboard from. Empty means `http://{listen}`.
    pub public_url: String,
    pub notifications: NotificationsConfig,
    pub templates: Vec<Template>,
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Explicit stream endpoint. Empty means derive it from `public_url`.
    pub websocket_url: String,
    pub max_jitter_ms: u64,
    /// Backlog shared by all hub subscribers; a client that falls further
    /// behind skips the oldest notifications.
    pub hub_capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            public_url: String::new(),
            notifications: NotificationsConfig::default(),
            templates: Vec::new(),
            groups: Vec::new(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            websocket_url: String::new(),
            max_jitter_ms: DEFAULT_MAX_JITTER.as_millis() as u64,
            hub_capacity: 256,
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn public_url(&self) -> String {
        if self.public_url.is_empty() {
            format!("http://{}", self.listen)
        } else {
            self.public_url.clone()
        }
    }

    /// The configured endpoint, if one was set.
    pub fn websocket_url(&self) -> Option<&str> {
        Some(self.notifications.websocket_url.as_str()).filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = DashboardConfig::from_toml("").unwrap();
        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert_eq!(config.notifications.max_jitter_ms, 3000);
        assert_eq!(config.public_url(), "http://127.0.0.1:8080");
        assert!(config.websocket_url().is_none());
    }

    #[test]
    fn parse_full_config() {
        let config = DashboardConfig::from_toml(
            r#"
listen = "0.0.0.0:9000"
public_url = "https://autoscale.example.com"

[notifications]
websocket_url = "wss://events.example.com/api/notifications"
max_jitter_ms = 500

[[templates]]
name = "small"
region = "nyc3"
size = "s-1vcpu-1gb"
image = "ubuntu-22-04-x64"
sshKeys = ["ops"]

[[groups]]
id = "web"
name = "web"
templateName = "small"
metricType = "load"
"#,
        )
        .unwrap();

        assert_eq!(config.public_url(), "https://autoscale.example.com");
        assert_eq!(
            config.websocket_url(),
            Some("wss://events.example.com/api/notifications")
        );
        assert_eq!(config.notifications.max_jitter_ms, 500);
        assert_eq!(config.notifications.hub_capacity, 256);
        assert_eq!(config.templates[0].ssh_keys, vec!["ops".to_string()]);
        assert_eq!(config.groups[0].template_name, "small");
        assert_eq!(config.groups[0].policy_type, "");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = DashboardConfig::load(Path::new("/nonexistent/dashboard.toml")).unwrap();
        assert_eq!(config.listen, DEFAULT_LISTEN);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(DashboardConfig::from_toml("listen = [").is_err());
    }
}
