//! Scaling notification record and its wire format.
//!
//! One JSON object per websocket frame:
//!
//! ```json
//! { "groupID": "web", "delta": 2, "count": 5, "createdAt": "2024-05-01T12:00:00Z" }
//! ```
//!
//! The autoscaler may also attach `id`, `name`, `message` and `isError`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// One scaling event on a group. Never mutated after ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "groupID")]
    pub group_id: String,
    /// Positive when the group grew.
    pub delta: i64,
    /// Resource count after the event.
    pub count: i64,
    /// Event time on the autoscaler's clock.
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name of the group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Notification {
    pub fn new(group_id: impl Into<String>, delta: i64, count: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            group_id: group_id.into(),
            delta,
            count,
            created_at,
            id: None,
            name: None,
            message: None,
            is_error: false,
        }
    }

    /// Decode a single frame payload.
    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        Ok(serde_json::from_slice(payload)?)
    }

    pub fn grew(&self) -> bool {
        self.delta > 0
    }
}
