use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a notification is about. Serialized as the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Attendance,
    ParentAlert,
    Alert,
}

/// Who a notification is meant for. Serialized as the `user_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Holder,
    Guardian,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A single notification pushed to every live listener.
///
/// The serde names are the wire contract clients read:
/// ```json
/// {
///   "type": "attendance",
///   "title": "Attendance Update",
///   "message": "Alice checked in via QR code at 08:05",
///   "user_id": null,
///   "user_type": "all",
///   "priority": "medium",
///   "created_at": "2025-09-08T08:05:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub title: String,
    #[serde(rename = "message")]
    pub body: String,
    #[serde(rename = "user_id")]
    pub target_holder: Option<i64>,
    #[serde(rename = "user_type")]
    pub target_audience: Audience,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    /// Event addressed to `audience` with no specific holder.
    pub fn new(
        kind: EventKind,
        title: impl Into<String>,
        body: impl Into<String>,
        audience: Audience,
        priority: Priority,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            body: body.into(),
            target_holder: None,
            target_audience: audience,
            priority,
            created_at,
        }
    }

    /// Narrows the event to a single holder.
    pub fn for_holder(mut self, holder_id: i64) -> Self {
        self.target_holder = Some(holder_id);
        self
    }
}
