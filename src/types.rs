/// file: src/types.rs
/// description: data model for local club events, server stream events and toasts
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stream discriminators that are transport plumbing, never application events.
pub const CONTROL_EVENT_TYPES: [&str; 2] = ["heartbeat", "connected"];

/// Emitted by this client right after the backend accepted a join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubJoinEvent {
    pub club_id: i64,
    pub user_id: i64,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ClubJoinEvent {
    pub fn new(club_id: i64, user_id: i64, user_name: impl Into<String>) -> Self {
        Self {
            club_id,
            user_id,
            user_name: user_name.into(),
            timestamp: None,
        }
    }
}

/// Events carried by the local bus. One variant per event name.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalEvent {
    ClubJoined(ClubJoinEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalEventKind {
    ClubJoined,
}

impl LocalEventKind {
    pub fn name(self) -> &'static str {
        match self {
            LocalEventKind::ClubJoined => "club:user-joined",
        }
    }
}

impl LocalEvent {
    pub fn kind(&self) -> LocalEventKind {
        match self {
            LocalEvent::ClubJoined(_) => LocalEventKind::ClubJoined,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            LocalEvent::ClubJoined(e) => e.timestamp,
        }
    }

    /// Copy of the event carrying `now` unless it already has a timestamp.
    pub fn stamped(&self, now: DateTime<Utc>) -> Self {
        let mut event = self.clone();
        match &mut event {
            LocalEvent::ClubJoined(e) => {
                e.timestamp.get_or_insert(now);
            }
        }
        event
    }
}

/// Raw record pushed by the backend over the notification stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl StreamEvent {
    pub fn is_control(&self) -> bool {
        CONTROL_EVENT_TYPES.contains(&self.event_type.as_str())
    }

    /// Typed view of the payload; fails for unknown discriminators.
    pub fn notification(&self) -> Result<ClubNotification, serde_json::Error> {
        serde_json::from_value(serde_json::json!({
            "type": self.event_type,
            "data": self.data,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClubNotification {
    #[serde(rename = "club:join-request")]
    JoinRequest {
        admin_id: i64,
        user_name: String,
        club_id: i64,
    },
    #[serde(rename = "club:user-joined")]
    UserJoined { user_name: String, club_id: i64 },
    #[serde(rename = "club:request-approved")]
    RequestApproved { user_id: i64, club_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToastAction {
    pub label: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub severity: Severity,
    pub title: String,
    pub description: Option<String>,
    pub duration: Option<Duration>,
    pub action: Option<ToastAction>,
}

impl Toast {
    pub fn new(severity: Severity, title: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            description: None,
            duration: None,
            action: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn action(mut self, label: impl Into<String>, target: impl Into<String>) -> Self {
        self.action = Some(ToastAction {
            label: label.into(),
            target: target.into(),
        });
        self
    }
}
