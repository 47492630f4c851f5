//! Security event model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Category of a security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Authentication,
    Authorization,
    DataAccess,
    System,
    Api,
}

/// Severity of a security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl EventLevel {
    /// Critical and emergency events are surfaced synchronously to the
    /// local diagnostic channel as well as the journal.
    pub fn is_urgent(&self) -> bool {
        matches!(self, EventLevel::Critical | EventLevel::Emergency)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Info => "info",
            EventLevel::Warning => "warning",
            EventLevel::Critical => "critical",
            EventLevel::Emergency => "emergency",
        }
    }
}

/// Outcome recorded on a security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Success,
    Failure,
    Blocked,
}

/// One audit record. Immutable once journaled, except for the `persisted`
/// flag the exporter sets after a successful remote send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub level: EventLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub status: EventStatus,
    /// Schema-less structured payload; shape is documented per call site,
    /// never enforced.
    pub details: Map<String, Value>,
    pub origin: String,
    pub agent: String,
    #[serde(default)]
    pub persisted: bool,
}

/// Event under construction: everything the caller supplies, before the
/// journal stamps id, timestamp, origin and agent.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub kind: EventKind,
    pub level: EventLevel,
    pub action: String,
    pub status: EventStatus,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub resource: Option<String>,
    pub details: Map<String, Value>,
}

impl EventDraft {
    pub fn new(kind: EventKind, level: EventLevel, action: impl Into<String>, status: EventStatus) -> Self {
        Self {
            kind,
            level,
            action: action.into(),
            status,
            user_id: None,
            user_name: None,
            resource: None,
            details: Map::new(),
        }
    }

    pub fn user(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self.user_name = Some(name.into());
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Conjunctive filter over journaled events; unset predicates match all.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub kind: Option<EventKind>,
    pub level: Option<EventLevel>,
    pub user_id: Option<String>,
    pub status: Option<EventStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl EventFilter {
    pub fn matches(&self, event: &SecurityEvent) -> bool {
        if self.kind.is_some_and(|k| k != event.kind) {
            return false;
        }
        if self.level.is_some_and(|l| l != event.level) {
            return false;
        }
        if let Some(user_id) = &self.user_id {
            if event.user_id.as_deref() != Some(user_id.as_str()) {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != event.status) {
            return false;
        }
        if self.from.is_some_and(|from| event.timestamp < from) {
            return false;
        }
        if self.to.is_some_and(|to| event.timestamp > to) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_wire_names() {
        let draft = EventDraft::new(
            EventKind::DataAccess,
            EventLevel::Warning,
            "decrypt",
            EventStatus::Failure,
        )
        .detail("error", "authentication failed");

        let event = SecurityEvent {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind: draft.kind,
            level: draft.level,
            user_id: draft.user_id,
            user_name: draft.user_name,
            action: draft.action,
            resource: draft.resource,
            status: draft.status,
            details: draft.details,
            origin: "app://dashboard".into(),
            agent: "guardrail/0.1".into(),
            persisted: false,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "data_access");
        assert_eq!(json["level"], "warning");
        assert_eq!(json["status"], "failure");
        assert_eq!(json["details"]["error"], "authentication failed");
        // Unset optionals stay off the wire.
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_filter_conjunction() {
        let event = SecurityEvent {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind: EventKind::Api,
            level: EventLevel::Warning,
            user_id: Some("u1".into()),
            user_name: None,
            action: "request blocked".into(),
            resource: None,
            status: EventStatus::Blocked,
            details: Map::new(),
            origin: String::new(),
            agent: String::new(),
            persisted: false,
        };

        assert!(EventFilter::default().matches(&event));
        assert!(EventFilter { kind: Some(EventKind::Api), status: Some(EventStatus::Blocked), ..Default::default() }.matches(&event));
        assert!(!EventFilter { kind: Some(EventKind::System), ..Default::default() }.matches(&event));
        assert!(!EventFilter { user_id: Some("u2".into()), ..Default::default() }.matches(&event));
    }
}
