//! Append-only audit journal.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::audit::event::{EventDraft, EventFilter, SecurityEvent};
use crate::audit::exporter;
use crate::observability::metrics;
use crate::storage::LocalStore;

const SETTINGS_KEY: &str = "security.audit_settings";
const MASKED_CREDENTIAL: &str = "***";

/// Default journal capacity when the config does not set one.
pub const DEFAULT_CAPACITY: usize = 1000;
/// Default `events()` result cap.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Remote persistence settings for the journal.
///
/// The API key lives only in memory; the blob written to the local store
/// carries a masked placeholder instead of the credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditSettings {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl AuditSettings {
    fn masked(&self) -> Self {
        Self {
            enabled: self.enabled,
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.as_ref().map(|_| MASKED_CREDENTIAL.to_string()),
        }
    }
}

/// Identity stamped onto every journaled event.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    /// Network origin of the hosting process (e.g. `app://dashboard`).
    pub origin: String,
    /// Agent string of the hosting process.
    pub agent: String,
}

impl Default for CallerIdentity {
    fn default() -> Self {
        Self {
            origin: "unknown".to_string(),
            agent: "unknown".to_string(),
        }
    }
}

/// Capacity-bounded, most-recent-first log of security events with optional
/// remote persistence.
pub struct AuditJournal {
    events: Mutex<VecDeque<SecurityEvent>>,
    capacity: usize,
    settings: Mutex<AuditSettings>,
    identity: CallerIdentity,
    store: Arc<LocalStore>,
    client: reqwest::Client,
}

impl AuditJournal {
    /// Open the journal, restoring persisted settings from `store`.
    ///
    /// A credential restored as the masked placeholder is unusable by
    /// design; hosts must re-supply the real key via [`configure`].
    ///
    /// [`configure`]: Self::configure
    pub fn open(store: Arc<LocalStore>, capacity: usize, identity: CallerIdentity) -> Self {
        let settings = store.get::<AuditSettings>(SETTINGS_KEY).unwrap_or_default();
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity,
            settings: Mutex::new(settings),
            identity,
            store,
            client: reqwest::Client::new(),
        }
    }

    /// Journal one event: stamp id, timestamp and caller identity, prepend,
    /// evict oldest past capacity. Returns the completed record.
    ///
    /// Urgent events also go to the local diagnostic channel synchronously.
    /// With remote persistence enabled, the event is additionally sent
    /// immediately, fire-and-forget.
    pub fn log_event(&self, draft: EventDraft) -> SecurityEvent {
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
            origin: self.identity.origin.clone(),
            agent: self.identity.agent.clone(),
            persisted: false,
        };

        if event.level.is_urgent() {
            tracing::error!(
                event_id = %event.id,
                level = event.level.as_str(),
                action = %event.action,
                "Urgent security event"
            );
        }
        metrics::record_audit_event(event.level.as_str());

        {
            let mut events = self.events.lock().expect("journal mutex poisoned");
            events.push_front(event.clone());
            events.truncate(self.capacity);
        }

        self.send_immediate(event.clone());
        event
    }

    /// Events matching `filter`, most recent first, at most `limit`.
    pub fn events(&self, filter: Option<&EventFilter>, limit: usize) -> Vec<SecurityEvent> {
        let events = self.events.lock().expect("journal mutex poisoned");
        events
            .iter()
            .filter(|e| filter.map_or(true, |f| f.matches(e)))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Number of journaled events currently held.
    pub fn len(&self) -> usize {
        self.events.lock().expect("journal mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of events not yet marked persisted, oldest first so the
    /// remote sink receives them in journal order.
    pub fn unpersisted(&self) -> Vec<SecurityEvent> {
        let events = self.events.lock().expect("journal mutex poisoned");
        events.iter().rev().filter(|e| !e.persisted).cloned().collect()
    }

    /// Mark the given events persisted after a successful remote send.
    /// Events already evicted are skipped silently.
    pub fn mark_persisted(&self, ids: &[Uuid]) {
        let mut events = self.events.lock().expect("journal mutex poisoned");
        for event in events.iter_mut() {
            if ids.contains(&event.id) {
                event.persisted = true;
            }
        }
    }

    /// Replace the remote persistence settings, writing the masked form to
    /// the local store. A store failure keeps the live settings and logs.
    pub fn configure(&self, settings: AuditSettings) {
        if let Err(e) = self.store.put(SETTINGS_KEY, &settings.masked()) {
            tracing::error!(error = %e, "Failed to persist audit settings");
        }
        *self.settings.lock().expect("journal mutex poisoned") = settings;
    }

    /// Current remote persistence settings.
    pub fn settings(&self) -> AuditSettings {
        self.settings.lock().expect("journal mutex poisoned").clone()
    }

    // Fire-and-forget single-event send. Requires a live tokio runtime;
    // without one (plain unit tests), the batch exporter still covers the
    // event on its next tick.
    fn send_immediate(&self, event: SecurityEvent) {
        let settings = self.settings();
        if !settings.enabled {
            return;
        }
        let Some(endpoint) = settings.endpoint else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let client = self.client.clone();
        handle.spawn(async move {
            if let Err(e) =
                exporter::post_events(&client, &endpoint, settings.api_key.as_deref(), &[event]).await
            {
                tracing::debug!(error = %e, "Immediate audit send failed; batch export will retry");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::event::{EventKind, EventLevel, EventStatus};
    use tempfile::tempdir;

    fn journal(capacity: usize) -> (tempfile::TempDir, AuditJournal) {
        let dir = tempdir().unwrap();
        let store = Arc::new(LocalStore::open(dir.path().join("store.json")));
        (dir, AuditJournal::open(store, capacity, CallerIdentity::default()))
    }

    fn draft(action: &str) -> EventDraft {
        EventDraft::new(EventKind::System, EventLevel::Info, action, EventStatus::Success)
    }

    #[test]
    fn test_stamps_id_time_and_identity() {
        let (_dir, journal) = journal(10);
        let event = journal.log_event(draft("startup"));
        assert!(!event.id.is_nil());
        assert_eq!(event.origin, "unknown");
        assert!(!event.persisted);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let (_dir, journal) = journal(5);
        for i in 0..8 {
            journal.log_event(draft(&format!("event-{i}")));
        }
        let events = journal.events(None, DEFAULT_QUERY_LIMIT);
        assert_eq!(events.len(), 5);
        // Most recent first; the three oldest are gone.
        assert_eq!(events[0].action, "event-7");
        assert_eq!(events[4].action, "event-3");
    }

    #[test]
    fn test_query_filter_and_limit() {
        let (_dir, journal) = journal(50);
        for _ in 0..3 {
            journal.log_event(draft("read"));
        }
        journal.log_event(EventDraft::new(
            EventKind::Api,
            EventLevel::Warning,
            "blocked",
            EventStatus::Blocked,
        ));

        let filter = EventFilter { kind: Some(EventKind::Api), ..Default::default() };
        let hits = journal.events(Some(&filter), DEFAULT_QUERY_LIMIT);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].action, "blocked");

        assert_eq!(journal.events(None, 2).len(), 2);
    }

    #[test]
    fn test_unpersisted_and_mark() {
        let (_dir, journal) = journal(10);
        let a = journal.log_event(draft("a"));
        let b = journal.log_event(draft("b"));

        let pending = journal.unpersisted();
        assert_eq!(pending.len(), 2);
        // Oldest first for the remote sink.
        assert_eq!(pending[0].id, a.id);

        journal.mark_persisted(&[a.id]);
        let pending = journal.unpersisted();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);
    }

    #[test]
    fn test_settings_persist_masked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = Arc::new(LocalStore::open(&path));
        let journal = AuditJournal::open(store.clone(), 10, CallerIdentity::default());

        journal.configure(AuditSettings {
            enabled: true,
            endpoint: Some("https://audit.example.com/events".into()),
            api_key: Some("super-secret".into()),
        });

        // Live settings keep the real credential.
        assert_eq!(journal.settings().api_key.as_deref(), Some("super-secret"));

        // The persisted blob does not.
        let blob: AuditSettings = store.get(SETTINGS_KEY).unwrap();
        assert_eq!(blob.api_key.as_deref(), Some(MASKED_CREDENTIAL));
        assert!(blob.enabled);
        assert_eq!(blob.endpoint.as_deref(), Some("https://audit.example.com/events"));
    }
}
