//! Persistent deny-list of blocked identifiers.

use dashmap::DashSet;
use std::sync::Arc;

use crate::observability::metrics;
use crate::storage::LocalStore;

const STORE_KEY: &str = "security.block_list";

/// Set of blocked identifiers (IPs, user ids, API keys — opaque strings).
///
/// Entries never expire on their own; additions and removals write through
/// to the local store immediately so the list survives restarts. Store
/// failures are logged and absorbed: the in-memory set stays authoritative
/// for the running process.
pub struct BlockList {
    entries: DashSet<String>,
    store: Arc<LocalStore>,
}

impl BlockList {
    /// Load the persisted list from `store`, starting empty if absent.
    pub fn load(store: Arc<LocalStore>) -> Self {
        let entries = DashSet::new();
        if let Some(persisted) = store.get::<Vec<String>>(STORE_KEY) {
            for id in persisted {
                entries.insert(id);
            }
            tracing::info!(blocked = entries.len(), "Loaded block list");
        }
        Self { entries, store }
    }

    pub fn is_blocked(&self, identifier: &str) -> bool {
        self.entries.contains(identifier)
    }

    /// Add an identifier; idempotent. Persists the updated list.
    pub fn add(&self, identifier: &str) {
        if self.entries.insert(identifier.to_string()) {
            tracing::warn!(identifier, "Identifier added to block list");
            metrics::record_block_list_change("add", self.entries.len());
            self.persist();
        }
    }

    /// Remove an identifier; removing an unknown one is a no-op.
    pub fn remove(&self, identifier: &str) {
        if self.entries.remove(identifier).is_some() {
            tracing::info!(identifier, "Identifier removed from block list");
            metrics::record_block_list_change("remove", self.entries.len());
            self.persist();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) {
        let snapshot: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        if let Err(e) = self.store.put(STORE_KEY, &snapshot) {
            tracing::error!(error = %e, "Failed to persist block list");
        }
    }
}
