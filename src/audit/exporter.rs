//! Batched remote export of audit events.
//!
//! At-least-once delivery: a batch that fails to send stays unpersisted and
//! is retried whole on the next tick, so the remote sink must deduplicate by
//! event id if it needs exactly-once semantics.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::audit::event::SecurityEvent;
use crate::audit::journal::AuditJournal;
use crate::observability::metrics;

/// Default seconds between batch export ticks.
pub const DEFAULT_EXPORT_INTERVAL_SECS: u64 = 30;

/// POST a JSON batch of events to the configured endpoint.
///
/// Shared by the exporter loop and the journal's immediate sends so both
/// paths speak the same wire shape: `{"events": [...]}` with an optional
/// bearer credential.
pub(crate) async fn post_events(
    client: &reqwest::Client,
    endpoint: &str,
    api_key: Option<&str>,
    events: &[SecurityEvent],
) -> Result<(), String> {
    let mut request = client
        .post(endpoint)
        .json(&serde_json::json!({ "events": events }));
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request.send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("sink returned {}", response.status()));
    }
    Ok(())
}

/// Periodic batch exporter for the audit journal.
pub struct AuditExporter {
    journal: Arc<AuditJournal>,
    client: reqwest::Client,
    interval: Duration,
}

impl AuditExporter {
    pub fn new(journal: Arc<AuditJournal>, interval: Duration) -> Self {
        Self {
            journal,
            client: reqwest::Client::new(),
            interval,
        }
    }

    /// Run until the shutdown signal fires, attempting one batch per tick.
    /// A final flush runs on shutdown so a clean exit drains the backlog.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval fires immediately; skip the startup tick.
        ticker.tick().await;

        tracing::info!(interval_secs = self.interval.as_secs(), "Audit exporter started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Audit exporter stopping");
                    self.flush_once().await;
                    break;
                }
            }
        }
    }

    /// Send every unpersisted event as one batch; on success mark them
    /// persisted, on failure leave them for the next tick.
    pub async fn flush_once(&self) {
        let settings = self.journal.settings();
        if !settings.enabled {
            return;
        }
        let Some(endpoint) = settings.endpoint else {
            return;
        };

        // Snapshot taken under the journal lock; events logged after this
        // point wait for the next tick.
        let batch = self.journal.unpersisted();
        if batch.is_empty() {
            return;
        }

        match post_events(&self.client, &endpoint, settings.api_key.as_deref(), &batch).await {
            Ok(()) => {
                let ids: Vec<_> = batch.iter().map(|e| e.id).collect();
                self.journal.mark_persisted(&ids);
                metrics::record_export("success", batch.len());
                tracing::debug!(count = batch.len(), "Audit batch exported");
            }
            Err(e) => {
                metrics::record_export("failure", batch.len());
                tracing::warn!(error = %e, count = batch.len(), "Audit batch export failed, will retry");
            }
        }
    }
}
