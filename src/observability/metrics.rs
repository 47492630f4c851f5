//! Metric recording helpers.
//!
//! # Metrics
//! - `security_rate_limited_total` (counter): denials by key
//! - `security_block_list_size` (gauge): current deny-list size
//! - `security_requests_denied_total` (counter): guard denials by reason
//! - `security_audit_events_total` (counter): journaled events by level
//! - `security_audit_export_total` (counter): export attempts by outcome
//! - `security_crypto_failures_total` (counter): failed operations by kind

use metrics::{counter, gauge};

pub fn record_rate_limited(key: &str) {
    counter!("security_rate_limited_total", "key" => key.to_string()).increment(1);
}

pub fn record_block_list_change(op: &'static str, size: usize) {
    counter!("security_block_list_changes_total", "op" => op).increment(1);
    gauge!("security_block_list_size").set(size as f64);
}

pub fn record_request_denied(reason: &'static str) {
    counter!("security_requests_denied_total", "reason" => reason).increment(1);
}

pub fn record_audit_event(level: &'static str) {
    counter!("security_audit_events_total", "level" => level).increment(1);
}

pub fn record_export(outcome: &'static str, batch_size: usize) {
    counter!("security_audit_export_total", "outcome" => outcome).increment(1);
    counter!("security_audit_exported_events_total", "outcome" => outcome)
        .increment(batch_size as u64);
}

pub fn record_crypto_failure(operation: &'static str) {
    counter!("security_crypto_failures_total", "operation" => operation).increment(1);
}
