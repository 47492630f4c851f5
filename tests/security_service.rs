//! End-to-end tests for the security service facade.

use std::sync::Arc;
use std::time::Duration;

use guardrail::audit::AuditSettings;
use guardrail::{
    ApiRequest, EventDraft, EventFilter, EventKind, EventLevel, EventStatus, RequestMethod,
    SecurityConfig, SecurityService, Shutdown, CSRF_HEADER,
};
use serde_json::json;

mod common;

fn config_in(dir: &tempfile::TempDir) -> SecurityConfig {
    let mut config = SecurityConfig::default();
    config.storage.path = dir
        .path()
        .join("store.json")
        .to_string_lossy()
        .into_owned();
    config
}

#[test]
fn test_form_validation_flow() {
    let dir = tempfile::tempdir().unwrap();
    let service = SecurityService::new(config_in(&dir));

    let record = json!({
        "username": "ops_admin",
        "email": "ops@example.com",
        "password": "long-enough-secret",
        "role": "admin",
    });
    let result = service.validate_record("user", record.as_object().unwrap());
    assert!(result.is_valid, "unexpected errors: {:?}", result.errors);

    let bad = json!({ "username": "x" });
    let result = service.validate_record("user", bad.as_object().unwrap());
    assert!(!result.is_valid);
    assert!(result.errors.iter().any(|e| e.contains("email")));

    assert_eq!(
        service.sanitize_html("<img src=x onerror=alert(1)>"),
        "&lt;img src=x onerror=alert(1)&gt;"
    );
}

#[test]
fn test_admission_flow_with_token_rotation() {
    let dir = tempfile::tempdir().unwrap();
    let service = SecurityService::new(config_in(&dir));

    let token = service.csrf_token();
    let write = |t: &str| {
        ApiRequest::new(RequestMethod::Put, "/api/settings").header(CSRF_HEADER, t)
    };

    assert!(service.validate_request(&write(&token)));

    // Rotation invalidates the captured token.
    service.regenerate_csrf_token();
    assert!(!service.validate_request(&write(&token)));

    // The denial is on the audit trail with its reason.
    let blocked = service.security_events(
        Some(&EventFilter {
            status: Some(EventStatus::Blocked),
            ..Default::default()
        }),
        None,
    );
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].details["reason"], "Invalid CSRF token");
}

#[test]
fn test_rate_limit_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let service = SecurityService::new(config_in(&dir));

    // allow, allow, allow, deny within one window.
    for _ in 0..3 {
        assert!(service.check_rate_limit("panel:alerts", Some(3), Some(60_000)));
    }
    assert!(!service.check_rate_limit("panel:alerts", Some(3), Some(60_000)));
}

#[test]
fn test_data_protection_round_trip_and_tamper() {
    let dir = tempfile::tempdir().unwrap();
    let service = SecurityService::new(config_in(&dir));

    let token = service.encrypt_data("connection-string").unwrap();
    let again = service.encrypt_data("connection-string").unwrap();
    assert_ne!(token, again, "IV reuse: identical ciphertexts");
    assert_eq!(service.decrypt_data(&token).unwrap(), "connection-string");

    // Corrupt the token; decryption must fail and be journaled.
    let mut chars: Vec<char> = token.chars().collect();
    chars[4] = if chars[4] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();
    assert!(service.decrypt_data(&tampered).is_err());

    let failures = service.security_events(
        Some(&EventFilter {
            kind: Some(EventKind::DataAccess),
            status: Some(EventStatus::Failure),
            ..Default::default()
        }),
        None,
    );
    assert_eq!(failures.len(), 1);
}

#[test]
fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let token = {
        let service = SecurityService::new(config_in(&dir));
        service.block_identifier("192.0.2.44");
        service.encrypt_data("survives").unwrap()
    };

    let service = SecurityService::new(config_in(&dir));
    assert!(service.is_blocked("192.0.2.44"));
    assert_eq!(service.decrypt_data(&token).unwrap(), "survives");
}

#[test]
fn test_password_flow() {
    let dir = tempfile::tempdir().unwrap();
    let service = SecurityService::new(config_in(&dir));

    let stored = service.hash_password("operator-passphrase", None);
    assert!(service.verify_password("operator-passphrase", &stored));
    assert!(!service.verify_password("wrong", &stored));
}

#[test]
fn test_csp_management_and_violation_report() {
    let dir = tempfile::tempdir().unwrap();
    let service = SecurityService::new(config_in(&dir));

    service.csp().add_source("img-src", "https://cdn.example.com");
    assert!(service.csp().policy_string().contains("https://cdn.example.com"));
    assert!(service
        .csp()
        .applied_policy()
        .contains("https://cdn.example.com"));

    service.csp().remove_source("img-src", "https://cdn.example.com");
    assert!(!service.csp().policy_string().contains("cdn.example.com"));

    service.report_csp_violation("script-src", "https://evil.example.com/x.js");
    let events = service.security_events(None, None);
    assert_eq!(events[0].kind, EventKind::System);
    assert_eq!(
        events[0].resource.as_deref(),
        Some("https://evil.example.com/x.js")
    );
}

#[tokio::test]
async fn test_remote_export_marks_events_persisted() {
    let sink = common::start_mock_sink().await;
    let dir = tempfile::tempdir().unwrap();
    let service = SecurityService::new(config_in(&dir));

    service.configure_audit(AuditSettings {
        enabled: true,
        endpoint: Some(sink.endpoint.clone()),
        api_key: Some("sink-credential".into()),
    });

    for i in 0..3 {
        service.log_security_event(EventDraft::new(
            EventKind::System,
            EventLevel::Info,
            format!("tick-{i}"),
            EventStatus::Success,
        ));
    }

    service.flush_audit().await;

    let events = service.security_events(None, None);
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.persisted), "batch not marked persisted");

    // The sink saw at least the batch (immediate sends may add duplicates;
    // delivery is at-least-once by design).
    let bodies = sink.bodies();
    assert!(!bodies.is_empty());
    assert!(bodies.iter().any(|b| b.contains("tick-0") || b.contains("\"events\"")));
}

#[tokio::test]
async fn test_exporter_lifecycle_under_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let service = SecurityService::new(config_in(&dir));
    let shutdown = Shutdown::new();

    let handle = service.start(&shutdown);
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("exporter ignored shutdown")
        .unwrap();
    assert_eq!(shutdown.active_tasks(), 0);
}

#[test]
fn test_journal_capacity_bound() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&dir);
    config.audit.capacity = 10;
    let service = SecurityService::new(config);

    for i in 0..15 {
        service.log_security_event(EventDraft::new(
            EventKind::System,
            EventLevel::Info,
            format!("e-{i}"),
            EventStatus::Success,
        ));
    }

    let events = service.security_events(None, Some(100));
    assert_eq!(events.len(), 10);
    assert_eq!(events[0].action, "e-14");
    assert_eq!(events[9].action, "e-5");
}

#[test]
fn test_service_is_shareable() {
    let dir = tempfile::tempdir().unwrap();
    let service = SecurityService::new(config_in(&dir));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let service: Arc<SecurityService> = service.clone();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    service.check_rate_limit(&format!("thread-{i}"), None, None);
                }
                service.encrypt_data("shared").unwrap()
            })
        })
        .collect();

    for handle in handles {
        let token = handle.join().unwrap();
        assert_eq!(service.decrypt_data(&token).unwrap(), "shared");
    }
}
