//! Security service facade.
//!
//! # Responsibilities
//! - Compose the validation, admission, crypto, CSP and audit subsystems
//! - Record audit events for security-relevant outcomes (denials, crypto
//!   failures, policy violations) at the facade boundary
//! - Own the background export task lifecycle
//!
//! # Design Decisions
//! - Explicit application context, no hidden global: hosts build one
//!   `Arc<SecurityService>` at startup and pass handles down
//! - Sub-components stay dumb; the audit side effects live here

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::admission::{
    Admission, ApiRequest, BlockList, CsrfTokens, RateLimiter, RequestGuard,
};
use crate::audit::{
    AuditExporter, AuditJournal, AuditSettings, CallerIdentity, EventDraft, EventFilter,
    EventKind, EventLevel, EventStatus, SecurityEvent, DEFAULT_QUERY_LIMIT,
};
use crate::config::SecurityConfig;
use crate::crypto::{self, DataCipher};
use crate::csp::CspManager;
use crate::error::SecurityResult;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::storage::LocalStore;
use crate::validation::{ValidationEngine, ValidationResult, ValidationRule};

/// Process-wide security service. One instance per process, built by the
/// host at startup and shared by `Arc`.
pub struct SecurityService {
    config: SecurityConfig,
    validation: ValidationEngine,
    limiter: RateLimiter,
    block_list: BlockList,
    csrf: CsrfTokens,
    cipher: DataCipher,
    csp: CspManager,
    journal: Arc<AuditJournal>,
}

impl SecurityService {
    /// Build the service, opening the local store at the configured path.
    pub fn new(config: SecurityConfig) -> Arc<Self> {
        let store = Arc::new(LocalStore::open(&config.storage.path));
        Self::with_store(config, store)
    }

    /// Build the service over an existing store handle.
    pub fn with_store(config: SecurityConfig, store: Arc<LocalStore>) -> Arc<Self> {
        let identity = CallerIdentity {
            origin: config.identity.origin.clone(),
            agent: config.identity.agent.clone(),
        };
        let journal = Arc::new(AuditJournal::open(
            store.clone(),
            config.audit.capacity,
            identity,
        ));

        // Config-supplied persistence settings take precedence over whatever
        // (masked) blob a previous run left in the store.
        if config.audit.persistence_enabled {
            journal.configure(AuditSettings {
                enabled: true,
                endpoint: config.audit.persistence_endpoint.clone(),
                api_key: config.audit.persistence_api_key.clone(),
            });
        }

        let service = Arc::new(Self {
            validation: ValidationEngine::new(),
            limiter: RateLimiter::new(),
            block_list: BlockList::load(store.clone()),
            csrf: CsrfTokens::new(),
            cipher: DataCipher::new(store),
            csp: CspManager::new(),
            journal,
            config,
        });

        tracing::info!(
            audit_capacity = service.config.audit.capacity,
            rate_limit = service.config.rate_limit.default_limit,
            "Security service initialized"
        );
        service
    }

    /// Spawn the audit batch exporter, tied to `shutdown`.
    pub fn start(&self, shutdown: &Shutdown) -> JoinHandle<()> {
        let exporter = AuditExporter::new(
            self.journal.clone(),
            Duration::from_secs(self.config.audit.export_interval_secs),
        );
        tokio::spawn(exporter.run(shutdown.subscribe()))
    }

    // ---- validation -----------------------------------------------------

    /// Validate one field value against the rules for (domain, field).
    pub fn validate_input(&self, domain: &str, field: &str, value: &Value) -> ValidationResult {
        self.validation.validate(domain, field, value)
    }

    /// Validate a whole record for a domain.
    pub fn validate_record(&self, domain: &str, record: &Map<String, Value>) -> ValidationResult {
        self.validation.validate_record(domain, record)
    }

    /// Upsert a validation rule at runtime.
    pub fn add_validation_rule(&self, domain: &str, field: &str, rule: ValidationRule) {
        self.validation.add_rule(domain, field, rule);
    }

    /// Escape free text for safe HTML display.
    pub fn sanitize_html(&self, text: &str) -> String {
        crate::validation::sanitize_html(text)
    }

    // ---- admission ------------------------------------------------------

    /// Admission decision for an outbound request. Denials are journaled as
    /// blocked `api` events carrying the reason and resource URL.
    pub fn validate_request(&self, request: &ApiRequest) -> bool {
        let guard = RequestGuard {
            csrf: &self.csrf,
            limiter: &self.limiter,
            limit: self.config.rate_limit.default_limit,
            window_ms: self.config.rate_limit.default_window_ms,
        };
        match guard.evaluate(request) {
            Admission::Allowed => true,
            Admission::Denied(reason) => {
                metrics::record_request_denied(reason.as_str());
                self.journal.log_event(
                    EventDraft::new(
                        EventKind::Api,
                        EventLevel::Warning,
                        "Request blocked",
                        EventStatus::Blocked,
                    )
                    .resource(request.url.clone())
                    .detail("reason", reason.as_str()),
                );
                false
            }
        }
    }

    /// Fixed-window rate limit check for an arbitrary key. `limit` and
    /// `window_ms` fall back to the configured defaults.
    pub fn check_rate_limit(&self, key: &str, limit: Option<u32>, window_ms: Option<u64>) -> bool {
        self.limiter.check(
            key,
            limit.unwrap_or(self.config.rate_limit.default_limit),
            window_ms.unwrap_or(self.config.rate_limit.default_window_ms),
        )
    }

    /// Whether an identifier is on the block list.
    pub fn is_blocked(&self, identifier: &str) -> bool {
        self.block_list.is_blocked(identifier)
    }

    /// Add an identifier to the persistent block list.
    pub fn block_identifier(&self, identifier: &str) {
        self.block_list.add(identifier);
        self.journal.log_event(
            EventDraft::new(
                EventKind::System,
                EventLevel::Warning,
                "Identifier blocked",
                EventStatus::Success,
            )
            .detail("identifier", identifier),
        );
    }

    /// Remove an identifier from the block list.
    pub fn unblock_identifier(&self, identifier: &str) {
        self.block_list.remove(identifier);
    }

    /// The current CSRF token, for attaching to state-changing requests.
    pub fn csrf_token(&self) -> Arc<String> {
        self.csrf.token()
    }

    /// Rotate the CSRF token, invalidating previously issued copies.
    pub fn regenerate_csrf_token(&self) -> Arc<String> {
        self.csrf.regenerate()
    }

    // ---- data protection ------------------------------------------------

    /// Encrypt a sensitive value. Failures are journaled before propagating.
    pub fn encrypt_data(&self, plaintext: &str) -> SecurityResult<String> {
        self.cipher.encrypt(plaintext).map_err(|e| {
            self.log_crypto_failure("encrypt", &e);
            e
        })
    }

    /// Decrypt a ciphertext token. Failures are journaled before
    /// propagating; tampered input never yields plaintext.
    pub fn decrypt_data(&self, token: &str) -> SecurityResult<String> {
        self.cipher.decrypt(token).map_err(|e| {
            self.log_crypto_failure("decrypt", &e);
            e
        })
    }

    /// Salted password hash in `<hexHash>.<salt>` form. See
    /// [`crate::crypto::password`] for the hardening caveat.
    pub fn hash_password(&self, password: &str, salt: Option<&str>) -> String {
        crypto::hash_password(password, salt)
    }

    /// Verify a password against a stored hash.
    pub fn verify_password(&self, password: &str, stored: &str) -> bool {
        crypto::verify_password(password, stored)
    }

    fn log_crypto_failure(&self, operation: &'static str, error: &crate::error::SecurityError) {
        metrics::record_crypto_failure(operation);
        self.journal.log_event(
            EventDraft::new(
                EventKind::DataAccess,
                EventLevel::Warning,
                format!("Data {operation} failed"),
                EventStatus::Failure,
            )
            .detail("error", error.to_string()),
        );
    }

    // ---- CSP ------------------------------------------------------------

    /// The Content-Security-Policy manager.
    pub fn csp(&self) -> &CspManager {
        &self.csp
    }

    /// Record a CSP violation reported by the hosting environment.
    pub fn report_csp_violation(&self, directive: &str, blocked_uri: &str) {
        self.journal.log_event(
            EventDraft::new(
                EventKind::System,
                EventLevel::Warning,
                "Content Security Policy violation",
                EventStatus::Blocked,
            )
            .resource(blocked_uri.to_string())
            .detail("directive", directive),
        );
    }

    // ---- audit ----------------------------------------------------------

    /// Journal a security event supplied by a caller.
    pub fn log_security_event(&self, draft: EventDraft) -> SecurityEvent {
        self.journal.log_event(draft)
    }

    /// Query journaled events, most recent first.
    pub fn security_events(&self, filter: Option<&EventFilter>, limit: Option<usize>) -> Vec<SecurityEvent> {
        self.journal.events(filter, limit.unwrap_or(DEFAULT_QUERY_LIMIT))
    }

    /// Replace the audit remote persistence settings.
    pub fn configure_audit(&self, settings: AuditSettings) {
        self.journal.configure(settings);
    }

    /// Current audit remote persistence settings.
    pub fn audit_settings(&self) -> AuditSettings {
        self.journal.settings()
    }

    /// Run one batch export immediately, outside the timer. Used by hosts
    /// that want to drain the journal on their own schedule (e.g. right
    /// before exit).
    pub async fn flush_audit(&self) {
        AuditExporter::new(
            self.journal.clone(),
            Duration::from_secs(self.config.audit.export_interval_secs),
        )
        .flush_once()
        .await;
    }
}
