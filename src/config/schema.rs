//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files;
//! every section has usable defaults so an empty file is a valid config.

use serde::{Deserialize, Serialize};

/// Root configuration for the security service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Durable local store location.
    pub storage: StorageConfig,

    /// Identity stamped onto audit events.
    pub identity: IdentityConfig,

    /// Fixed-window rate limiting defaults.
    pub rate_limit: RateLimitConfig,

    /// Audit journal and remote export settings.
    pub audit: AuditConfig,
}

/// Local store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON key-value store file.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "guardrail-store.json".to_string(),
        }
    }
}

/// Caller identity attached to every audit event.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Network origin of the hosting process (e.g. `app://dashboard`).
    pub origin: String,

    /// Agent string of the hosting process.
    pub agent: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            origin: "app://dashboard".to_string(),
            agent: concat!("guardrail/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Rate limiting defaults applied by the request guard.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Allowed hits per key per window.
    pub default_limit: u32,

    /// Window length in milliseconds.
    pub default_window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            default_window_ms: 60_000,
        }
    }
}

/// Audit journal configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Maximum events held in memory; oldest evicted beyond this.
    pub capacity: usize,

    /// Seconds between batch export attempts.
    pub export_interval_secs: u64,

    /// Whether remote persistence starts enabled.
    pub persistence_enabled: bool,

    /// Remote sink URL (POST JSON). Required when persistence is enabled.
    pub persistence_endpoint: Option<String>,

    /// Sink credential. Prefer supplying this at runtime over committing it
    /// to a config file; it is never written back to disk in cleartext.
    pub persistence_api_key: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            export_interval_secs: 30,
            persistence_enabled: false,
            persistence_endpoint: None,
            persistence_api_key: None,
        }
    }
}
