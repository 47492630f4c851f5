//! Configuration subsystem.
//!
//! # Design Decisions
//! - Serde handles syntax, `validation.rs` handles semantics
//! - Every section defaults; an absent config file means defaults
//! - Validation reports all errors, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AuditConfig, IdentityConfig, RateLimitConfig, SecurityConfig, StorageConfig};
pub use validation::{validate_config, ValidationError};
