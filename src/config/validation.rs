//! Configuration validation.
//!
//! Semantic checks over a parsed [`SecurityConfig`]; serde already handled
//! syntax. Returns every problem found, not just the first.

use crate::config::schema::SecurityConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate `config`, collecting all errors.
pub fn validate_config(config: &SecurityConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut fail = |field: &str, message: &str| {
        errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    };

    if config.storage.path.trim().is_empty() {
        fail("storage.path", "must not be empty");
    }

    if config.rate_limit.default_limit == 0 {
        fail("rate_limit.default_limit", "must be greater than zero");
    }
    if config.rate_limit.default_window_ms == 0 {
        fail("rate_limit.default_window_ms", "must be greater than zero");
    }

    if config.audit.capacity == 0 {
        fail("audit.capacity", "must be greater than zero");
    }
    if config.audit.export_interval_secs == 0 {
        fail("audit.export_interval_secs", "must be greater than zero");
    }
    if config.audit.persistence_enabled {
        match &config.audit.persistence_endpoint {
            None => fail(
                "audit.persistence_endpoint",
                "required when persistence is enabled",
            ),
            Some(endpoint) if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") => {
                fail("audit.persistence_endpoint", "must be an http(s) URL")
            }
            Some(_) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
