//! Input validation engine.
//!
//! # Responsibilities
//! - Hold per-(domain, field) declarative rules
//! - Validate single fields and whole records, accumulating every error
//! - Sanitize free text for safe HTML display
//!
//! # Design Decisions
//! - Permissive default: no rule means valid (forms evolve faster than rules)
//! - All applicable checks run; only required-but-empty short-circuits
//! - Never returns an error, only a result value

pub mod rules;
pub mod sanitize;

pub use rules::{CustomCheck, FieldType, ValidationRule};
pub use sanitize::sanitize_html;

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::RwLock;

/// Outcome of a validation call: validity plus every human-readable error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Rule registry and validator, keyed by domain then field.
pub struct ValidationEngine {
    rules: RwLock<HashMap<String, HashMap<String, ValidationRule>>>,
}

impl ValidationEngine {
    /// Engine seeded with the dashboard's default domain rule sets.
    pub fn new() -> Self {
        let engine = Self::empty();
        for (domain, field, rule) in rules::default_rules() {
            engine.add_rule(domain, field, rule);
        }
        engine
    }

    /// Engine with no rules; everything validates.
    pub fn empty() -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
        }
    }

    /// Upsert the rule for (domain, field). The rule itself is not checked.
    pub fn add_rule(&self, domain: &str, field: &str, rule: ValidationRule) {
        let mut rules = self.rules.write().expect("rules lock poisoned");
        rules
            .entry(domain.to_string())
            .or_default()
            .insert(field.to_string(), rule);
    }

    /// Validate one field value against its rule.
    ///
    /// A missing rule is not an error: the result is valid with no messages.
    pub fn validate(&self, domain: &str, field: &str, value: &Value) -> ValidationResult {
        let rules = self.rules.read().expect("rules lock poisoned");
        let Some(rule) = rules.get(domain).and_then(|fields| fields.get(field)) else {
            return ValidationResult::valid();
        };

        Self::check_value(field, value, rule)
    }

    /// Validate a whole record for a domain.
    ///
    /// Missing required fields are collected first, then every present field
    /// with a matching rule is validated; all errors merge into one result.
    pub fn validate_record(&self, domain: &str, record: &Map<String, Value>) -> ValidationResult {
        let rules = self.rules.read().expect("rules lock poisoned");
        let Some(fields) = rules.get(domain) else {
            return ValidationResult::valid();
        };

        let mut errors = Vec::new();
        for (field, rule) in fields {
            if rule.required && !record.contains_key(field.as_str()) {
                errors.push(format!("{field} is required"));
            }
        }
        for (field, value) in record {
            if let Some(rule) = fields.get(field.as_str()) {
                errors.extend(Self::check_value(field, value, rule).errors);
            }
        }
        ValidationResult::from_errors(errors)
    }

    fn check_value(field: &str, value: &Value, rule: &ValidationRule) -> ValidationResult {
        let empty = match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        if empty {
            // Required emptiness short-circuits the string checks; optional
            // emptiness has nothing left to check.
            if rule.required {
                return ValidationResult::from_errors(vec![format!("{field} is required")]);
            }
            return ValidationResult::valid();
        }

        let mut errors = Vec::new();

        if let Some(expected) = rule.expected_type {
            if !expected.matches(value) {
                errors.push(format!("{field} must be a {}", expected.name()));
            }
        }

        if let Value::String(s) = value {
            if let Some(pattern) = &rule.pattern {
                if !pattern.is_match(s) {
                    errors.push(format!("{field} has an invalid format"));
                }
            }
            if let Some(min) = rule.min_length {
                if s.chars().count() < min {
                    errors.push(format!("{field} must be at least {min} characters"));
                }
            }
            if let Some(max) = rule.max_length {
                if s.chars().count() > max {
                    errors.push(format!("{field} must be at most {max} characters"));
                }
            }
            if let Some(allowed) = &rule.allowed_values {
                if !allowed.iter().any(|a| a == s) {
                    errors.push(format!("{field} must be one of: {}", allowed.join(", ")));
                }
            }
        }

        if let Some(custom) = &rule.custom {
            if !custom(value) {
                errors.push(format!("{field} failed validation"));
            }
        }

        ValidationResult::from_errors(errors)
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}
