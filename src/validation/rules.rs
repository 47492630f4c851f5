//! Declarative field rules.

use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

/// Predicate run after the declarative checks pass over a value.
pub type CustomCheck = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Primitive type a field is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
}

impl FieldType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
        }
    }
}

/// Validation rule for one (domain, field) pair.
///
/// Rules are configuration: loaded at engine construction and upserted at
/// runtime via `add_rule`. All constraints are optional; an empty rule
/// accepts everything.
#[derive(Clone, Default)]
pub struct ValidationRule {
    pub pattern: Option<Regex>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub required: bool,
    pub allowed_values: Option<Vec<String>>,
    pub expected_type: Option<FieldType>,
    pub custom: Option<CustomCheck>,
}

impl ValidationRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Panics on an invalid pattern; rule sets are authored, not user input.
    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(Regex::new(pattern).expect("invalid rule pattern"));
        self
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub fn allowed(mut self, values: &[&str]) -> Self {
        self.allowed_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn expect(mut self, ty: FieldType) -> Self {
        self.expected_type = Some(ty);
        self
    }

    pub fn custom(mut self, check: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.custom = Some(Arc::new(check));
        self
    }
}

impl std::fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationRule")
            .field("pattern", &self.pattern.as_ref().map(|r| r.as_str()))
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("required", &self.required)
            .field("allowed_values", &self.allowed_values)
            .field("expected_type", &self.expected_type)
            .field("custom", &self.custom.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Rule sets for the dashboard's record domains, loaded at startup.
pub fn default_rules() -> Vec<(&'static str, &'static str, ValidationRule)> {
    vec![
        (
            "user",
            "username",
            ValidationRule::new()
                .required()
                .expect(FieldType::String)
                .pattern(r"^[A-Za-z0-9_-]+$")
                .length(3, 32),
        ),
        (
            "user",
            "email",
            ValidationRule::new()
                .required()
                .expect(FieldType::String)
                .pattern(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
                .length(3, 254),
        ),
        (
            "user",
            "password",
            ValidationRule::new()
                .required()
                .expect(FieldType::String)
                .length(8, 128),
        ),
        (
            "user",
            "role",
            ValidationRule::new()
                .expect(FieldType::String)
                .allowed(&["admin", "operator", "viewer"]),
        ),
        (
            "job",
            "name",
            ValidationRule::new()
                .required()
                .expect(FieldType::String)
                .length(1, 120),
        ),
        (
            "job",
            "type",
            ValidationRule::new()
                .required()
                .expect(FieldType::String)
                .allowed(&["batch", "stream", "scheduled"]),
        ),
        (
            "job",
            "priority",
            ValidationRule::new()
                .expect(FieldType::Number)
                .custom(|v| v.as_i64().map(|n| (0..=10).contains(&n)).unwrap_or(false)),
        ),
    ]
}
