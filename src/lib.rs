//! Client-side security services for dashboard applications.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌───────────────────────────────────────────────┐
//!                  │               SECURITY SERVICE                │
//!   UI forms /     │                                               │
//!   API callers ──▶│  service (facade, audit side effects)         │
//!                  │     │                                         │
//!                  │     ├─▶ validation (rules, sanitizer)         │
//!                  │     ├─▶ admission  (CSRF → rate limit,        │
//!                  │     │               block list)               │
//!                  │     ├─▶ crypto     (AES-GCM, passwords)       │
//!                  │     ├─▶ csp        (directive allow-lists)    │
//!                  │     └─▶ audit      (journal + exporter)       │
//!                  │                                               │
//!                  │  Cross-cutting: config, storage, lifecycle,   │
//!                  │  observability                                │
//!                  └───────────────────────────────────────────────┘
//! ```
//!
//! Hosts build one [`SecurityService`] at startup and share it by `Arc`;
//! there is no hidden global state.

// Core subsystems
pub mod admission;
pub mod audit;
pub mod crypto;
pub mod csp;
pub mod validation;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod service;
pub mod storage;

pub use admission::{Admission, ApiRequest, RequestMethod, CSRF_HEADER};
pub use audit::{EventDraft, EventFilter, EventKind, EventLevel, EventStatus, SecurityEvent};
pub use config::SecurityConfig;
pub use error::{SecurityError, SecurityResult};
pub use lifecycle::Shutdown;
pub use service::SecurityService;
pub use validation::{ValidationResult, ValidationRule};
