//! Security audit journal.
//!
//! # Data Flow
//! ```text
//! Any subsystem:
//!     → journal.rs log_event (stamp, prepend, bound capacity)
//!         → tracing (urgent events, synchronously)
//!         → immediate single-event send (fire-and-forget, if enabled)
//!     → exporter.rs (interval batch POST of unpersisted events)
//! ```
//!
//! # Design Decisions
//! - Journal is the source of truth; remote persistence is best-effort
//! - At-least-once export; sinks deduplicate by event id
//! - The persistence credential never reaches the local store in cleartext

pub mod event;
pub mod exporter;
pub mod journal;

pub use event::{EventDraft, EventFilter, EventKind, EventLevel, EventStatus, SecurityEvent};
pub use exporter::{AuditExporter, DEFAULT_EXPORT_INTERVAL_SECS};
pub use journal::{AuditJournal, AuditSettings, CallerIdentity, DEFAULT_CAPACITY, DEFAULT_QUERY_LIMIT};
