//! Request admission subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request:
//!     → guard.rs (CSRF token check for state-changing methods)
//!     → rate_limit.rs (fixed-window counter for the target)
//!     → allowed / denied with reason
//!
//! block_list.rs holds the persistent deny-list, consulted by callers
//! before dispatch.
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing token or exhausted window denies the request
//! - First failing check supplies the reason; CSRF is checked first
//! - Counters are in-memory only, the block list persists

pub mod block_list;
pub mod csrf;
pub mod guard;
pub mod rate_limit;

pub use block_list::BlockList;
pub use csrf::CsrfTokens;
pub use guard::{Admission, ApiRequest, DenialReason, RequestGuard, RequestMethod, CSRF_HEADER};
pub use rate_limit::{RateLimiter, DEFAULT_LIMIT, DEFAULT_WINDOW_MS};
