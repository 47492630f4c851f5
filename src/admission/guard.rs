//! Request admission guard.
//!
//! Composes the CSRF check and the rate limiter into one decision for an
//! outbound request description. CSRF is checked first; the first failing
//! check supplies the denial reason.

use std::collections::HashMap;

use crate::admission::csrf::CsrfTokens;
use crate::admission::rate_limit::RateLimiter;

/// Header expected to carry the CSRF token on state-changing requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// HTTP method of a request under admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl RequestMethod {
    /// Pure reads are exempt from the CSRF requirement.
    pub fn is_read(&self) -> bool {
        matches!(self, RequestMethod::Get | RequestMethod::Head | RequestMethod::Options)
    }
}

/// Description of a request the guard decides on.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: RequestMethod,
    pub url: String,
    headers: HashMap<String, String>,
}

impl ApiRequest {
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Attach a header. Names are matched case-insensitively.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    // Rate-limit key: the request target without its query string.
    fn rate_key(&self) -> String {
        let target = self.url.split('?').next().unwrap_or(&self.url);
        format!("api:{target}")
    }
}

/// Why a request was denied admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    InvalidCsrfToken,
    RateLimitExceeded,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::InvalidCsrfToken => "Invalid CSRF token",
            DenialReason::RateLimitExceeded => "Rate limit exceeded",
        }
    }
}

/// Admission decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied(DenialReason),
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Evaluates requests against the CSRF token and the rate limiter.
pub struct RequestGuard<'a> {
    pub csrf: &'a CsrfTokens,
    pub limiter: &'a RateLimiter,
    /// Per-target allowance within one window.
    pub limit: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl RequestGuard<'_> {
    /// Decide admission for `request`.
    ///
    /// State-changing methods must echo the current CSRF token in
    /// [`CSRF_HEADER`]; every request is then counted against the
    /// fixed-window limit for its target.
    pub fn evaluate(&self, request: &ApiRequest) -> Admission {
        if !request.method.is_read() {
            let presented = request.header_value(CSRF_HEADER).unwrap_or("");
            if !self.csrf.matches(presented) {
                return Admission::Denied(DenialReason::InvalidCsrfToken);
            }
        }

        if !self.limiter.check(&request.rate_key(), self.limit, self.window_ms) {
            return Admission::Denied(DenialReason::RateLimitExceeded);
        }

        Admission::Allowed
    }
}
