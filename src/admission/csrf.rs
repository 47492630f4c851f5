//! CSRF token management.
//!
//! One token per process, not per session: the hosting dashboard is a
//! single-user client, so there is no session to bind to. A multi-session
//! host would key tokens by session id instead.

use arc_swap::ArcSwapOption;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;

const TOKEN_BYTES: usize = 32;

/// Holder of the current process-wide CSRF token.
pub struct CsrfTokens {
    current: ArcSwapOption<String>,
}

impl CsrfTokens {
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
        }
    }

    /// The current token, generating one on first use.
    pub fn token(&self) -> Arc<String> {
        if let Some(token) = self.current.load_full() {
            return token;
        }
        self.regenerate()
    }

    /// Replace the current token with a fresh one and return it.
    ///
    /// Any previously issued token becomes stale immediately.
    pub fn regenerate(&self) -> Arc<String> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = Arc::new(hex::encode(bytes));
        self.current.store(Some(token.clone()));
        tracing::debug!("CSRF token regenerated");
        token
    }

    /// Whether `candidate` matches the current token exactly.
    ///
    /// No token has been issued yet means nothing can match.
    pub fn matches(&self, candidate: &str) -> bool {
        match self.current.load_full() {
            Some(token) => token.as_str() == candidate,
            None => false,
        }
    }
}

impl Default for CsrfTokens {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_64_hex_chars() {
        let tokens = CsrfTokens::new();
        let token = tokens.token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_token_stable_until_regenerated() {
        let tokens = CsrfTokens::new();
        let first = tokens.token();
        let second = tokens.token();
        assert_eq!(first, second);
    }

    #[test]
    fn test_regenerate_invalidates_old_token() {
        let tokens = CsrfTokens::new();
        let old = tokens.token();
        let new = tokens.regenerate();
        assert_ne!(old, new);
        assert!(!tokens.matches(&old));
        assert!(tokens.matches(&new));
    }

    #[test]
    fn test_nothing_matches_before_issue() {
        let tokens = CsrfTokens::new();
        assert!(!tokens.matches(""));
        assert!(!tokens.matches("deadbeef"));
    }
}
