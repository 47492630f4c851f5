//! Content-Security-Policy management.
//!
//! # Responsibilities
//! - Hold the directive → allowed-sources mapping, insertion-ordered
//! - Render the policy string and publish it for the hosting layer
//! - Apply mutations immediately (every add/remove re-renders)
//!
//! # Design Decisions
//! - Restrictive seed: everything scoped to 'self' plus a small allow-list
//! - The published string is the applied policy; last write wins and
//!   re-publishing an identical string is a no-op for observers

use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex};

/// Directive table plus the currently applied rendered policy.
pub struct CspManager {
    // Vec keeps directive insertion order; sources stay unique per directive.
    directives: Mutex<Vec<(String, Vec<String>)>>,
    applied: ArcSwap<String>,
}

impl CspManager {
    /// Manager seeded with the restrictive default policy, already applied.
    pub fn new() -> Self {
        let directives: Vec<(String, Vec<String>)> = [
            ("default-src", vec!["'self'"]),
            ("script-src", vec!["'self'", "'unsafe-inline'", "https://cdn.jsdelivr.net"]),
            ("style-src", vec!["'self'", "'unsafe-inline'", "https://fonts.googleapis.com"]),
            ("img-src", vec!["'self'", "data:", "https:"]),
            ("connect-src", vec!["'self'"]),
            ("font-src", vec!["'self'", "https://fonts.gstatic.com"]),
            ("object-src", vec!["'none'"]),
            ("media-src", vec!["'self'"]),
            ("frame-src", vec!["'none'"]),
        ]
        .into_iter()
        .map(|(d, s)| (d.to_string(), s.into_iter().map(String::from).collect()))
        .collect();

        let manager = Self {
            directives: Mutex::new(directives),
            applied: ArcSwap::from_pointee(String::new()),
        };
        manager.apply();
        manager
    }

    /// Allow `source` for `directive`; duplicates are ignored. Creates the
    /// directive if it is new and re-applies the policy.
    pub fn add_source(&self, directive: &str, source: &str) {
        {
            let mut directives = self.directives.lock().expect("csp mutex poisoned");
            match directives.iter().position(|(d, _)| d == directive) {
                Some(i) => {
                    let sources = &mut directives[i].1;
                    if sources.iter().any(|s| s == source) {
                        return;
                    }
                    sources.push(source.to_string());
                }
                None => directives.push((directive.to_string(), vec![source.to_string()])),
            }
        }
        tracing::info!(directive, source, "CSP source added");
        self.apply();
    }

    /// Disallow `source` for `directive`; unknown pairs are a no-op.
    pub fn remove_source(&self, directive: &str, source: &str) {
        let changed = {
            let mut directives = self.directives.lock().expect("csp mutex poisoned");
            match directives.iter_mut().find(|(d, _)| d == directive) {
                Some((_, sources)) => {
                    let before = sources.len();
                    sources.retain(|s| s != source);
                    sources.len() != before
                }
                None => false,
            }
        };
        if changed {
            tracing::info!(directive, source, "CSP source removed");
            self.apply();
        }
    }

    /// Render the policy string: `directive src src; directive src`, in
    /// directive insertion order.
    pub fn policy_string(&self) -> String {
        let directives = self.directives.lock().expect("csp mutex poisoned");
        directives
            .iter()
            .map(|(d, sources)| format!("{d} {}", sources.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// The policy string currently applied to the hosting page.
    pub fn applied_policy(&self) -> Arc<String> {
        self.applied.load_full()
    }

    // Publish the rendered policy. Hosting code watches applied_policy();
    // swapping in the same string leaves observers unaffected.
    fn apply(&self) {
        let rendered = self.policy_string();
        tracing::debug!(policy = %rendered, "CSP applied");
        self.applied.store(Arc::new(rendered));
    }
}

impl Default for CspManager {
    fn default() -> Self {
        Self::new()
    }
}
