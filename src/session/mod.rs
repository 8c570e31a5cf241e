//! Approval and session memory.
//!
//! The engine itself is stateless between calls; the caller owns every
//! piece of trust state and passes it in. This module provides the two
//! containers for that state: per-conversation approved prefixes, and the
//! on-disk store used only by interactive single-user sessions.

mod store;

pub use store::{ApprovedPrefixStore, default_store_path};

/// How this process handles trust decisions.
///
/// An explicit value passed at construction time, deliberately not a
/// process-wide toggle: a served deployment must never perform approval
/// file I/O or inherit another local user's trust decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Multi-conversation server. Session prefixes arrive from the caller
    /// with each request; nothing is read from or written to local files.
    Served,
    /// Single-user interactive session. Approvals may persist on disk and
    /// are re-merged into the allow list at session start.
    Interactive,
}

/// Prefixes a human approved for the remaining lifetime of one
/// conversation.
///
/// Created empty at conversation start and grown only by explicit approval
/// events. Never persisted to shared configuration and never visible to
/// other conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPrefixes {
    prefixes: Vec<String>,
}

impl SessionPrefixes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one approved prefix, preserving first-seen order.
    pub fn approve(&mut self, prefix: &str) {
        if !self.prefixes.iter().any(|p| p == prefix) {
            self.prefixes.push(prefix.to_string());
        }
    }

    /// Record a batch of approved prefixes.
    pub fn approve_all<I, S>(&mut self, prefixes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for prefix in prefixes {
            self.approve(prefix.as_ref());
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Fold these prefixes into an effective allow-list copy, skipping
    /// entries already present. The target is always a per-call copy; this
    /// never touches caller-owned configuration.
    pub fn merge_into(&self, allow_list: &mut Vec<String>) {
        for prefix in &self.prefixes {
            if !allow_list.iter().any(|existing| existing == prefix) {
                allow_list.push(prefix.clone());
            }
        }
    }
}
