// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! In-process TTL cache for short-lived auth state.
//!
//! Holds verification codes, password reset codes, and session markers.
//! Entries expire lazily: an expired entry is purged the next time it is
//! touched, so no sweeper task is needed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use subtle::ConstantTimeEq;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Shared TTL cache. Cloning is cheap and clones see the same entries.
#[derive(Debug, Clone, Default)]
pub struct TtlCache {
    entries: Arc<DashMap<String, Entry>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key` for `ttl`. An existing entry is replaced
    /// and its remaining lifetime discarded.
    pub fn put(&self, key: &str, value: &str, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Look up a live entry. Expired entries are treated as absent and
    /// removed.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Some(entry.value.clone());
            }
        }
        self.entries.remove(key);
        None
    }

    /// Remove an entry. Returns true only if a live entry was present.
    pub fn remove(&self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some((_, entry)) => !entry.is_expired(),
            None => false,
        }
    }

    /// Constant-time comparison of `candidate` against the live entry for
    /// `key`. Absent or expired entries never match.
    pub fn matches(&self, key: &str, candidate: &str) -> bool {
        match self.get(key) {
            Some(value) => value.as_bytes().ct_eq(candidate.as_bytes()).into(),
            None => false,
        }
    }
}

/// Cache key layout. One namespace per token family.
pub mod keys {
    pub fn verification(email: &str) -> String {
        format!("email_verification:{email}")
    }

    pub fn password_reset(email: &str) -> String {
        format!("password_reset:{email}")
    }

    pub fn session(user_id: &str) -> String {
        format!("session:{user_id}")
    }
}
