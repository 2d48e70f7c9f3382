// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracks identity operations that are still waiting on the provider.
//!
//! A form submit acquires a guard for its key; a second submit for the same
//! key is refused until the first one finishes.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

/// Set of keys with an operation in flight.
#[derive(Clone, Default)]
pub struct InFlight {
    active: Arc<DashMap<String, Instant>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. Returns `None` if an operation for it is already running.
    pub fn try_acquire(&self, key: impl Into<String>) -> Option<InFlightGuard> {
        let key = key.into();
        match self.active.entry(key.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                Some(InFlightGuard {
                    key,
                    active: self.active.clone(),
                })
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.active.contains_key(key)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Releases its key when dropped.
pub struct InFlightGuard {
    key: String,
    active: Arc<DashMap<String, Instant>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some((_, started)) = self.active.remove(&self.key) {
            tracing::debug!(
                key = %self.key,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "In-flight operation finished"
            );
        }
    }
}

/// Key for login/registration submits.
pub fn credentials_key(email: &str) -> String {
    format!("credentials:{}", email.trim().to_lowercase())
}

/// Key for sign-out of a user.
pub fn sign_out_key(user_id: &str) -> String {
    format!("sign_out:{user_id}")
}
