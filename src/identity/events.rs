// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session-change notifications.
//!
//! Listeners are registered with [`SessionEvents::subscribe`] and stay active
//! until the returned [`Subscription`] is unsubscribed or dropped.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::models::Session;

/// Kind of session transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

impl SessionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEvent::SignedIn => "signed_in",
            SessionEvent::SignedOut => "signed_out",
            SessionEvent::TokenRefreshed => "token_refreshed",
        }
    }
}

/// A session transition and the session in effect afterwards.
#[derive(Debug, Clone)]
pub struct SessionChange {
    pub event: SessionEvent,
    /// The new session, `None` after sign-out.
    pub session: Option<Session>,
    /// User the transition concerns (also set for sign-out).
    pub user_id: Option<String>,
}

type Listener = Arc<dyn Fn(&SessionChange) + Send + Sync>;

/// Registry of session-change listeners.
#[derive(Default)]
pub struct SessionEvents {
    listeners: DashMap<u64, Listener>,
    next_id: AtomicU64,
}

impl SessionEvents {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `listener`; it is called for every change until the returned
    /// subscription is released.
    pub fn subscribe<F>(self: &Arc<Self>, listener: F) -> Subscription
    where
        F: Fn(&SessionChange) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(id, Arc::new(listener));
        Subscription {
            id,
            events: Arc::downgrade(self),
            active: true,
        }
    }

    /// Notify all current listeners.
    pub fn emit(&self, change: &SessionChange) {
        // Snapshot first: listeners may unsubscribe while being called.
        let listeners: Vec<Listener> = self
            .listeners
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for listener in listeners {
            listener(change);
        }
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn remove(&self, id: u64) -> bool {
        self.listeners.remove(&id).is_some()
    }
}

/// Handle for a registered listener. Deregisters exactly once, either through
/// [`Subscription::unsubscribe`] or on drop.
#[must_use = "dropping a Subscription immediately deregisters the listener"]
pub struct Subscription {
    id: u64,
    events: Weak<SessionEvents>,
    active: bool,
}

impl Subscription {
    #[cfg(test)]
    fn is_active(&self) -> bool {
        self.active
    }

    /// Deregister the listener. Returns whether it was still registered.
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        if !std::mem::replace(&mut self.active, false) {
            return false;
        }
        self.events
            .upgrade()
            .map(|events| events.remove(self.id))
            .unwrap_or(false)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}
