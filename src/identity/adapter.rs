// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Internal interface over the identity provider.
//!
//! Every call is a single attempt. Provider failure reasons are logged but
//! collapsed into [`AuthError`] before they reach a view.

use std::sync::Arc;

use super::events::{SessionChange, SessionEvent, SessionEvents, Subscription};
use super::{AuthError, IdentityProvider};
use crate::models::{RegistrationMetadata, Session, SessionTokens};

/// Outcome of resolving a session from stored tokens.
#[derive(Debug, Clone)]
pub struct SessionLookup {
    pub session: Session,
    /// True when the provider issued new tokens that must be stored again.
    pub refreshed: bool,
}

/// Why stored tokens did not resolve to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The provider refused the tokens. The session is over.
    #[error("Stored session rejected")]
    Rejected,

    /// The provider could not be reached. The tokens may still be good.
    #[error("Identity provider unavailable")]
    Unavailable,
}

/// Wraps an [`IdentityProvider`] and publishes session changes.
#[derive(Clone)]
pub struct IdentityAdapter {
    provider: Arc<dyn IdentityProvider>,
    events: Arc<SessionEvents>,
}

impl IdentityAdapter {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            events: SessionEvents::new(),
        }
    }

    /// Register a session-change listener.
    pub fn on_session_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionChange) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Resolve the session for previously issued tokens.
    ///
    /// Tokens close to expiry are refreshed transparently. A refusal from the
    /// provider ends the session. An unreachable provider leaves it intact.
    pub async fn current_session(
        &self,
        tokens: &SessionTokens,
    ) -> Result<SessionLookup, LookupError> {
        if tokens.needs_refresh(chrono::Utc::now()) {
            return self.refresh(tokens).await;
        }

        match self.provider.get_user(&tokens.access_token).await {
            Ok(user) => Ok(SessionLookup {
                session: Session {
                    tokens: tokens.clone(),
                    user,
                },
                refreshed: false,
            }),
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "Identity provider unavailable during session lookup");
                Err(LookupError::Unavailable)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Stored session rejected by provider");
                Err(LookupError::Rejected)
            }
        }
    }

    async fn refresh(&self, tokens: &SessionTokens) -> Result<SessionLookup, LookupError> {
        match self.provider.refresh_session(&tokens.refresh_token).await {
            Ok(session) => {
                self.emit(SessionEvent::TokenRefreshed, Some(&session), None);
                Ok(SessionLookup {
                    session,
                    refreshed: true,
                })
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "Identity provider unavailable during session refresh");
                Err(LookupError::Unavailable)
            }
            Err(e) => {
                tracing::info!(error = %e, "Session refresh failed, treating as signed out");
                self.emit(SessionEvent::SignedOut, None, None);
                Err(LookupError::Rejected)
            }
        }
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        match self.provider.sign_in_with_password(email, password).await {
            Ok(session) => {
                self.emit(SessionEvent::SignedIn, Some(&session), None);
                Ok(session)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Sign-in failed");
                Err(AuthError::SignIn)
            }
        }
    }

    /// Register a new account.
    ///
    /// Returns `Ok(None)` when the account was created but the provider
    /// requires email confirmation before issuing a session.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: RegistrationMetadata,
    ) -> Result<Option<Session>, AuthError> {
        let metadata = metadata.into_metadata();
        match self.provider.sign_up(email, password, &metadata).await {
            Ok(outcome) => {
                tracing::info!(
                    user_id = %outcome.user.id,
                    confirmed = outcome.session.is_some(),
                    "Account registered"
                );
                if let Some(session) = &outcome.session {
                    self.emit(SessionEvent::SignedIn, Some(session), None);
                }
                Ok(outcome.session)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Sign-up failed");
                Err(AuthError::SignUp)
            }
        }
    }

    /// Invalidate `session`.
    ///
    /// The local session is dropped even when the provider call fails.
    pub async fn sign_out(&self, session: &Session) {
        if let Err(e) = self.provider.sign_out(&session.tokens.access_token).await {
            tracing::warn!(error = %e, user_id = %session.user.id, "Provider sign-out failed");
        }
        self.emit(SessionEvent::SignedOut, None, Some(&session.user.id));
    }

    fn emit(&self, event: SessionEvent, session: Option<&Session>, user_id: Option<&str>) {
        let user_id = session
            .map(|s| s.user.id.clone())
            .or_else(|| user_id.map(str::to_string));
        self.events.emit(&SessionChange {
            event,
            session: session.cloned(),
            user_id,
        });
    }
}
