// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider integration.
//!
//! Credential storage, password hashing and token issuance all live in the
//! external provider. This module only defines the seam ([`IdentityProvider`]),
//! its implementations, and the [`IdentityAdapter`] the rest of the app talks to.

pub mod adapter;
pub mod events;
pub mod gotrue;
pub mod memory;

pub use adapter::{IdentityAdapter, LookupError, SessionLookup};
pub use events::{SessionChange, SessionEvent, SessionEvents, Subscription};
pub use gotrue::GoTrueProvider;
pub use memory::MemoryProvider;

use async_trait::async_trait;

use crate::models::{Metadata, Session, User};

/// Result of a registration request.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: User,
    /// Absent when the provider requires email confirmation first.
    pub session: Option<Session>,
}

/// Failure reported by the provider. Never shown to users verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Provider rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Provider request failed: {0}")]
    Transport(String),

    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// True when the provider could not answer, as opposed to refusing.
    ///
    /// Stored sessions survive transient failures.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Transport(_) | ProviderError::Malformed(_) => true,
            ProviderError::Rejected { status, .. } => *status == 429 || *status >= 500,
            ProviderError::InvalidCredentials => false,
        }
    }
}

/// User-facing authentication failure.
///
/// The messages are deliberately generic so they do not reveal whether an
/// account exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Unable to log in. Please check your credentials.")]
    SignIn,

    #[error("Unable to register. Please try again.")]
    SignUp,
}

/// External identity provider operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange email + password for a session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError>;

    /// Register a new identity with attached metadata.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &Metadata,
    ) -> Result<SignUpOutcome, ProviderError>;

    /// Invalidate the session the access token belongs to.
    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError>;

    /// Fetch the user for a still-valid access token.
    async fn get_user(&self, access_token: &str) -> Result<User, ProviderError>;

    /// Exchange a refresh token for a new session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ProviderError>;
}
