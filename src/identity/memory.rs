// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process identity provider for local development and tests.
//!
//! Accounts live only in memory and vanish on restart. Access tokens are real
//! HS256 JWTs so the token lifecycle (expiry, refresh rotation, revocation)
//! behaves like the hosted provider.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use subtle::ConstantTimeEq;

use super::{IdentityProvider, ProviderError, SignUpOutcome};
use crate::models::{Metadata, Session, SessionTokens, User};

const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password_digest: [u8; 32],
    confirmed: bool,
}

/// What a refresh token may be exchanged for.
#[derive(Debug, Clone)]
struct RefreshGrant {
    user_id: String,
    /// Token id of the access token issued alongside it
    jti: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    exp: usize,
    iat: usize,
    /// Unique per token so revocation does not hit sibling sessions.
    jti: String,
}

/// Identity provider backed by process memory.
pub struct MemoryProvider {
    /// Accounts keyed by normalized email
    accounts: DashMap<String, Account>,
    /// Live refresh tokens
    refresh_tokens: DashMap<String, RefreshGrant>,
    /// Token ids of signed-out access tokens
    revoked: DashSet<String>,
    signing_key: Vec<u8>,
    access_ttl: Duration,
    require_confirmation: bool,
    latency: Option<Duration>,
    sign_in_attempts: AtomicUsize,
    sign_up_attempts: AtomicUsize,
    sign_out_attempts: AtomicUsize,
}

impl MemoryProvider {
    pub fn new(signing_key: &[u8]) -> Self {
        Self {
            accounts: DashMap::new(),
            refresh_tokens: DashMap::new(),
            revoked: DashSet::new(),
            signing_key: signing_key.to_vec(),
            access_ttl: DEFAULT_ACCESS_TTL,
            require_confirmation: false,
            latency: None,
            sign_in_attempts: AtomicUsize::new(0),
            sign_up_attempts: AtomicUsize::new(0),
            sign_out_attempts: AtomicUsize::new(0),
        }
    }

    /// Lifetime of issued access tokens.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Hold back sessions on sign-up until [`MemoryProvider::confirm_email`].
    pub fn with_email_confirmation(mut self, required: bool) -> Self {
        self.require_confirmation = required;
        self
    }

    /// Delay every credential operation, like a remote provider would.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Mark an account as confirmed. Returns false for unknown emails.
    pub fn confirm_email(&self, email: &str) -> bool {
        match self.accounts.get_mut(&normalize_email(email)) {
            Some(mut account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    pub fn sign_in_attempts(&self) -> usize {
        self.sign_in_attempts.load(Ordering::SeqCst)
    }

    pub fn sign_up_attempts(&self) -> usize {
        self.sign_up_attempts.load(Ordering::SeqCst)
    }

    pub fn sign_out_attempts(&self) -> usize {
        self.sign_out_attempts.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn issue_session(&self, user: User) -> Result<Session, ProviderError> {
        let now = chrono::Utc::now().timestamp();
        let expires_at = now + self.access_ttl.as_secs() as i64;

        let jti = uuid::Uuid::new_v4().to_string();
        let claims = AccessClaims {
            sub: user.id.clone(),
            exp: expires_at as usize,
            iat: now as usize,
            jti: jti.clone(),
        };
        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .map_err(|e| ProviderError::Malformed(format!("token encoding failed: {e}")))?;

        let refresh_token = uuid::Uuid::new_v4().simple().to_string();
        self.refresh_tokens.insert(
            refresh_token.clone(),
            RefreshGrant {
                user_id: user.id.clone(),
                jti,
            },
        );

        Ok(Session {
            tokens: SessionTokens {
                access_token,
                refresh_token,
                expires_at,
            },
            user,
        })
    }

    fn decode_access(&self, access_token: &str) -> Result<AccessClaims, ProviderError> {
        let claims = decode::<AccessClaims>(
            access_token,
            &DecodingKey::from_secret(&self.signing_key),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| ProviderError::Rejected {
            status: 401,
            message: format!("invalid access token: {e}"),
        })?
        .claims;

        if self.revoked.contains(&claims.jti) {
            return Err(ProviderError::Rejected {
                status: 401,
                message: "session signed out".to_string(),
            });
        }
        Ok(claims)
    }

    fn user_by_id(&self, user_id: &str) -> Option<User> {
        self.accounts
            .iter()
            .find(|entry| entry.user.id == user_id)
            .map(|entry| entry.user.clone())
    }
}

#[async_trait]
impl IdentityProvider for MemoryProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        self.sign_in_attempts.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let account = self
            .accounts
            .get(&normalize_email(email))
            .map(|entry| entry.value().clone())
            .ok_or(ProviderError::InvalidCredentials)?;

        let matches: bool = password_digest(password)
            .as_slice()
            .ct_eq(account.password_digest.as_slice())
            .into();
        if !matches {
            return Err(ProviderError::InvalidCredentials);
        }

        if !account.confirmed {
            return Err(ProviderError::Rejected {
                status: 400,
                message: "email not confirmed".to_string(),
            });
        }

        self.issue_session(account.user)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &Metadata,
    ) -> Result<SignUpOutcome, ProviderError> {
        self.sign_up_attempts.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let key = normalize_email(email);
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email.trim().to_string()),
            metadata: metadata.clone(),
        };
        let account = Account {
            user: user.clone(),
            password_digest: password_digest(password),
            confirmed: !self.require_confirmation,
        };

        match self.accounts.entry(key) {
            Entry::Occupied(_) => {
                return Err(ProviderError::Rejected {
                    status: 422,
                    message: "user already registered".to_string(),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(account);
            }
        }

        let session = if self.require_confirmation {
            None
        } else {
            Some(self.issue_session(user.clone())?)
        };

        Ok(SignUpOutcome { user, session })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        self.sign_out_attempts.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let claims = self.decode_access(access_token)?;
        self.refresh_tokens.retain(|_, grant| grant.jti != claims.jti);
        self.revoked.insert(claims.jti);
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<User, ProviderError> {
        let claims = self.decode_access(access_token)?;
        self.user_by_id(&claims.sub).ok_or(ProviderError::Rejected {
            status: 404,
            message: "user not found".to_string(),
        })
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ProviderError> {
        // Refresh tokens are single use.
        let (_, grant) =
            self.refresh_tokens
                .remove(refresh_token)
                .ok_or_else(|| ProviderError::Rejected {
                    status: 400,
                    message: "invalid refresh token".to_string(),
                })?;

        let user = self.user_by_id(&grant.user_id).ok_or(ProviderError::Rejected {
            status: 404,
            message: "user not found".to_string(),
        })?;
        self.issue_session(user)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn password_digest(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> Metadata {
        let mut map = Metadata::new();
        map.insert("first_name".to_string(), "Ada".into());
        map
    }

    #[tokio::test]
    async fn test_sign_in_is_case_insensitive_on_email() {
        let provider = MemoryProvider::new(b"memory-test-key");
        provider
            .sign_up("Ada@Example.com", "hunter22", &metadata())
            .await
            .unwrap();

        let session = provider
            .sign_in_with_password("ada@example.com", "hunter22")
            .await
            .unwrap();
        assert_eq!(session.user.metadata["first_name"], "Ada");
        assert_eq!(provider.sign_in_attempts(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let provider = MemoryProvider::new(b"memory-test-key");
        provider
            .sign_up("ada@example.com", "hunter22", &metadata())
            .await
            .unwrap();

        let err = provider
            .sign_in_with_password("ada@example.com", "hunter23")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_only_that_token() {
        let provider = MemoryProvider::new(b"memory-test-key");
        provider
            .sign_up("ada@example.com", "hunter22", &metadata())
            .await
            .unwrap();

        let first = provider
            .sign_in_with_password("ada@example.com", "hunter22")
            .await
            .unwrap();
        let second = provider
            .sign_in_with_password("ada@example.com", "hunter22")
            .await
            .unwrap();

        provider.sign_out(&first.tokens.access_token).await.unwrap();

        assert!(provider.get_user(&first.tokens.access_token).await.is_err());
        assert!(provider.get_user(&second.tokens.access_token).await.is_ok());
        assert!(provider
            .refresh_session(&first.tokens.refresh_token)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_unconfirmed_account_cannot_sign_in() {
        let provider = MemoryProvider::new(b"memory-test-key").with_email_confirmation(true);
        let outcome = provider
            .sign_up("ada@example.com", "hunter22", &metadata())
            .await
            .unwrap();
        assert!(outcome.session.is_none());

        assert!(provider
            .sign_in_with_password("ada@example.com", "hunter22")
            .await
            .is_err());

        assert!(provider.confirm_email("ada@example.com"));
        assert!(provider
            .sign_in_with_password("ada@example.com", "hunter22")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_token_from_other_key_rejected() {
        let issuer = MemoryProvider::new(b"memory-test-key");
        let outcome = issuer
            .sign_up("ada@example.com", "hunter22", &metadata())
            .await
            .unwrap();
        let token = outcome.session.unwrap().tokens.access_token;

        let other = MemoryProvider::new(b"another-key");
        assert!(other.get_user(&token).await.is_err());
    }
}
