// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase Auth (GoTrue) REST client.
//!
//! Handles:
//! - Password sign-in and sign-up with user metadata
//! - Sign-out (revokes the session server-side)
//! - User lookup and token refresh

use anyhow::Context;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::time::Duration;

use super::{IdentityProvider, ProviderError, SignUpOutcome};
use crate::models::{Metadata, Session, SessionTokens, User};

/// Supabase Auth API client.
#[derive(Clone)]
pub struct GoTrueProvider {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueProvider {
    /// Create a client for the project at `project_url` (e.g. `https://xyz.supabase.co`).
    pub fn new(project_url: &str, anon_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building identity HTTP client")?;

        Ok(Self {
            http,
            base_url: format!("{}/auth/v1", project_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, ProviderError> {
        let response = self
            .post("/token")
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let session: WireSession = check_response_json(response).await?;
        Ok(session.into_session())
    }
}

#[async_trait]
impl IdentityProvider for GoTrueProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &Metadata,
    ) -> Result<SignUpOutcome, ProviderError> {
        let response = self
            .post("/signup")
            .json(&json!({
                "email": email,
                "password": password,
                "data": metadata,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let outcome = match check_response_json::<SignUpResponse>(response).await? {
            SignUpResponse::Session(session) => {
                let session = session.into_session();
                SignUpOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                }
            }
            SignUpResponse::Pending(user) => SignUpOutcome {
                user: user.into_user(),
                session: None,
            },
        };
        Ok(outcome)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        let response = self
            .post("/logout")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        check_response(response).await
    }

    async fn get_user(&self, access_token: &str) -> Result<User, ProviderError> {
        let response = self
            .http
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let user: WireUser = check_response_json(response).await?;
        Ok(user.into_user())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ProviderError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }
}

/// Session as returned by the token and signup endpoints.
#[derive(Debug, Deserialize)]
struct WireSession {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: WireUser,
}

impl WireSession {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp() + self.expires_in);
        Session {
            tokens: SessionTokens {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                expires_at,
            },
            user: self.user.into_user(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<Metadata>,
}

impl WireUser {
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email.filter(|e| !e.is_empty()),
            metadata: self.user_metadata.unwrap_or_default(),
        }
    }
}

/// Signup returns a full session when autoconfirm is on, otherwise just the
/// user awaiting email confirmation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(WireSession),
    Pending(WireUser),
}

/// GoTrue error body. Field names changed between API versions.
#[derive(Debug, Default, Deserialize)]
struct WireError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl WireError {
    fn describe(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

/// Map a non-success response to a [`ProviderError`].
async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<WireError>(&body)
        .ok()
        .and_then(WireError::describe)
        .unwrap_or(body);

    if status.as_u16() == 429 {
        tracing::warn!("Identity provider rate limit hit (429)");
    }

    if status.as_u16() == 400 && message.to_lowercase().contains("invalid login credentials") {
        return ProviderError::InvalidCredentials;
    }

    ProviderError::Rejected {
        status: status.as_u16(),
        message,
    }
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<(), ProviderError> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(error_from_response(response).await)
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::Malformed(e.to_string()))
}
