// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session handling while the identity provider is unreachable.
//!
//! A network failure is neither a sign-out nor an expiry: the request is
//! served signed out, but the stored cookie survives until the provider
//! answers again.

use async_trait::async_trait;
use attendance_portal::config::Config;
use attendance_portal::identity::{
    IdentityProvider, MemoryProvider, ProviderError, SessionChange, SessionEvent, SignUpOutcome,
};
use attendance_portal::middleware::session::encode_session_cookie;
use attendance_portal::models::{Metadata, Session, User};
use attendance_portal::routes::create_router;
use attendance_portal::AppState;
use axum::http::StatusCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

mod common;

use common::PASSWORD;

/// Memory provider that can be switched into a connection-reset state.
struct Switchable {
    inner: MemoryProvider,
    down: AtomicBool,
}

impl Switchable {
    fn check(&self) -> Result<(), ProviderError> {
        if self.down.load(Ordering::SeqCst) {
            Err(ProviderError::Transport("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IdentityProvider for Switchable {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        self.check()?;
        self.inner.sign_in_with_password(email, password).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &Metadata,
    ) -> Result<SignUpOutcome, ProviderError> {
        self.check()?;
        self.inner.sign_up(email, password, metadata).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        self.check()?;
        self.inner.sign_out(access_token).await
    }

    async fn get_user(&self, access_token: &str) -> Result<User, ProviderError> {
        self.check()?;
        self.inner.get_user(access_token).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ProviderError> {
        self.check()?;
        self.inner.refresh_session(refresh_token).await
    }
}

struct OutageApp {
    router: axum::Router,
    state: Arc<AppState>,
    provider: Arc<Switchable>,
}

impl OutageApp {
    fn new(ttl: Duration) -> Self {
        let config = Config::test_default();
        let provider = Arc::new(Switchable {
            inner: MemoryProvider::new(&config.cookie_signing_key).with_access_ttl(ttl),
            down: AtomicBool::new(false),
        });
        let state = Arc::new(AppState::new(config, provider.clone()).expect("state builds"));
        Self {
            router: create_router(state.clone()),
            state,
            provider,
        }
    }

    async fn signed_in_cookie(&self) -> String {
        let mut metadata = Metadata::new();
        metadata.insert("first_name".to_string(), "Ada".into());
        metadata.insert("last_name".to_string(), "Lovelace".into());
        let outcome = self
            .provider
            .sign_up("ada@example.com", PASSWORD, &metadata)
            .await
            .unwrap();
        let tokens = outcome.session.unwrap().tokens;
        let value = encode_session_cookie(&tokens, &self.state.config.cookie_signing_key).unwrap();
        format!("attendance_session={value}")
    }

    async fn get(&self, cookie: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(common::get("/", Some(cookie)))
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_unreachable_provider_keeps_cookie() {
    let app = OutageApp::new(Duration::from_secs(3600));
    let cookie = app.signed_in_cookie().await;

    app.provider.down.store(true, Ordering::SeqCst);
    let response = app.get(&cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::session_set_cookie(&response).is_none());
    let html = common::body_text(response).await;
    assert!(html.contains("Welcome back, student"));

    // Once the provider answers again the same cookie signs the user in.
    app.provider.down.store(false, Ordering::SeqCst);
    let response = app.get(&cookie).await;
    assert!(common::session_set_cookie(&response).is_none());
    let html = common::body_text(response).await;
    assert!(html.contains("Welcome, Ada Lovelace"));
}

#[tokio::test]
async fn test_refresh_during_outage_is_not_a_sign_out() {
    // Every use of these tokens goes through a refresh.
    let app = OutageApp::new(Duration::from_secs(5));
    let cookie = app.signed_in_cookie().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _subscription = app
        .state
        .identity
        .on_session_change(move |change: &SessionChange| sink.lock().unwrap().push(change.event));

    app.provider.down.store(true, Ordering::SeqCst);
    let response = app.get(&cookie).await;
    assert!(common::session_set_cookie(&response).is_none());
    assert!(seen.lock().unwrap().is_empty());

    app.provider.down.store(false, Ordering::SeqCst);
    let response = app.get(&cookie).await;
    assert!(common::session_cookie_pair(&response).is_some());
    assert_eq!(*seen.lock().unwrap(), vec![SessionEvent::TokenRefreshed]);
}

#[tokio::test]
async fn test_rejected_tokens_still_clear_cookie() {
    let app = OutageApp::new(Duration::from_secs(3600));
    let cookie = app.signed_in_cookie().await;

    // Revoke the tokens at the provider, then present them again.
    let response = app
        .router
        .clone()
        .oneshot(common::post_form("/auth/logout", "", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.get(&cookie).await;
    let removal = common::session_set_cookie(&response).expect("rejected cookie is cleared");
    assert!(removal.contains("Max-Age=0"));
}
