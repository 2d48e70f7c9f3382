// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use attendance_portal::config::Config;
use attendance_portal::identity::MemoryProvider;
use attendance_portal::routes::create_router;
use attendance_portal::AppState;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse battery staple";

/// Test app wiring: router, shared state and the in-memory provider behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub provider: Arc<MemoryProvider>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Register Ada through the form and return her session cookie pair.
    pub async fn register_ada(&self) -> String {
        let response = self
            .send(post_form(
                "/auth/register",
                &format!(
                    "email=ada%40example.com&password={}&first_name=Ada&last_name=Lovelace&student_id=24-0001",
                    urlencoding::encode(PASSWORD)
                ),
                None,
            ))
            .await;
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        session_cookie_pair(&response).expect("registration sets session cookie")
    }
}

/// Create a test app around a fresh in-memory provider.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::test_default(), |provider| provider)
}

/// Create a test app, letting the caller tune the provider and config.
#[allow(dead_code)]
pub fn create_test_app_with(
    config: Config,
    tune: impl FnOnce(MemoryProvider) -> MemoryProvider,
) -> TestApp {
    let provider = Arc::new(tune(MemoryProvider::new(&config.cookie_signing_key)));
    let state = Arc::new(AppState::new(config, provider.clone()).expect("state builds"));

    TestApp {
        router: create_router(state.clone()),
        state,
        provider,
    }
}

#[allow(dead_code)]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn login_body(email: &str, password: &str) -> String {
    format!(
        "email={}&password={}",
        urlencoding::encode(email),
        urlencoding::encode(password)
    )
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Full `Set-Cookie` header for the session cookie, if the response sets one.
#[allow(dead_code)]
pub fn session_set_cookie(response: &Response) -> Option<String> {
    set_cookie_headers(response)
        .into_iter()
        .find(|value| value.starts_with("attendance_session="))
}

/// `name=value` pair of the session cookie, ready for a `Cookie` header.
#[allow(dead_code)]
pub fn session_cookie_pair(response: &Response) -> Option<String> {
    session_set_cookie(response).map(|value| value.split(';').next().unwrap().to_string())
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
