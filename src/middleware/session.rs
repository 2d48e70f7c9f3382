// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie middleware.
//!
//! The browser holds only the provider's token bundle, signed with
//! HMAC-SHA256. Every request resolves it into a [`CurrentSession`] extension
//! before the handler runs.

use crate::config::Config;
use crate::identity::LookupError;
use crate::models::{Session, SessionTokens};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "attendance_session";
const SESSION_MAX_AGE_DAYS: i64 = 30;

/// Session resolved for the current request, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<Session>);

impl CurrentSession {
    pub fn session(&self) -> Option<&Session> {
        self.0.as_ref()
    }
}

/// Cookie change to apply once the handler has run.
enum CookieUpdate {
    Keep,
    Store(SessionTokens),
    Remove,
}

/// Middleware that resolves the session cookie into [`CurrentSession`].
///
/// Refreshed tokens are written back and rejected cookies are removed, unless
/// the handler already set the session cookie itself. While the provider is
/// unreachable the request is served signed out and the cookie is left alone.
pub async fn resolve_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let (session, update) = match jar.get(SESSION_COOKIE) {
        None => (None, CookieUpdate::Keep),
        Some(cookie) => {
            match decode_session_cookie(cookie.value(), &state.config.cookie_signing_key) {
                None => {
                    tracing::warn!("Session cookie signature mismatch, discarding");
                    (None, CookieUpdate::Remove)
                }
                Some(tokens) => match state.identity.current_session(&tokens).await {
                    Ok(lookup) if lookup.refreshed => {
                        let tokens = lookup.session.tokens.clone();
                        (Some(lookup.session), CookieUpdate::Store(tokens))
                    }
                    Ok(lookup) => (Some(lookup.session), CookieUpdate::Keep),
                    Err(LookupError::Unavailable) => (None, CookieUpdate::Keep),
                    Err(LookupError::Rejected) => (None, CookieUpdate::Remove),
                },
            }
        }
    };

    request.extensions_mut().insert(CurrentSession(session));
    let mut response = next.run(request).await;

    if handler_set_session_cookie(&response) {
        return response;
    }

    let cookie = match update {
        CookieUpdate::Keep => return response,
        CookieUpdate::Store(tokens) => match session_cookie(&state.config, &tokens) {
            Ok(cookie) => cookie,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode refreshed session cookie");
                return response;
            }
        },
        CookieUpdate::Remove => removal_cookie(&state.config),
    };

    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "Session cookie is not a valid header value"),
    }
    response
}

fn handler_set_session_cookie(response: &Response) -> bool {
    let prefix = format!("{SESSION_COOKIE}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}

/// Build the session cookie for `tokens`.
pub fn session_cookie(config: &Config, tokens: &SessionTokens) -> anyhow::Result<Cookie<'static>> {
    let value = encode_session_cookie(tokens, &config.cookie_signing_key)?;
    Ok(Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(config.secure_cookies())
        .max_age(time::Duration::days(SESSION_MAX_AGE_DAYS))
        .build())
}

/// Cookie that clears the session. Attributes match [`session_cookie`].
pub fn removal_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(config.secure_cookies())
        .max_age(time::Duration::ZERO)
        .build()
}

/// `base64url(json) + "." + hex(hmac)`
pub fn encode_session_cookie(tokens: &SessionTokens, secret: &[u8]) -> anyhow::Result<String> {
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(tokens)?);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!("{payload}.{signature}"))
}

/// Verify and decode a session cookie value. `None` if tampered or malformed.
pub fn decode_session_cookie(value: &str, secret: &[u8]) -> Option<SessionTokens> {
    let (payload, signature_hex) = value.rsplit_once('.')?;
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).ok()?;

    let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&json).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> SessionTokens {
        SessionTokens {
            access_token: "access.jwt.value".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 1_900_000_000,
        }
    }

    #[test]
    fn test_cookie_codec_accepts_own_signature() {
        let value = encode_session_cookie(&tokens(), b"secret_key").unwrap();
        assert_eq!(decode_session_cookie(&value, b"secret_key"), Some(tokens()));
    }

    #[test]
    fn test_cookie_codec_rejects_tampering() {
        let value = encode_session_cookie(&tokens(), b"secret_key").unwrap();
        assert_eq!(decode_session_cookie(&value, b"other_key"), None);

        let (payload, signature) = value.rsplit_once('.').unwrap();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&SessionTokens {
                access_token: "forged".to_string(),
                ..tokens()
            })
            .unwrap(),
        );
        assert_eq!(
            decode_session_cookie(&format!("{forged}.{signature}"), b"secret_key"),
            None
        );
        assert_eq!(decode_session_cookie(payload, b"secret_key"), None);
        assert_eq!(decode_session_cookie("", b"secret_key"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = Config::test_default();
        let cookie = session_cookie(&config, &tokens()).unwrap().to_string();
        assert!(cookie.starts_with("attendance_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=2592000"));
        assert!(!cookie.contains("Secure"));

        config.public_url = "https://attendance.example.edu".to_string();
        let removal = removal_cookie(&config).to_string();
        assert!(removal.starts_with("attendance_session=;"));
        assert!(removal.contains("Max-Age=0"));
        assert!(removal.contains("Secure"));
        assert!(removal.contains("HttpOnly"));
    }
}
