// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use std::env;
use std::time::Duration;

const MIN_SIGNING_KEY_LEN: usize = 32;

/// Which identity provider backs the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityBackend {
    /// Hosted Supabase Auth project
    Supabase { url: String, anon_key: String },
    /// In-process accounts, lost on restart
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub identity: IdentityBackend,
    /// Externally visible base URL; decides the cookie `Secure` flag
    pub public_url: String,
    /// Server port
    pub port: u16,
    /// Timeout for identity provider requests
    pub provider_timeout: Duration,

    // --- Secrets ---
    /// HMAC key for the session cookie (raw bytes)
    pub cookie_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let identity = match env::var("IDENTITY_BACKEND")
            .unwrap_or_else(|_| "supabase".to_string())
            .to_lowercase()
            .as_str()
        {
            "supabase" => IdentityBackend::Supabase {
                url: env::var("SUPABASE_URL").map_err(|_| ConfigError::Missing("SUPABASE_URL"))?,
                anon_key: env::var("SUPABASE_ANON_KEY")
                    .map(|v| v.trim().to_string())
                    .map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            },
            "memory" => IdentityBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "IDENTITY_BACKEND",
                    reason: format!("unknown backend {other:?}"),
                })
            }
        };

        let cookie_signing_key = env::var("COOKIE_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("COOKIE_SIGNING_KEY"))?
            .into_bytes();
        if cookie_signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid {
                name: "COOKIE_SIGNING_KEY",
                reason: format!("must be at least {MIN_SIGNING_KEY_LEN} bytes"),
            });
        }

        Ok(Self {
            identity,
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            provider_timeout: Duration::from_secs(
                env::var("PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            cookie_signing_key,
        })
    }

    /// Offline configuration for tests.
    pub fn test_default() -> Self {
        Self {
            identity: IdentityBackend::Memory,
            public_url: "http://localhost:3000".to_string(),
            port: 3000,
            provider_timeout: Duration::from_secs(1),
            cookie_signing_key: b"test_cookie_key_32_bytes_minimum!".to_vec(),
        }
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
