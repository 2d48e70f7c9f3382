// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session issued by the identity provider.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// Refresh this long before the provider-reported expiry.
pub const EXPIRY_MARGIN_SECS: i64 = 30;

/// Opaque token bundle. This is all the browser cookie carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry (Unix timestamp, seconds)
    pub expires_at: i64,
}

impl SessionTokens {
    /// Whether the access token is expired or about to expire at `now`.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        let deadline = now + Duration::seconds(EXPIRY_MARGIN_SECS);
        self.expires_at <= deadline.timestamp()
    }
}

/// An authenticated session: tokens plus the user they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub tokens: SessionTokens,
    pub user: User,
}
