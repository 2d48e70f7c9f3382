// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model as reported by the identity provider.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended metadata attached to an account at registration time.
pub type Metadata = Map<String, Value>;

/// Provider-issued user record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Stable unique identifier (encoded into the QR payload as `uuid`)
    pub id: String,
    /// Email address (may be absent for some provider identities)
    pub email: Option<String>,
    /// Free-form metadata, shape varies between accounts
    #[serde(default)]
    pub metadata: Metadata,
}

impl User {
    /// Look up a metadata value as text.
    ///
    /// Strings are returned as-is and numbers in their decimal form. Any other
    /// JSON type, and the empty string, counts as absent.
    pub fn metadata_text(&self, key: &str) -> Option<String> {
        let text = match self.metadata.get(key)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    /// Local part of the email address, if any.
    pub fn email_local_part(&self) -> Option<&str> {
        let email = self.email.as_deref()?;
        let local = email.split('@').next().unwrap_or_default();
        (!local.is_empty()).then_some(local)
    }
}

/// Fields captured by the registration form and stored as metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationMetadata {
    pub first_name: String,
    pub last_name: String,
    pub student_id: String,
}

impl RegistrationMetadata {
    /// Convert into the metadata map sent to the provider.
    pub fn into_metadata(self) -> Metadata {
        let mut map = Metadata::new();
        map.insert("first_name".to_string(), Value::String(self.first_name));
        map.insert("last_name".to_string(), Value::String(self.last_name));
        map.insert("student_id".to_string(), Value::String(self.student_id));
        map
    }
}
