// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payload encoded into the attendance QR code.
//!
//! Scanners parse this JSON directly, so the field names and their order are a
//! compatibility contract.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::{Profile, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct QrPayload {
    pub first_name: String,
    pub last_name: String,
    pub student_id: String,
    pub uuid: String,
}

impl QrPayload {
    pub fn new(profile: &Profile, user: &User) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            student_id: profile.student_id.clone(),
            uuid: user.id.clone(),
        }
    }

    /// The exact string the QR symbol encodes.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
