// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod profile;
pub mod qr;
pub mod session;
pub mod user;

pub use profile::{derive_display_name, derive_profile, Profile};
pub use qr::QrPayload;
pub use session::{Session, SessionTokens};
pub use user::{Metadata, RegistrationMetadata, User};
