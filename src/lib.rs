// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Attendance Portal: sign in and get your attendance QR code
//!
//! This crate serves the student-facing portal: account sign-in and
//! registration against a hosted identity provider, and a personal QR code
//! that encodes the student's identity for class attendance scanning.

pub mod config;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod views;

use anyhow::Context;
use config::{Config, IdentityBackend};
use identity::{GoTrueProvider, IdentityAdapter, IdentityProvider, MemoryProvider};
use services::{InFlight, QrRenderer};
use std::sync::Arc;
use views::Views;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub identity: IdentityAdapter,
    pub views: Views,
    pub qr: QrRenderer,
    pub in_flight: InFlight,
}

impl AppState {
    /// Build state around an explicit provider.
    pub fn new(config: Config, provider: Arc<dyn IdentityProvider>) -> anyhow::Result<Self> {
        Ok(Self {
            config,
            identity: IdentityAdapter::new(provider),
            views: Views::new().context("failed compiling templates")?,
            qr: QrRenderer::new(),
            in_flight: InFlight::new(),
        })
    }

    /// Build state with the provider selected by `config`.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let provider: Arc<dyn IdentityProvider> = match &config.identity {
            IdentityBackend::Supabase { url, anon_key } => {
                Arc::new(GoTrueProvider::new(url, anon_key, config.provider_timeout)?)
            }
            IdentityBackend::Memory => {
                tracing::warn!("Using in-memory identity provider; accounts are not persisted");
                Arc::new(MemoryProvider::new(&config.cookie_signing_key))
            }
        };
        Self::new(config, provider)
    }
}
