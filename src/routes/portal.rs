// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The portal page.

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::CurrentSession;
use crate::models::{derive_display_name, derive_profile, Session};
use crate::services::in_flight::sign_out_key;
use crate::views::{AuthForm, AuthMode, AuthPanel, Dashboard, PortalPage, QrPanel};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(portal))
}

/// Query parameters for the portal page.
#[derive(Debug, Default, Deserialize)]
pub struct PortalParams {
    /// `login` (default) or `register`; anything else falls back to login
    #[serde(default)]
    mode: Option<String>,
    /// `signout` opens the sign-out confirmation
    #[serde(default)]
    confirm: Option<String>,
}

impl PortalParams {
    fn mode(&self) -> AuthMode {
        match self.mode.as_deref() {
            Some("register") => AuthMode::Register,
            _ => AuthMode::Login,
        }
    }

    fn confirm_sign_out(&self) -> bool {
        self.confirm.as_deref() == Some("signout")
    }
}

async fn portal(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    Query(params): Query<PortalParams>,
) -> Result<Html<String>> {
    let auth = match current.session() {
        Some(session) => {
            let mut dashboard = dashboard(&state, session);
            dashboard.confirm_sign_out |= params.confirm_sign_out();
            AuthPanel::Dashboard(dashboard)
        }
        None => AuthPanel::Form(AuthForm::new(params.mode())),
    };

    render(&state, auth, current.session())
}

/// Dashboard for `session`, reflecting a sign-out still in flight.
pub(crate) fn dashboard(state: &AppState, session: &Session) -> Dashboard {
    let profile = derive_profile(&session.user);
    let display_name = derive_display_name(&session.user, &profile);
    let mut dashboard = Dashboard::new(session, &profile, display_name);

    if state.in_flight.contains(&sign_out_key(&session.user.id)) {
        dashboard.confirm_sign_out = true;
        dashboard.signing_out = true;
    }
    dashboard
}

/// Render the full portal page.
pub(crate) fn render(
    state: &AppState,
    auth: AuthPanel,
    session: Option<&Session>,
) -> Result<Html<String>> {
    let qr = QrPanel::for_session(session, &state.qr).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to render QR symbol");
        QrPanel::Placeholder
    });

    let page = PortalPage::new(auth, qr);
    Ok(Html(state.views.render_portal(&page)?))
}
