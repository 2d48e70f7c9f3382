// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-rendered portal page.
//!
//! Templates are compiled into the binary and rendered with minijinja. HTML
//! templates are autoescaped; only the QR SVG is marked safe.

pub mod auth;
pub mod qr;

pub use auth::{AuthForm, AuthMode, AuthPanel, Dashboard};
pub use qr::QrPanel;

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

const LAYOUT_TEMPLATE: &str = include_str!("../../templates/layout.html");
const PORTAL_TEMPLATE: &str = include_str!("../../templates/portal.html");

/// Accent color used for the QR symbol and the page chrome.
pub const THEME_COLOR: &str = "#6A0F0F";

/// Everything the portal template needs.
#[derive(Debug, Serialize)]
pub struct PortalPage {
    pub auth: AuthPanel,
    pub qr: QrPanel,
    pub theme_color: &'static str,
}

impl PortalPage {
    pub fn new(auth: AuthPanel, qr: QrPanel) -> Self {
        Self {
            auth,
            qr,
            theme_color: THEME_COLOR,
        }
    }
}

/// Compiled template set.
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template("layout.html", LAYOUT_TEMPLATE)?;
        env.add_template("portal.html", PORTAL_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn render_portal(&self, page: &PortalPage) -> Result<String, minijinja::Error> {
        self.env.get_template("portal.html")?.render(page)
    }
}
