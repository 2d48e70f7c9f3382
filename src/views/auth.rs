// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth panel view model: login/register forms or the signed-in summary.

use serde::{Deserialize, Serialize};

use crate::models::{Profile, Session};

pub const PENDING_LABEL: &str = "Please wait...";
pub const SIGNING_OUT_LABEL: &str = "Signing out...";
pub const NOT_SET: &str = "Not set";

/// Which form is shown to a signed-out visitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    fn submit_label(&self) -> &'static str {
        match self {
            AuthMode::Login => "Login",
            AuthMode::Register => "Register",
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            AuthMode::Login => "Welcome back, student",
            AuthMode::Register => "Create your student account",
        }
    }
}

/// Login / registration form state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub student_id: String,
    /// Inline error from the last submit
    pub error: Option<String>,
    /// Informational message (e.g. confirmation email sent)
    pub notice: Option<String>,
    /// A submit for this form is still waiting on the provider
    pub pending: bool,
}

impl AuthForm {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    pub fn pending(mut self) -> Self {
        self.pending = true;
        self
    }

    pub fn shows_register_fields(&self) -> bool {
        self.mode == AuthMode::Register
    }

    pub fn submit_label(&self) -> &'static str {
        if self.pending {
            PENDING_LABEL
        } else {
            self.mode.submit_label()
        }
    }
}

/// Read-only summary shown once signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub display_name: String,
    pub student_id: String,
    pub email: String,
    /// The sign-out confirmation modal is open
    pub confirm_sign_out: bool,
    /// A sign-out for this user is in flight
    pub signing_out: bool,
}

impl Dashboard {
    pub fn new(session: &Session, profile: &Profile, display_name: String) -> Self {
        let student_id = if profile.student_id.is_empty() {
            NOT_SET.to_string()
        } else {
            profile.student_id.clone()
        };
        let display_name = if display_name.is_empty() {
            NOT_SET.to_string()
        } else {
            display_name
        };

        Self {
            display_name,
            student_id,
            email: session.user.email.clone().unwrap_or_default(),
            confirm_sign_out: false,
            signing_out: false,
        }
    }

    pub fn sign_out_label(&self) -> &'static str {
        if self.signing_out {
            SIGNING_OUT_LABEL
        } else {
            "Sign out"
        }
    }
}

/// Template-facing form fields.
#[derive(Debug, Serialize)]
struct FormContext<'a> {
    mode: AuthMode,
    heading: &'static str,
    register_fields: bool,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    student_id: &'a str,
    error: Option<&'a str>,
    notice: Option<&'a str>,
    pending: bool,
    submit_label: &'static str,
    action: &'static str,
    password_autocomplete: &'static str,
}

/// Template-facing dashboard fields.
#[derive(Debug, Serialize)]
struct DashboardContext<'a> {
    display_name: &'a str,
    student_id: &'a str,
    email: &'a str,
    confirm_sign_out: bool,
    signing_out: bool,
    sign_out_label: &'static str,
}

/// The auth half of the portal. Being signed in overrides the form mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPanel {
    Form(AuthForm),
    Dashboard(Dashboard),
}

impl Serialize for AuthPanel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(tag = "kind", rename_all = "lowercase")]
        enum Tagged<'a> {
            Form(FormContext<'a>),
            Dashboard(DashboardContext<'a>),
        }

        let tagged = match self {
            AuthPanel::Form(form) => Tagged::Form(FormContext {
                mode: form.mode,
                heading: form.mode.heading(),
                register_fields: form.shows_register_fields(),
                email: &form.email,
                first_name: &form.first_name,
                last_name: &form.last_name,
                student_id: &form.student_id,
                error: form.error.as_deref(),
                notice: form.notice.as_deref(),
                pending: form.pending,
                submit_label: form.submit_label(),
                action: match form.mode {
                    AuthMode::Login => "/auth/login",
                    AuthMode::Register => "/auth/register",
                },
                password_autocomplete: match form.mode {
                    AuthMode::Login => "current-password",
                    AuthMode::Register => "new-password",
                },
            }),
            AuthPanel::Dashboard(dashboard) => Tagged::Dashboard(DashboardContext {
                display_name: &dashboard.display_name,
                student_id: &dashboard.student_id,
                email: &dashboard.email,
                confirm_sign_out: dashboard.confirm_sign_out,
                signing_out: dashboard.signing_out,
                sign_out_label: dashboard.sign_out_label(),
            }),
        };
        tagged.serialize(serializer)
    }
}
