// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, registration and sign-out form handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::post,
    Extension, Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::middleware::session::{removal_cookie, session_cookie};
use crate::middleware::CurrentSession;
use crate::models::{RegistrationMetadata, Session};
use crate::routes::portal;
use crate::services::in_flight::{credentials_key, sign_out_key};
use crate::views::{AuthForm, AuthMode, AuthPanel};
use crate::AppState;

const INVALID_INPUT: &str = "Please enter a valid email and fill in every field.";
const CONFIRM_EMAIL_NOTICE: &str =
    "Account created. Check your inbox to confirm your email, then log in.";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
}

/// Login form body.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(email)]
    email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    password: String,
}

/// Registration form body.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(email)]
    email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    password: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    first_name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    last_name: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    student_id: String,
}

impl RegisterForm {
    /// Form state to re-render after a failed submit. The password is never echoed.
    fn view(&self) -> AuthForm {
        AuthForm {
            mode: AuthMode::Register,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            student_id: self.student_id.clone(),
            ..AuthForm::default()
        }
    }
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let view = AuthForm {
        email: form.email.clone(),
        ..AuthForm::new(AuthMode::Login)
    };

    if form.validate().is_err() {
        return render_form(&state, StatusCode::UNPROCESSABLE_ENTITY, view.with_error(INVALID_INPUT));
    }

    let Some(_guard) = state.in_flight.try_acquire(credentials_key(&form.email)) else {
        tracing::debug!("Login already in flight, refusing duplicate submit");
        return render_form(&state, StatusCode::CONFLICT, view.pending());
    };

    match state.identity.sign_in(&form.email, &form.password).await {
        Ok(session) => signed_in(&state, jar, &session),
        Err(e) => render_form(&state, StatusCode::UNAUTHORIZED, view.with_error(e.to_string())),
    }
}

async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let view = form.view();

    if form.validate().is_err() {
        return render_form(&state, StatusCode::UNPROCESSABLE_ENTITY, view.with_error(INVALID_INPUT));
    }

    let Some(_guard) = state.in_flight.try_acquire(credentials_key(&form.email)) else {
        tracing::debug!("Registration already in flight, refusing duplicate submit");
        return render_form(&state, StatusCode::CONFLICT, view.pending());
    };

    let metadata = RegistrationMetadata {
        first_name: form.first_name,
        last_name: form.last_name,
        student_id: form.student_id,
    };

    match state.identity.sign_up(&form.email, &form.password, metadata).await {
        Ok(Some(session)) => signed_in(&state, jar, &session),
        Ok(None) => {
            let login = AuthForm {
                email: form.email,
                ..AuthForm::new(AuthMode::Login)
            };
            render_form(&state, StatusCode::OK, login.with_notice(CONFIRM_EMAIL_NOTICE))
        }
        Err(e) => render_form(&state, StatusCode::BAD_REQUEST, view.with_error(e.to_string())),
    }
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    jar: CookieJar,
) -> Result<Response> {
    let Some(session) = current.session() else {
        return Ok((jar.add(removal_cookie(&state.config)), Redirect::to("/")).into_response());
    };

    let Some(_guard) = state.in_flight.try_acquire(sign_out_key(&session.user.id)) else {
        tracing::debug!(user_id = %session.user.id, "Sign-out already in flight");
        let dashboard = portal::dashboard(&state, session);
        let page = portal::render(&state, AuthPanel::Dashboard(dashboard), Some(session))?;
        return Ok((StatusCode::CONFLICT, page).into_response());
    };

    state.identity.sign_out(session).await;
    tracing::info!(user_id = %session.user.id, "User signed out");

    Ok((jar.add(removal_cookie(&state.config)), Redirect::to("/")).into_response())
}

/// Store the new session and send the browser back to the portal.
fn signed_in(state: &AppState, jar: CookieJar, session: &Session) -> Result<Response> {
    let cookie = session_cookie(&state.config, &session.tokens)?;
    tracing::info!(user_id = %session.user.id, "User signed in");
    Ok((jar.add(cookie), Redirect::to("/")).into_response())
}

fn render_form(state: &AppState, status: StatusCode, form: AuthForm) -> Result<Response> {
    let page = portal::render(state, AuthPanel::Form(form), None)?;
    Ok((status, page).into_response())
}
