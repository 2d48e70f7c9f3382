// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! QR panel: the student's attendance code, or a placeholder when signed out.

use serde::Serialize;

use crate::models::{derive_profile, QrPayload, Session};
use crate::services::qr::{QrError, QrRenderer};

/// What the QR half of the portal shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QrPanel {
    /// Rendered symbol plus the payload it encodes.
    Code {
        svg: String,
        payload: String,
        student_id: String,
    },
    Placeholder,
}

impl QrPanel {
    /// Build the panel for the current session.
    pub fn for_session(session: Option<&Session>, renderer: &QrRenderer) -> Result<Self, QrError> {
        let Some(session) = session else {
            return Ok(QrPanel::Placeholder);
        };

        let profile = derive_profile(&session.user);
        let payload = QrPayload::new(&profile, &session.user)
            .encode()
            .map_err(|e| QrError::Encode(e.to_string()))?;
        let svg = renderer.render_svg(&payload)?;

        Ok(QrPanel::Code {
            svg,
            payload,
            student_id: profile.student_id,
        })
    }

    /// The rendered SVG, if a symbol is on screen.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            QrPanel::Code { svg, .. } => Some(svg),
            QrPanel::Placeholder => None,
        }
    }

    pub fn student_id(&self) -> &str {
        match self {
            QrPanel::Code { student_id, .. } => student_id,
            QrPanel::Placeholder => "",
        }
    }
}
