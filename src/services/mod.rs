// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - QR rendering and request coordination.

pub mod in_flight;
pub mod qr;

pub use in_flight::{InFlight, InFlightGuard};
pub use qr::{DownloadFormat, QrDownload, QrError, QrRenderer};
