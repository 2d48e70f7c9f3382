// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! QR symbol rendering and bitmap export.
//!
//! The portal shows the symbol as inline SVG. Downloads take that same SVG,
//! rasterize it, and place it on a white canvas with a fixed margin before
//! encoding to PNG or JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use qrcode::render::svg;
use qrcode::QrCode;
use resvg::{tiny_skia, usvg};
use std::fmt;
use std::str::FromStr;

/// Minimum edge length of the on-screen symbol, in pixels.
pub const SYMBOL_SIZE: u32 = 180;
/// White margin added around the symbol on every side of a download.
pub const DOWNLOAD_PADDING: u32 = 40;

const DARK_COLOR: &str = "#6A0F0F";
const LIGHT_COLOR: &str = "#ffffff";
const JPEG_QUALITY: u8 = 100;

/// Bitmap formats offered for download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DownloadFormat {
    #[default]
    Png,
    Jpg,
}

impl DownloadFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DownloadFormat::Png => "png",
            DownloadFormat::Jpg => "jpg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DownloadFormat::Png => "image/png",
            DownloadFormat::Jpg => "image/jpeg",
        }
    }
}

impl FromStr for DownloadFormat {
    type Err = QrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(DownloadFormat::Png),
            "jpg" | "jpeg" => Ok(DownloadFormat::Jpg),
            other => Err(QrError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Failure anywhere in the render/export pipeline.
#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("QR encoding failed: {0}")]
    Encode(String),

    #[error("SVG decode failed: {0}")]
    Decode(String),

    #[error("Canvas allocation failed for {width}x{height}")]
    Canvas { width: u32, height: u32 },

    #[error("Image encoding failed: {0}")]
    Image(String),

    #[error("Unsupported download format: {0}")]
    UnsupportedFormat(String),
}

/// A finished download.
#[derive(Debug, Clone)]
pub struct QrDownload {
    pub filename: String,
    pub format: DownloadFormat,
    pub bytes: Vec<u8>,
}

/// Renders QR symbols and exports them as bitmaps.
#[derive(Debug, Clone)]
pub struct QrRenderer {
    size: u32,
    padding: u32,
}

impl Default for QrRenderer {
    fn default() -> Self {
        Self {
            size: SYMBOL_SIZE,
            padding: DOWNLOAD_PADDING,
        }
    }
}

impl QrRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `content` as an SVG document (without XML declaration, so it can
    /// be embedded inline).
    pub fn render_svg(&self, content: &str) -> Result<String, QrError> {
        let code = QrCode::new(content.as_bytes()).map_err(|e| QrError::Encode(e.to_string()))?;

        let document = code
            .render::<svg::Color>()
            .min_dimensions(self.size, self.size)
            .quiet_zone(false)
            .dark_color(svg::Color(DARK_COLOR))
            .light_color(svg::Color(LIGHT_COLOR))
            .build();

        Ok(match document.find("<svg") {
            Some(start) => document[start..].to_string(),
            None => document,
        })
    }

    /// Rasterize an SVG symbol onto a padded white canvas and encode it.
    pub fn rasterize(&self, svg_text: &str, format: DownloadFormat) -> Result<Vec<u8>, QrError> {
        let tree = usvg::Tree::from_str(svg_text, &usvg::Options::default())
            .map_err(|e| QrError::Decode(e.to_string()))?;

        let size = tree.size().to_int_size();
        let (width, height) = (size.width(), size.height());
        let mut pixmap =
            tiny_skia::Pixmap::new(width, height).ok_or(QrError::Canvas { width, height })?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let mut symbol = RgbaImage::new(width, height);
        for (dst, src) in symbol.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }

        let canvas_width = width + self.padding * 2;
        let canvas_height = height + self.padding * 2;
        let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, Rgba([255; 4]));
        image::imageops::overlay(
            &mut canvas,
            &symbol,
            i64::from(self.padding),
            i64::from(self.padding),
        );

        encode(DynamicImage::ImageRgba8(canvas), format)
    }

    /// Produce the download for an on-screen symbol.
    ///
    /// `symbol` is `None` when nothing is rendered (signed out). Every failure is
    /// logged and turned into `None`; callers show nothing to the user.
    pub fn download(
        &self,
        symbol: Option<&str>,
        student_id: &str,
        format: DownloadFormat,
    ) -> Option<QrDownload> {
        let Some(svg_text) = symbol else {
            tracing::debug!("QR download requested without a rendered symbol");
            return None;
        };

        match self.rasterize(svg_text, format) {
            Ok(bytes) => Some(QrDownload {
                filename: download_filename(student_id, format),
                format,
                bytes,
            }),
            Err(e) => {
                tracing::warn!(error = %e, format = %format, "Error downloading QR code");
                None
            }
        }
    }
}

fn encode(image: DynamicImage, format: DownloadFormat) -> Result<Vec<u8>, QrError> {
    let rgb = image.into_rgb8();
    let (width, height) = rgb.dimensions();
    let mut buf = Vec::new();

    let result = match format {
        DownloadFormat::Png => {
            PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive)
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        }
        DownloadFormat::Jpg => JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).write_image(
            rgb.as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        ),
    };
    result.map_err(|e| QrError::Image(e.to_string()))?;

    Ok(buf)
}

/// `attendance-qr-<student id>.<ext>`, with `code` standing in for a missing ID.
pub fn download_filename(student_id: &str, format: DownloadFormat) -> String {
    let stem = if student_id.is_empty() {
        "code"
    } else {
        student_id
    };
    format!("attendance-qr-{stem}.{}", format.extension())
}
