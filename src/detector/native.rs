// SPDX-License-Identifier: GPL-3.0-only

//! Host-provided barcode detection capability
//!
//! Platforms that ship their own barcode detector (a system vision service,
//! a hardware scanner) expose it through this trait. The scanner only uses
//! it when it advertises QR support.

use super::types::{CodeFormat, DetectedCode};
use crate::errors::DetectError;
use crate::source::Frame;
use futures::future::BoxFuture;
use std::sync::Arc;

pub trait NativeDetector: Send + Sync {
    /// Formats this capability can recognize
    fn supported_formats(&self) -> BoxFuture<'_, Result<Vec<CodeFormat>, DetectError>>;

    /// Recognize codes in a frame; an empty list means no code
    fn detect(&self, frame: Arc<Frame>) -> BoxFuture<'_, Result<Vec<DetectedCode>, DetectError>>;
}

/// Whether a capability can serve a QR scan
pub async fn supports_qr(native: &dyn NativeDetector) -> Result<bool, DetectError> {
    let formats = native.supported_formats().await?;
    Ok(formats.contains(&CodeFormat::QrCode))
}
