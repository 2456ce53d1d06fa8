// SPDX-License-Identifier: GPL-3.0-only

//! Detector backends
//!
//! Exactly one backend is chosen when the scanner first needs one:
//!
//! ```text
//! NativeDetector given? ── yes ──► advertises qr_code? ── yes ──► Native
//!         │                              │
//!         no                             no
//!         └──────────────┬───────────────┘
//!                        ▼
//!                    Software (rqrr)
//! ```

pub mod native;
pub mod software;
pub mod types;

pub use native::NativeDetector;
pub use software::SoftwareDetector;
pub use types::{CodeFormat, DetectedCode, DetectorKind};

use crate::config::DetectorConfig;
use crate::errors::DetectError;
use crate::source::FrameSource;
use std::sync::Arc;
use tracing::info;

pub enum DetectorBackend {
    Native(Arc<dyn NativeDetector>),
    Software(SoftwareDetector),
}

impl DetectorBackend {
    /// Pick a backend
    ///
    /// A native capability is used only if it lists QR codes among its
    /// formats. A failing format query is an error, not a fallback.
    pub async fn probe(
        native: Option<Arc<dyn NativeDetector>>,
        config: &DetectorConfig,
    ) -> Result<Self, DetectError> {
        if let Some(capability) = native {
            if native::supports_qr(capability.as_ref()).await? {
                info!("Using native QR detector");
                return Ok(Self::Native(capability));
            }
            info!("Native detector lacks QR support, falling back to software");
        }

        let software = SoftwareDetector::new(config)?;
        info!(
            max_dimension = config.max_dimension,
            attempt_inverted = config.attempt_inverted,
            "Using software QR detector"
        );
        Ok(Self::Software(software))
    }

    pub fn kind(&self) -> DetectorKind {
        match self {
            Self::Native(_) => DetectorKind::Native,
            Self::Software(_) => DetectorKind::Software,
        }
    }

    /// Look for a QR code in the source's current frame
    ///
    /// Returns at most one code. A source without a frame yields `Ok(None)`.
    pub async fn detect<S>(&self, source: &S) -> Result<Option<DetectedCode>, DetectError>
    where
        S: FrameSource + ?Sized,
    {
        let Some(frame) = source.current_frame() else {
            return Ok(None);
        };

        match self {
            Self::Native(native) => {
                let codes = native.detect(frame).await?;
                Ok(codes
                    .into_iter()
                    .find(|code| code.format == CodeFormat::QrCode))
            }
            Self::Software(software) => software.detect(frame).await,
        }
    }
}
