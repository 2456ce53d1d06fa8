// SPDX-License-Identifier: GPL-3.0-only

//! File-backed frame sources
//!
//! Still images and image sequences stand in for a camera: a sequence
//! yields its frames round-robin, one per attempt, like a display cycling
//! through the QR codes of a qram stream.

use super::types::{Frame, FrameSource, PixelFormat};
use crate::errors::DetectError;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Load an image file and convert it to an RGBA frame
///
/// Supports common image formats: PNG, JPEG, GIF, BMP, WebP
pub fn load_image_as_frame(path: &Path) -> Result<Frame, DetectError> {
    let img = image::open(path).map_err(|e| {
        DetectError::InvalidFrame(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();

    info!(path = %path.display(), width, height, "Image loaded");

    Ok(Frame::packed(
        width,
        height,
        PixelFormat::RGBA,
        rgba.into_raw().into_boxed_slice(),
    ))
}

/// A source that always shows the same frame
pub struct StillImageSource {
    frame: Arc<Frame>,
}

impl StillImageSource {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame: Arc::new(frame),
        }
    }

    pub fn open(path: &Path) -> Result<Self, DetectError> {
        load_image_as_frame(path).map(Self::new)
    }
}

impl FrameSource for StillImageSource {
    fn current_frame(&self) -> Option<Arc<Frame>> {
        Some(Arc::clone(&self.frame))
    }
}

/// A source that cycles through a fixed list of frames
pub struct ImageSequenceSource {
    frames: Vec<Arc<Frame>>,
    cursor: AtomicUsize,
}

impl ImageSequenceSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into_iter().map(Arc::new).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Load every path in order
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self, DetectError> {
        let frames = paths
            .iter()
            .map(|p| load_image_as_frame(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(frames))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn current_frame(&self) -> Option<Arc<Frame>> {
        if self.frames.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        Some(Arc::clone(&self.frames[index]))
    }
}
