// SPDX-License-Identifier: MPL-2.0

//! Frame types shared by sources and detectors

use std::sync::Arc;
use std::time::Instant;

/// Frame pixel data, shared between the source and any detection task
pub type FrameData = Arc<[u8]>;

/// Pixel layouts a frame source may deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::RGBA => 4,
            PixelFormat::RGB24 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// A single captured frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: FrameData,
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// When the frame was captured
    pub captured_at: Instant,
}

impl Frame {
    /// Build a tightly packed frame (stride = width * bytes per pixel)
    pub fn packed(width: u32, height: u32, format: PixelFormat, data: impl Into<FrameData>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
            format,
            stride: width * format.bytes_per_pixel() as u32,
            captured_at: Instant::now(),
        }
    }

    /// Whether `data` is large enough for the declared geometry
    pub fn is_consistent(&self) -> bool {
        let row_bytes = self.width as usize * self.format.bytes_per_pixel();
        if self.width == 0 || self.height == 0 || (self.stride as usize) < row_bytes {
            return false;
        }
        let needed = (self.height as usize - 1) * self.stride as usize + row_bytes;
        self.data.len() >= needed
    }
}

/// Anything a scan can sample frames from
///
/// Called once per attempt. Returning `None` (e.g. a camera that has not
/// produced its first frame) counts as "no code in this frame".
pub trait FrameSource: Send + Sync {
    fn current_frame(&self) -> Option<Arc<Frame>>;
}

impl<T: FrameSource + ?Sized> FrameSource for Arc<T> {
    fn current_frame(&self) -> Option<Arc<Frame>> {
        (**self).current_frame()
    }
}
