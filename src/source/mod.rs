// SPDX-License-Identifier: MPL-2.0

//! Frame sources
//!
//! - [`types`]: `Frame`, `PixelFormat` and the `FrameSource` trait
//! - [`file_source`]: still images and looping image sequences
//! - [`live`]: newest-frame handoff from a capture thread

pub mod file_source;
pub mod live;
pub mod types;

pub use file_source::{ImageSequenceSource, StillImageSource, load_image_as_frame};
pub use live::{FramePublisher, LiveFrameSource};
pub use types::{Frame, FrameData, FrameSource, PixelFormat};
