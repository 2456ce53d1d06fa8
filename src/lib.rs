// SPDX-License-Identifier: MPL-2.0

//! qram scanner - read multi-frame QR streams from a camera or image sequence
//!
//! A qram stream splits a payload across many QR codes shown one after
//! another. This crate samples frames, detects the code in each, and feeds
//! the packets to a stream decoder until the payload is complete.
//!
//! # Architecture
//!
//! - [`scanner`]: the scan loop, sessions and frame pacing
//! - [`detector`]: native capability or rqrr-based software detection
//! - [`decoder`]: stream decoder trait, transport encoding, chunk decoder
//! - [`source`]: frames and frame sources (images, sequences, live feed)
//! - [`config`]: scanner configuration
//! - [`errors`]: error types

pub mod config;
pub mod constants;
pub mod decoder;
pub mod detector;
pub mod errors;
pub mod scanner;
pub mod source;

// Re-export commonly used types
pub use config::{DetectorConfig, ScannerConfig};
pub use decoder::{ChunkDecoder, DecodeEvent, Payload, Progress, StreamDecoder};
pub use detector::{CodeFormat, DetectedCode, DetectorKind, NativeDetector};
pub use errors::{DecodeError, DetectError, ScanError, ScanResult};
pub use scanner::QramScanner;
pub use source::{Frame, FrameSource, PixelFormat};
