// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Default pause between frame attempts (roughly one display refresh at 60 Hz)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Shortest pause the frame clock accepts; shorter intervals are raised to it
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

/// Frames larger than this are downscaled before software QR detection
///
/// QR codes shown for scanning are usually large enough to survive this.
pub const DEFAULT_MAX_DIMENSION: u32 = 640;

/// Format identifier advertised by detectors that recognize QR codes
pub const QR_CODE_FORMAT: &str = "qr_code";

/// Chunk packet framing
pub mod packet {
    /// Only supported packet version
    pub const VERSION: u8 = 1;
    /// version (1) + total length (4) + block count (2) + block index (2)
    pub const HEADER_LEN: usize = 9;
    /// Default block size for `encode_packets`, sized to fit a medium-density QR code
    pub const DEFAULT_BLOCK_SIZE: usize = 256;
}

/// Config file location under the user config directory
pub const CONFIG_DIR_NAME: &str = "qram-scanner";
pub const CONFIG_FILE_NAME: &str = "config.json";
