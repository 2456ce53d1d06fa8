// SPDX-License-Identifier: MPL-2.0

//! Error types for scanning, detection and stream decoding

use std::fmt;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that cross the scanner boundary
///
/// Cancellation and supersession are not errors: `scan` reports them as
/// `Ok(None)`. Only fatal detector failures and terminal decode failures
/// reach the caller.
#[derive(Debug, Clone)]
pub enum ScanError {
    /// Detector backend could not be constructed
    Detector(DetectError),
    /// The stream decoder failed for a reason other than cancellation
    Decode(DecodeError),
}

/// Detector backend errors
#[derive(Debug, Clone)]
pub enum DetectError {
    /// Backend initialization failed (bad configuration, capability probe error)
    InitializationFailed(String),
    /// Frame data does not match its declared geometry or format
    InvalidFrame(String),
    /// The backend failed while analysing a frame
    BackendError(String),
}

/// Stream decoder errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The decoder was cancelled; pending and future operations fail with this
    Aborted,
    /// Packet could not be parsed or contradicts earlier packets
    InvalidPacket(String),
    /// Payload text was not valid transport encoding
    Transport(String),
    /// Reassembled data is inconsistent with the stream header
    Corrupt(String),
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read
    Io(std::io::Error),
    /// Config file is not valid JSON for the expected schema
    Parse(serde_json::Error),
    /// A value is outside its allowed range
    Invalid(String),
}

impl DecodeError {
    /// Whether this error signals cancellation rather than a failure
    pub fn is_abort(&self) -> bool {
        matches!(self, DecodeError::Aborted)
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Detector(e) => write!(f, "Detector error: {}", e),
            ScanError::Decode(e) => write!(f, "Decode error: {}", e),
        }
    }
}

impl fmt::Display for DetectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectError::InitializationFailed(msg) => {
                write!(f, "Initialization failed: {}", msg)
            }
            DetectError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            DetectError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Aborted => write!(f, "Decoding aborted"),
            DecodeError::InvalidPacket(msg) => write!(f, "Invalid packet: {}", msg),
            DecodeError::Transport(msg) => write!(f, "Invalid transport encoding: {}", msg),
            DecodeError::Corrupt(msg) => write!(f, "Corrupt stream: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Detector(e) => Some(e),
            ScanError::Decode(e) => Some(e),
        }
    }
}
impl std::error::Error for DetectError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<DetectError> for ScanError {
    fn from(err: DetectError) -> Self {
        ScanError::Detector(err)
    }
}

impl From<DecodeError> for ScanError {
    fn from(err: DecodeError) -> Self {
        ScanError::Decode(err)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_classification() {
        assert!(DecodeError::Aborted.is_abort());
        assert!(!DecodeError::InvalidPacket("short".into()).is_abort());
        assert!(!DecodeError::Corrupt("length".into()).is_abort());
    }

    #[test]
    fn test_scan_error_display_wraps_source() {
        let err: ScanError = DetectError::InitializationFailed("probe".into()).into();
        assert_eq!(err.to_string(), "Detector error: Initialization failed: probe");
        assert!(std::error::Error::source(&err).is_some());
    }
}
