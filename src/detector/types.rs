// SPDX-License-Identifier: MPL-2.0

use crate::constants::QR_CODE_FORMAT;

/// Barcode family reported by a detector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CodeFormat {
    QrCode,
    /// Any other family, by the identifier the backend advertises
    Other(String),
}

impl CodeFormat {
    /// Map a backend identifier such as `"qr_code"` to a format
    pub fn from_identifier(identifier: &str) -> Self {
        if identifier.eq_ignore_ascii_case(QR_CODE_FORMAT) {
            Self::QrCode
        } else {
            Self::Other(identifier.to_string())
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Self::QrCode => QR_CODE_FORMAT,
            Self::Other(id) => id,
        }
    }
}

/// A code recognized in one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCode {
    /// Payload text exactly as encoded in the symbol
    pub raw_value: String,
    pub format: CodeFormat,
}

impl DetectedCode {
    pub fn qr(raw_value: impl Into<String>) -> Self {
        Self {
            raw_value: raw_value.into(),
            format: CodeFormat::QrCode,
        }
    }
}

/// Which backend the scanner ended up with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Native,
    Software,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_identifiers() {
        assert_eq!(CodeFormat::from_identifier("qr_code"), CodeFormat::QrCode);
        assert_eq!(CodeFormat::from_identifier("QR_CODE"), CodeFormat::QrCode);
        assert_eq!(
            CodeFormat::from_identifier("aztec"),
            CodeFormat::Other("aztec".to_string())
        );
        assert_eq!(CodeFormat::QrCode.identifier(), "qr_code");
    }
}
