// SPDX-License-Identifier: GPL-3.0-only

//! Transport encoding of packets inside QR payload text
//!
//! Packets travel as URL-safe base64. Decoding accepts input with or
//! without `=` padding; encoding never pads.

use crate::errors::DecodeError;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode the text of a detected code into packet bytes
pub fn decode_payload(text: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_LENIENT
        .decode(text.trim())
        .map_err(|e| DecodeError::Transport(e.to_string()))
}

/// Encode packet bytes as QR payload text
pub fn encode_packet(packet: &[u8]) -> String {
    URL_SAFE_LENIENT.encode(packet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_safe_alphabet() {
        let bytes = [0xfb, 0xff, 0xbf];
        let text = encode_packet(&bytes);
        assert_eq!(text, "-_-_");
        assert_eq!(decode_payload(&text).unwrap(), bytes);
    }

    #[test]
    fn test_padding_is_optional() {
        assert_eq!(decode_payload("aGk").unwrap(), b"hi");
        assert_eq!(decode_payload("aGk=").unwrap(), b"hi");
    }

    #[test]
    fn test_standard_alphabet_is_rejected() {
        assert!(matches!(
            decode_payload("+/+/"),
            Err(DecodeError::Transport(_))
        ));
    }
}
