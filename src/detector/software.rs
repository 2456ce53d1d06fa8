// SPDX-License-Identifier: GPL-3.0-only

//! Software QR detection
//!
//! Converts frames to luma, downscales them and searches for QR symbols
//! with the rqrr crate. Used whenever the host offers no native detector.

use super::types::DetectedCode;
use crate::config::DetectorConfig;
use crate::errors::DetectError;
use crate::source::{Frame, PixelFormat};
use std::sync::Arc;
use tracing::{debug, trace};

/// Rqrr-backed QR detector
#[derive(Debug, Clone)]
pub struct SoftwareDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
    /// Run a second pass over the inverted image when the first finds nothing
    attempt_inverted: bool,
}

impl SoftwareDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self, DetectError> {
        if config.max_dimension == 0 {
            return Err(DetectError::InitializationFailed(
                "max_dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_dimension: config.max_dimension,
            attempt_inverted: config.attempt_inverted,
        })
    }

    /// Detect at most one QR code in a frame
    ///
    /// The CPU-heavy work runs on the blocking pool so the scan loop stays
    /// responsive.
    pub async fn detect(&self, frame: Arc<Frame>) -> Result<Option<DetectedCode>, DetectError> {
        let detector = self.clone();
        tokio::task::spawn_blocking(move || detector.detect_sync(&frame))
            .await
            .map_err(|e| DetectError::BackendError(format!("QR detection task failed: {}", e)))?
    }

    /// Synchronous detection, for callers already off the async runtime
    pub fn detect_sync(&self, frame: &Frame) -> Result<Option<DetectedCode>, DetectError> {
        let start = std::time::Instant::now();

        if !frame.is_consistent() {
            return Err(DetectError::InvalidFrame(format!(
                "{}x{} {:?} frame with stride {} has only {} bytes",
                frame.width,
                frame.height,
                frame.format,
                frame.stride,
                frame.data.len()
            )));
        }

        let mut luma = LumaImage::from_frame(frame);
        if luma.width > self.max_dimension || luma.height > self.max_dimension {
            let scale = (luma.width as f32 / self.max_dimension as f32)
                .max(luma.height as f32 / self.max_dimension as f32);
            let new_width = ((luma.width as f32 / scale) as u32).max(1);
            let new_height = ((luma.height as f32 / scale) as u32).max(1);
            luma = luma.downscale(new_width, new_height);
        }

        trace!(
            width = luma.width,
            height = luma.height,
            prepare_ms = start.elapsed().as_millis(),
            "Prepared luma image"
        );

        let mut found = find_code(&luma);
        if found.is_none() && self.attempt_inverted {
            luma.invert();
            found = find_code(&luma);
        }

        if let Some(code) = &found {
            debug!(
                len = code.raw_value.len(),
                total_ms = start.elapsed().as_millis(),
                "Detected QR code"
            );
        }

        Ok(found)
    }
}

/// Run rqrr over a luma image, returning the first symbol that decodes
fn find_code(luma: &LumaImage) -> Option<DetectedCode> {
    let width = luma.width as usize;
    let height = luma.height as usize;
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| luma.pixels[y * width + x]);

    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_meta, content)) => return Some(DetectedCode::qr(content)),
            Err(e) => debug!(error = ?e, "Failed to decode QR grid"),
        }
    }
    None
}

/// 8-bit grayscale image without padding
#[derive(Debug, Clone, PartialEq)]
struct LumaImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl LumaImage {
    /// Convert a frame to luma, dropping stride padding
    fn from_frame(frame: &Frame) -> Self {
        let width = frame.width as usize;
        let height = frame.height as usize;
        let stride = frame.stride as usize;
        let bpp = frame.format.bytes_per_pixel();

        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = &frame.data[y * stride..y * stride + width * bpp];
            match frame.format {
                PixelFormat::Gray8 => pixels.extend_from_slice(row),
                PixelFormat::RGBA | PixelFormat::RGB24 => {
                    pixels.extend(row.chunks_exact(bpp).map(|px| luma(px[0], px[1], px[2])));
                }
            }
        }

        Self {
            width: frame.width,
            height: frame.height,
            pixels,
        }
    }

    /// Downscale using bilinear interpolation
    fn downscale(&self, dst_width: u32, dst_height: u32) -> Self {
        let src_width = self.width as usize;
        let src_height = self.height as usize;

        let x_ratio = src_width as f32 / dst_width as f32;
        let y_ratio = src_height as f32 / dst_height as f32;

        let get = |x: usize, y: usize| self.pixels[y * src_width + x] as f32;

        let mut pixels = Vec::with_capacity((dst_width * dst_height) as usize);
        for y in 0..dst_height {
            for x in 0..dst_width {
                let src_x = x as f32 * x_ratio;
                let src_y = y as f32 * y_ratio;

                let x0 = (src_x as usize).min(src_width - 1);
                let y0 = (src_y as usize).min(src_height - 1);
                let x1 = (x0 + 1).min(src_width - 1);
                let y1 = (y0 + 1).min(src_height - 1);

                let x_frac = src_x - x0 as f32;
                let y_frac = src_y - y0 as f32;

                let value = get(x0, y0) * (1.0 - x_frac) * (1.0 - y_frac)
                    + get(x1, y0) * x_frac * (1.0 - y_frac)
                    + get(x0, y1) * (1.0 - x_frac) * y_frac
                    + get(x1, y1) * x_frac * y_frac;

                pixels.push(value as u8);
            }
        }

        Self {
            width: dst_width,
            height: dst_height,
            pixels,
        }
    }

    fn invert(&mut self) {
        for p in &mut self.pixels {
            *p = 255 - *p;
        }
    }
}

/// BT.601 luma in fixed point
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32) >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::CodeFormat;
    use std::time::Instant;

    const PACKET_TEXT: &str = "AQAAAAUAAQAAaGVsbG8";

    /// Render `text` as Gray8 pixels, `scale` pixels per module, 4 module quiet zone
    fn render_qr(text: &str, scale: usize) -> (u32, Vec<u8>) {
        let code = qrcode::QrCode::new(text.as_bytes()).unwrap();
        let modules = code.width();
        let colors = code.to_colors();
        let side = (modules + 8) * scale;

        let mut pixels = vec![255u8; side * side];
        for y in 0..side {
            for x in 0..side {
                let (mx, my) = (x / scale, y / scale);
                if !(4..modules + 4).contains(&mx) || !(4..modules + 4).contains(&my) {
                    continue;
                }
                if colors[(my - 4) * modules + (mx - 4)] == qrcode::Color::Dark {
                    pixels[y * side + x] = 0;
                }
            }
        }
        (side as u32, pixels)
    }

    #[test]
    fn test_luma_drops_stride_padding() {
        let data: Vec<u8> = vec![
            255, 255, 255, 255, // White pixel
            0, 0, 0, 255, // Black pixel
            9, 9, // stride padding
            0, 0, 0, 255, // Black pixel
            255, 255, 255, 255, // White pixel
            9, 9, // stride padding
        ];
        let frame = Frame {
            width: 2,
            height: 2,
            data: Arc::from(data.as_slice()),
            format: PixelFormat::RGBA,
            stride: 10,
            captured_at: Instant::now(),
        };

        let luma = LumaImage::from_frame(&frame);
        assert_eq!(luma.pixels, vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_downscale_keeps_gradient_direction() {
        let luma = LumaImage {
            width: 4,
            height: 2,
            pixels: vec![0, 85, 170, 255, 0, 85, 170, 255],
        };

        let small = luma.downscale(2, 1);
        assert_eq!(small.pixels.len(), 2);
        assert!(small.pixels[0] < 100);
        assert!(small.pixels[1] > 150);
    }

    #[test]
    fn test_invert() {
        let mut luma = LumaImage {
            width: 2,
            height: 1,
            pixels: vec![0, 200],
        };
        luma.invert();
        assert_eq!(luma.pixels, vec![255, 55]);
    }

    #[test]
    fn test_blank_frame_has_no_code() {
        let detector = SoftwareDetector::new(&DetectorConfig::default()).unwrap();
        let frame = Frame::packed(64, 64, PixelFormat::Gray8, vec![255u8; 64 * 64]);
        assert_eq!(detector.detect_sync(&frame).unwrap(), None);
    }

    #[test]
    fn test_rendered_symbol_is_decoded() {
        let detector = SoftwareDetector::new(&DetectorConfig::default()).unwrap();
        let (side, pixels) = render_qr(PACKET_TEXT, 8);
        let frame = Frame::packed(side, side, PixelFormat::Gray8, pixels);

        let code = detector.detect_sync(&frame).unwrap().unwrap();
        assert_eq!(code.raw_value, PACKET_TEXT);
        assert_eq!(code.format, CodeFormat::QrCode);
    }

    #[test]
    fn test_padded_rgba_symbol_is_decoded_after_downscale() {
        let detector = SoftwareDetector::new(&DetectorConfig::default()).unwrap();
        let (side, gray) = render_qr(PACKET_TEXT, 20);
        assert!(side > DetectorConfig::default().max_dimension);

        let padding = 16;
        let stride = side as usize * 4 + padding;
        let mut data = Vec::with_capacity(stride * side as usize);
        for row in gray.chunks(side as usize) {
            for &value in row {
                data.extend_from_slice(&[value, value, value, 255]);
            }
            data.extend(std::iter::repeat_n(7u8, padding));
        }
        let frame = Frame {
            width: side,
            height: side,
            data: Arc::from(data.as_slice()),
            format: PixelFormat::RGBA,
            stride: stride as u32,
            captured_at: Instant::now(),
        };

        let code = detector.detect_sync(&frame).unwrap().unwrap();
        assert_eq!(code.raw_value, PACKET_TEXT);
    }

    #[test]
    fn test_inverted_symbol_found_by_inverted_pass() {
        let config = DetectorConfig {
            attempt_inverted: true,
            ..DetectorConfig::default()
        };
        let detector = SoftwareDetector::new(&config).unwrap();
        let (side, mut pixels) = render_qr(PACKET_TEXT, 8);
        pixels.iter_mut().for_each(|p| *p = 255 - *p);
        let frame = Frame::packed(side, side, PixelFormat::Gray8, pixels);

        let code = detector.detect_sync(&frame).unwrap().unwrap();
        assert_eq!(code.raw_value, PACKET_TEXT);
    }

    #[test]
    fn test_oversized_frame_is_downscaled_without_error() {
        let config = DetectorConfig {
            max_dimension: 32,
            attempt_inverted: true,
        };
        let detector = SoftwareDetector::new(&config).unwrap();
        let frame = Frame::packed(100, 50, PixelFormat::RGB24, vec![128u8; 100 * 50 * 3]);
        assert_eq!(detector.detect_sync(&frame).unwrap(), None);
    }

    #[test]
    fn test_inconsistent_frame_is_rejected() {
        let detector = SoftwareDetector::new(&DetectorConfig::default()).unwrap();
        let mut frame = Frame::packed(8, 8, PixelFormat::Gray8, vec![0u8; 64]);
        frame.data = Arc::from(vec![0u8; 10].as_slice());
        assert!(matches!(
            detector.detect_sync(&frame),
            Err(DetectError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_zero_max_dimension_is_rejected() {
        let config = DetectorConfig {
            max_dimension: 0,
            attempt_inverted: false,
        };
        assert!(SoftwareDetector::new(&config).is_err());
    }
}
