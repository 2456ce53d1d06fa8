// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Scanning an image sequence for a qram stream
//! - Detecting a single QR code in an image
//! - Splitting a file into packet payloads

use qram_scanner::decoder::{encode_packets, transport};
use qram_scanner::detector::SoftwareDetector;
use qram_scanner::source::{ImageSequenceSource, load_image_as_frame};
use qram_scanner::{ChunkDecoder, QramScanner, ScannerConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn load_config(path: Option<&Path>) -> Result<ScannerConfig, Box<dyn std::error::Error>> {
    Ok(ScannerConfig::load(path)?)
}

/// Scan image frames until the stream is reassembled
pub fn scan_frames(
    config_path: Option<&Path>,
    frames: &[PathBuf],
    output: Option<PathBuf>,
    interval_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    if let Some(interval_ms) = interval_ms {
        config.frame_interval_ms = interval_ms;
    }
    config.validate()?;

    let source = ImageSequenceSource::open(frames)?;
    eprintln!("Scanning {} frame(s), press Ctrl-C to stop", source.len());

    let scanner = Arc::new(QramScanner::new(config, ChunkDecoder::new));
    {
        let scanner = Arc::clone(&scanner);
        ctrlc::set_handler(move || scanner.cancel())?;
    }

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async {
        scanner
            .scan(&source, |event| async move {
                eprint!(
                    "\rReceived {}/{} blocks ({} packets)",
                    event.progress.blocks_received,
                    event.progress.total_blocks,
                    event.progress.received_packets
                );
            })
            .await
    })?;
    eprintln!();

    let Some(payload) = result else {
        eprintln!("Scan cancelled");
        return Ok(());
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &payload)?;
            eprintln!("Payload saved: {} ({} bytes)", path.display(), payload.len());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&payload)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Print the text of the first QR code found in an image
pub fn detect_image(
    config_path: Option<&Path>,
    image: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let detector = SoftwareDetector::new(&config.detector)?;
    let frame = load_image_as_frame(image)?;

    match detector.detect_sync(&frame)? {
        Some(code) => {
            println!("{}", code.raw_value);
            Ok(())
        }
        None => Err(format!("No QR code found in {}", image.display()).into()),
    }
}

/// Print packet payloads for a file, one per line
pub fn print_packets(input: &Path, block_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    let packets = encode_packets(&data, block_size)?;

    let mut stdout = std::io::stdout().lock();
    for packet in &packets {
        writeln!(stdout, "{}", transport::encode_packet(packet))?;
    }
    eprintln!("{} bytes in {} packet(s)", data.len(), packets.len());
    Ok(())
}
