// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use qram_scanner::constants::packet::DEFAULT_BLOCK_SIZE;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "qram-scanner")]
#[command(about = "Scan multi-frame QR (qram) streams")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Config file (default: ~/.config/qram-scanner/config.json if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a sequence of frames until the stream is reassembled
    Scan {
        /// Image files shown in a loop, one per frame
        #[arg(required = true)]
        frames: Vec<PathBuf>,

        /// Write the payload here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pause between frames in milliseconds (overrides config)
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },

    /// Detect a single QR code in an image and print its text
    Detect {
        /// Image file
        image: PathBuf,
    },

    /// Split a file into packets, printed one per line as QR payload text
    Packets {
        /// File to split
        input: PathBuf,

        /// Bytes of payload per packet
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE, value_parser = parse_block_size)]
        block_size: usize,
    },
}

/// Parse a packet block size; at least one byte
fn parse_block_size(s: &str) -> Result<usize, String> {
    let size: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid block size: '{s}'"))?;
    if size == 0 {
        return Err("Block size must be at least 1 byte".to_string());
    }
    Ok(size)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=qram_scanner=trace, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            frames,
            output,
            interval_ms,
        } => cli::scan_frames(cli.config.as_deref(), &frames, output, interval_ms),
        Commands::Detect { image } => cli::detect_image(cli.config.as_deref(), &image),
        Commands::Packets { input, block_size } => cli::print_packets(&input, block_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block_size() {
        assert_eq!(parse_block_size("64"), Ok(64));
        assert_eq!(parse_block_size(" 1 "), Ok(1));
        assert!(parse_block_size("0").is_err());
        assert!(parse_block_size("-3").is_err());
        assert!(parse_block_size("big").is_err());
    }

    #[test]
    fn test_packets_rejects_zero_block_size() {
        let result = Cli::try_parse_from(["qram-scanner", "packets", "data.bin", "-b", "0"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["qram-scanner", "packets", "data.bin"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Packets { block_size: DEFAULT_BLOCK_SIZE, .. }
        ));
    }
}
