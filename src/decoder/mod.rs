// SPDX-License-Identifier: MPL-2.0

//! Stream decoding
//!
//! A stream decoder accumulates packets read from successive QR frames and
//! reassembles the payload they carry. The scanner talks to it only through
//! [`StreamDecoder`]; [`ChunkDecoder`] is the implementation shipped with
//! the crate.

pub mod chunked;
pub mod transport;

pub use chunked::{ChunkDecoder, encode_packets};

use crate::errors::DecodeError;
use std::future::Future;
use std::sync::Arc;

/// Fully reassembled stream contents
pub type Payload = Arc<[u8]>;

/// Decoder-defined progress counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Packets accepted so far, duplicates included
    pub received_packets: usize,
    /// Distinct blocks recovered
    pub blocks_received: usize,
    /// Blocks needed for the full payload
    pub total_blocks: usize,
}

impl Progress {
    /// Fraction of blocks recovered, 0.0 to 1.0
    pub fn fraction(&self) -> f32 {
        if self.total_blocks == 0 {
            0.0
        } else {
            self.blocks_received as f32 / self.total_blocks as f32
        }
    }
}

/// Result of one successful `enqueue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeEvent {
    pub done: bool,
    pub progress: Progress,
    /// Reassembled payload, present only on the terminal event
    pub data: Option<Payload>,
}

pub trait StreamDecoder: Send + Sync + 'static {
    /// Feed one packet
    ///
    /// Fails with [`DecodeError::Aborted`] once the decoder is cancelled.
    /// Other errors reject only this packet.
    fn enqueue(&self, packet: Vec<u8>)
    -> impl Future<Output = Result<DecodeEvent, DecodeError>> + Send;

    /// Wait for the complete payload
    ///
    /// Fails with [`DecodeError::Aborted`] if the decoder is cancelled first.
    fn decode(&self) -> impl Future<Output = Result<Payload, DecodeError>> + Send;

    /// Make every pending and future operation fail with `Aborted`
    fn cancel(&self);
}

/// Creates one decoder per scan
pub trait DecoderFactory: Send + Sync {
    type Decoder: StreamDecoder;

    fn create(&self) -> Self::Decoder;
}

impl<D, F> DecoderFactory for F
where
    D: StreamDecoder,
    F: Fn() -> D + Send + Sync,
{
    type Decoder = D;

    fn create(&self) -> D {
        self()
    }
}
