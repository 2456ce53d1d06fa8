// SPDX-License-Identifier: GPL-3.0-only

//! Block-indexed stream decoder
//!
//! Each packet carries one block of the payload plus enough header to place
//! it:
//!
//! ```text
//! ┌─────────┬───────────────┬─────────────┬─────────────┬────────────┐
//! │ version │ total length  │ block count │ block index │ block data │
//! │   u8    │    u32 BE     │   u16 BE    │   u16 BE    │    ...     │
//! └─────────┴───────────────┴─────────────┴─────────────┴────────────┘
//! ```
//!
//! Blocks may arrive in any order and any number of times. The stream is
//! complete once every index has been seen.

use super::{DecodeEvent, Payload, Progress, StreamDecoder};
use crate::constants::packet::{HEADER_LEN, VERSION};
use crate::errors::DecodeError;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StreamHeader {
    total_len: u32,
    block_count: u16,
}

struct Packet<'a> {
    header: StreamHeader,
    index: u16,
    block: &'a [u8],
}

fn parse_packet(bytes: &[u8]) -> Result<Packet<'_>, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::InvalidPacket(format!(
            "packet of {} bytes is shorter than the {} byte header",
            bytes.len(),
            HEADER_LEN
        )));
    }
    if bytes[0] != VERSION {
        return Err(DecodeError::InvalidPacket(format!(
            "unsupported packet version {}",
            bytes[0]
        )));
    }

    let total_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    let block_count = u16::from_be_bytes([bytes[5], bytes[6]]);
    let index = u16::from_be_bytes([bytes[7], bytes[8]]);

    if block_count == 0 {
        return Err(DecodeError::InvalidPacket("block count is zero".to_string()));
    }
    if index >= block_count {
        return Err(DecodeError::InvalidPacket(format!(
            "block index {} out of range for {} blocks",
            index, block_count
        )));
    }

    Ok(Packet {
        header: StreamHeader {
            total_len,
            block_count,
        },
        index,
        block: &bytes[HEADER_LEN..],
    })
}

/// Split a payload into packets understood by [`ChunkDecoder`]
///
/// `block_size` is raised if needed so the block count fits the header.
pub fn encode_packets(data: &[u8], block_size: usize) -> Result<Vec<Vec<u8>>, DecodeError> {
    let total_len = u32::try_from(data.len()).map_err(|_| {
        DecodeError::InvalidPacket(format!(
            "payload of {} bytes exceeds the stream size limit",
            data.len()
        ))
    })?;

    let max_blocks = u16::MAX as usize;
    let block_size = block_size.max(1).max(data.len().div_ceil(max_blocks));

    let blocks: Vec<&[u8]> = if data.is_empty() {
        vec![data]
    } else {
        data.chunks(block_size).collect()
    };
    let block_count = blocks.len() as u16;

    Ok(blocks
        .into_iter()
        .enumerate()
        .map(|(index, block)| {
            let mut packet = Vec::with_capacity(HEADER_LEN + block.len());
            packet.push(VERSION);
            packet.extend_from_slice(&total_len.to_be_bytes());
            packet.extend_from_slice(&block_count.to_be_bytes());
            packet.extend_from_slice(&(index as u16).to_be_bytes());
            packet.extend_from_slice(block);
            packet
        })
        .collect())
}

#[derive(Debug, Clone)]
enum Status {
    Pending,
    Complete(Payload),
    Failed(DecodeError),
}

#[derive(Default)]
struct Assembly {
    header: Option<StreamHeader>,
    blocks: Vec<Option<Vec<u8>>>,
    progress: Progress,
}

impl Assembly {
    /// Store a block; returns the reassembled payload once all are present
    fn accept(&mut self, packet: Packet<'_>) -> Result<Option<Vec<u8>>, DecodeError> {
        match self.header {
            None => {
                self.header = Some(packet.header);
                self.blocks = vec![None; packet.header.block_count as usize];
                self.progress.total_blocks = packet.header.block_count as usize;
            }
            Some(header) if header != packet.header => {
                return Err(DecodeError::InvalidPacket(format!(
                    "packet header {:?} does not match stream header {:?}",
                    packet.header, header
                )));
            }
            Some(_) => {}
        }

        self.progress.received_packets += 1;
        let slot = &mut self.blocks[packet.index as usize];
        if slot.is_some() {
            trace!(index = packet.index, "Duplicate block");
            return Ok(None);
        }
        *slot = Some(packet.block.to_vec());
        self.progress.blocks_received += 1;

        if self.progress.blocks_received < self.progress.total_blocks {
            return Ok(None);
        }

        let data: Vec<u8> = self.blocks.iter().flatten().flatten().copied().collect();
        let expected = packet.header.total_len as usize;
        if data.len() != expected {
            return Err(DecodeError::Corrupt(format!(
                "reassembled {} bytes, header announced {}",
                data.len(),
                expected
            )));
        }
        Ok(Some(data))
    }
}

/// Reassembles payloads framed by [`encode_packets`]
pub struct ChunkDecoder {
    assembly: Mutex<Assembly>,
    status: watch::Sender<Status>,
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkDecoder {
    pub fn new() -> Self {
        let (status, _) = watch::channel(Status::Pending);
        Self {
            assembly: Mutex::new(Assembly::default()),
            status,
        }
    }

    pub fn progress(&self) -> Progress {
        self.lock_assembly().progress
    }

    fn lock_assembly(&self) -> MutexGuard<'_, Assembly> {
        // Assembly stays consistent even if a holder panicked mid-update
        self.assembly
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn status(&self) -> Status {
        self.status.borrow().clone()
    }

    /// Move from Pending to `next`; false if already settled
    fn settle(&self, next: Status) -> bool {
        self.status.send_if_modified(|status| {
            if matches!(status, Status::Pending) {
                *status = next;
                true
            } else {
                false
            }
        })
    }

    fn accept(&self, packet: &[u8]) -> Result<DecodeEvent, DecodeError> {
        match self.status() {
            Status::Failed(e) => return Err(e),
            Status::Complete(data) => {
                return Ok(DecodeEvent {
                    done: true,
                    progress: self.progress(),
                    data: Some(data),
                });
            }
            Status::Pending => {}
        }

        let packet = parse_packet(packet)?;
        let mut assembly = self.lock_assembly();
        let result = assembly.accept(packet);
        let progress = assembly.progress;
        drop(assembly);

        match result {
            Ok(None) => Ok(DecodeEvent {
                done: false,
                progress,
                data: None,
            }),
            Ok(Some(data)) => {
                let payload: Payload = data.into();
                if !self.settle(Status::Complete(payload.clone())) {
                    // Cancelled while the last block was being stored
                    return Err(DecodeError::Aborted);
                }
                debug!(
                    bytes = payload.len(),
                    packets = progress.received_packets,
                    "Stream reassembled"
                );
                Ok(DecodeEvent {
                    done: true,
                    progress,
                    data: Some(payload),
                })
            }
            Err(e @ DecodeError::Corrupt(_)) => {
                self.settle(Status::Failed(e.clone()));
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

impl StreamDecoder for ChunkDecoder {
    async fn enqueue(&self, packet: Vec<u8>) -> Result<DecodeEvent, DecodeError> {
        self.accept(&packet)
    }

    async fn decode(&self) -> Result<Payload, DecodeError> {
        let mut receiver = self.status.subscribe();
        let settled = {
            let status = receiver
                .wait_for(|status| !matches!(status, Status::Pending))
                .await
                .map_err(|_| DecodeError::Aborted)?;
            (*status).clone()
        };

        match settled {
            Status::Complete(data) => Ok(data),
            Status::Failed(e) => Err(e),
            Status::Pending => Err(DecodeError::Aborted),
        }
    }

    fn cancel(&self) {
        if self.settle(Status::Failed(DecodeError::Aborted)) {
            debug!("Decoder cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_splits_into_indexed_blocks() {
        let packets = encode_packets(b"abcdefg", 3).unwrap();
        assert_eq!(packets.len(), 3);
        assert_eq!(&packets[0][..HEADER_LEN], &[1, 0, 0, 0, 7, 0, 3, 0, 0]);
        assert_eq!(&packets[2][HEADER_LEN..], b"g");
    }

    #[test]
    fn test_empty_payload_is_one_empty_block() {
        let packets = encode_packets(b"", 16).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].len(), HEADER_LEN);
    }

    #[test]
    fn test_block_size_grows_to_fit_header() {
        let data = vec![7u8; u16::MAX as usize + 10];
        let packets = encode_packets(&data, 1).unwrap();
        assert!(packets.len() <= u16::MAX as usize);
    }

    #[test]
    fn test_parse_rejects_malformed_packets() {
        assert!(parse_packet(&[1, 0, 0]).is_err());
        assert!(parse_packet(&[2, 0, 0, 0, 1, 0, 1, 0, 0, 9]).is_err());
        assert!(parse_packet(&[1, 0, 0, 0, 1, 0, 0, 0, 0, 9]).is_err());
        assert!(parse_packet(&[1, 0, 0, 0, 1, 0, 1, 0, 1, 9]).is_err());
        assert!(parse_packet(&[1, 0, 0, 0, 1, 0, 1, 0, 0, 9]).is_ok());
    }

    #[tokio::test]
    async fn test_out_of_order_with_duplicates() {
        let decoder = ChunkDecoder::new();
        let packets = encode_packets(b"hello world", 4).unwrap();

        let event = decoder.enqueue(packets[2].clone()).await.unwrap();
        assert!(!event.done);
        let event = decoder.enqueue(packets[2].clone()).await.unwrap();
        assert_eq!(event.progress.received_packets, 2);
        assert_eq!(event.progress.blocks_received, 1);

        decoder.enqueue(packets[0].clone()).await.unwrap();
        let event = decoder.enqueue(packets[1].clone()).await.unwrap();
        assert!(event.done);
        assert_eq!(event.data.as_deref(), Some(&b"hello world"[..]));
        assert_eq!(&*decoder.decode().await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_mismatched_header_is_transient() {
        let decoder = ChunkDecoder::new();
        let first = encode_packets(b"aaaa", 2).unwrap();
        let other = encode_packets(b"bbbbbb", 2).unwrap();

        decoder.enqueue(first[0].clone()).await.unwrap();
        let err = decoder.enqueue(other[1].clone()).await.unwrap_err();
        assert!(matches!(err, DecodeError::InvalidPacket(_)));

        let event = decoder.enqueue(first[1].clone()).await.unwrap();
        assert!(event.done);
    }

    #[tokio::test]
    async fn test_length_mismatch_is_corrupt() {
        let decoder = ChunkDecoder::new();
        let mut packet = encode_packets(b"abc", 8).unwrap().remove(0);
        packet.push(b'd');

        let err = decoder.enqueue(packet).await.unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt(_)));
        assert!(matches!(decoder.decode().await, Err(DecodeError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_cancel_fails_pending_and_future_operations() {
        let decoder = std::sync::Arc::new(ChunkDecoder::new());
        let packets = encode_packets(b"abcdef", 2).unwrap();
        decoder.enqueue(packets[0].clone()).await.unwrap();

        let waiting = {
            let decoder = decoder.clone();
            tokio::spawn(async move { decoder.decode().await })
        };
        tokio::task::yield_now().await;

        decoder.cancel();
        decoder.cancel();

        assert_eq!(waiting.await.unwrap(), Err(DecodeError::Aborted));
        assert_eq!(
            decoder.enqueue(packets[1].clone()).await,
            Err(DecodeError::Aborted)
        );
    }

    #[tokio::test]
    async fn test_cancel_after_completion_is_noop() {
        let decoder = ChunkDecoder::new();
        for packet in encode_packets(b"xy", 1).unwrap() {
            decoder.enqueue(packet).await.unwrap();
        }
        decoder.cancel();
        assert_eq!(&*decoder.decode().await.unwrap(), b"xy");
    }
}
