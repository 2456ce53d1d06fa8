// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for packet transport and stream reassembly

use qram_scanner::decoder::{encode_packets, transport};
use qram_scanner::{ChunkDecoder, DecodeError, StreamDecoder};
use std::sync::Arc;

#[tokio::test]
async fn test_packets_survive_qr_transport() {
    let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    let texts: Vec<String> = encode_packets(&data, 96)
        .unwrap()
        .iter()
        .map(|p| transport::encode_packet(p))
        .collect();
    assert_eq!(texts.len(), 11);
    assert!(texts.iter().all(|t| !t.contains(['+', '/', '='])));

    let decoder = ChunkDecoder::new();
    let mut last = None;
    // Reverse order: blocks can arrive in any order
    for text in texts.iter().rev() {
        let packet = transport::decode_payload(text).unwrap();
        last = Some(decoder.enqueue(packet).await.unwrap());
    }

    let last = last.unwrap();
    assert!(last.done);
    assert_eq!(last.progress.blocks_received, 11);
    assert_eq!(last.progress.fraction(), 1.0);
    assert_eq!(&*decoder.decode().await.unwrap(), data.as_slice());
}

#[tokio::test]
async fn test_decode_waits_for_last_packet() {
    let decoder = Arc::new(ChunkDecoder::new());
    let packets = encode_packets(b"waiting for the end", 5).unwrap();

    let pending = {
        let decoder = Arc::clone(&decoder);
        tokio::spawn(async move { decoder.decode().await })
    };

    for packet in &packets[..packets.len() - 1] {
        let event = decoder.enqueue(packet.clone()).await.unwrap();
        assert!(!event.done);
    }
    assert!(!pending.is_finished());

    decoder.enqueue(packets.last().unwrap().clone()).await.unwrap();
    let payload = pending.await.unwrap().unwrap();
    assert_eq!(&*payload, b"waiting for the end");
}

#[tokio::test]
async fn test_enqueue_after_completion_repeats_terminal_event() {
    let decoder = ChunkDecoder::new();
    let packets = encode_packets(b"once", 2).unwrap();
    for packet in &packets {
        decoder.enqueue(packet.clone()).await.unwrap();
    }

    let event = decoder.enqueue(packets[0].clone()).await.unwrap();
    assert!(event.done);
    assert_eq!(event.data.as_deref(), Some(&b"once"[..]));
}

#[tokio::test]
async fn test_cancelled_decoder_rejects_everything() {
    let decoder = ChunkDecoder::new();
    decoder.cancel();

    let packet = encode_packets(b"late", 8).unwrap().remove(0);
    assert_eq!(decoder.enqueue(packet).await, Err(DecodeError::Aborted));
    assert_eq!(decoder.decode().await, Err(DecodeError::Aborted));
}
