// SPDX-License-Identifier: GPL-3.0-only

//! Scan loop
//!
//! [`QramScanner`] samples frames from a source, detects a QR code in each,
//! and feeds the decoded packets to a stream decoder until the stream is
//! reassembled.
//!
//! ```text
//!  scan() ──► detector ready? ──► cancel previous session ──► new session
//!                                                                 │
//!        ┌────────────────────────────────────────────────────────┘
//!        ▼
//!   tick ──► detect ──► superseded? ── yes ──► stop
//!    ▲          │            │
//!    │       no code         no
//!    ├──────────┘            ▼
//!    │                    enqueue ──► done ──► decode() resolves
//!    │                       │
//!    └── progress / misread ─┘
//! ```
//!
//! Every scan gets a generation number. A newer scan supersedes older ones:
//! they stop at their next check and resolve to `Ok(None)`.
//!
//! # Example
//!
//! ```ignore
//! let scanner = QramScanner::new(ScannerConfig::default(), ChunkDecoder::new);
//! let payload = scanner
//!     .scan(&source, |event| async move {
//!         println!("{}/{}", event.progress.blocks_received, event.progress.total_blocks);
//!     })
//!     .await?;
//! ```

pub mod schedule;
mod session;

pub use schedule::{FrameClock, FrameTicker};
pub use session::Generation;

use crate::config::ScannerConfig;
use crate::decoder::{DecodeEvent, DecoderFactory, Payload, StreamDecoder, transport};
use crate::detector::{DetectorBackend, DetectorKind, NativeDetector};
use crate::errors::{DecodeError, ScanError, ScanResult};
use crate::source::FrameSource;
use session::{LoopExit, ScanSession};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;
use tracing::{debug, info, trace, warn};

type SessionSlot<D> = Mutex<Option<ScanSession<D>>>;

fn lock_slot<D>(slot: &SessionSlot<D>) -> MutexGuard<'_, Option<ScanSession<D>>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Multi-frame QR stream scanner
pub struct QramScanner<F: DecoderFactory> {
    config: ScannerConfig,
    factory: F,
    native: Option<Arc<dyn NativeDetector>>,
    clock: FrameClock,
    detector: OnceCell<DetectorBackend>,
    generation: AtomicU64,
    session: SessionSlot<F::Decoder>,
}

impl<F: DecoderFactory> QramScanner<F> {
    pub fn new(config: ScannerConfig, factory: F) -> Self {
        let clock = FrameClock::new(config.frame_interval());
        Self {
            config,
            factory,
            native: None,
            clock,
            detector: OnceCell::new(),
            generation: AtomicU64::new(0),
            session: Mutex::new(None),
        }
    }

    /// Offer a host detector; it is used if it supports QR codes
    pub fn with_native_detector(mut self, native: Arc<dyn NativeDetector>) -> Self {
        self.native = Some(native);
        self
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Pacing clock; hide it to pause scanning while nothing is displayed
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Generation of the most recently started scan (0 before any scan)
    pub fn generation(&self) -> Generation {
        self.generation.load(Ordering::SeqCst)
    }

    /// Whether a session currently holds a decoder
    pub fn is_active(&self) -> bool {
        lock_slot(&self.session).is_some()
    }

    pub fn active_generation(&self) -> Option<Generation> {
        lock_slot(&self.session).as_ref().map(|s| s.generation)
    }

    /// Backend in use, once the first scan has built one
    pub fn detector_kind(&self) -> Option<DetectorKind> {
        self.detector.get().map(DetectorBackend::kind)
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Scan `source` until a full stream has been decoded
    ///
    /// `on_progress` is awaited after every packet that advances the stream
    /// without completing it. Returns `Ok(None)` when the scan is cancelled
    /// or superseded by a newer `scan` call. Frames without a code and
    /// packets that fail to decode are retried indefinitely.
    pub async fn scan<S, P, Fut>(&self, source: &S, mut on_progress: P) -> ScanResult<Option<Payload>>
    where
        S: FrameSource + ?Sized,
        P: FnMut(DecodeEvent) -> Fut,
        Fut: Future<Output = ()>,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Scan requested");

        let detector = self
            .detector
            .get_or_try_init(|| DetectorBackend::probe(self.native.clone(), &self.config.detector))
            .await?;

        let decoder = {
            let mut slot = lock_slot(&self.session);
            if !self.is_current(generation) {
                debug!(generation, "Scan superseded before it started");
                return Ok(None);
            }
            if let Some(previous) = slot.take() {
                info!(
                    previous = previous.generation,
                    generation, "Cancelling previous scan"
                );
                previous.decoder.cancel();
            }
            let decoder = Arc::new(self.factory.create());
            *slot = Some(ScanSession::new(generation, Arc::clone(&decoder)));
            decoder
        };
        let guard = SessionGuard {
            slot: &self.session,
            generation,
        };

        info!(generation, detector = ?detector.kind(), "Scan started");

        let attempts = self.run_attempts(
            generation,
            detector,
            decoder.as_ref(),
            source,
            &mut on_progress,
        );
        let completion = decoder.decode();
        tokio::pin!(attempts);
        tokio::pin!(completion);

        let mut attempts_done = false;
        let outcome = loop {
            tokio::select! {
                result = &mut completion => break result,
                exit = &mut attempts, if !attempts_done => {
                    debug!(generation, ?exit, "Attempt loop finished");
                    attempts_done = true;
                    if exit == LoopExit::Superseded {
                        break Err(DecodeError::Aborted);
                    }
                }
            }
        };

        drop(guard);

        match outcome {
            Ok(payload) => {
                info!(generation, bytes = payload.len(), "Scan complete");
                Ok(Some(payload))
            }
            Err(e) if e.is_abort() => {
                info!(generation, "Scan ended without result");
                Ok(None)
            }
            Err(e) => {
                warn!(generation, error = %e, "Scan failed");
                Err(ScanError::Decode(e))
            }
        }
    }

    /// Frame attempts for one session, strictly one after another
    async fn run_attempts<S, P, Fut>(
        &self,
        generation: Generation,
        detector: &DetectorBackend,
        decoder: &F::Decoder,
        source: &S,
        on_progress: &mut P,
    ) -> LoopExit
    where
        S: FrameSource + ?Sized,
        P: FnMut(DecodeEvent) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut ticker = self.clock.ticker();
        let mut attempt: u64 = 0;

        loop {
            ticker.tick().await;
            attempt += 1;

            let detected = match detector.detect(source).await {
                Ok(code) => code,
                Err(e) => {
                    debug!(generation, attempt, error = %e, "Detection failed, retrying");
                    None
                }
            };

            if !self.is_current(generation) {
                return LoopExit::Superseded;
            }

            let Some(code) = detected else {
                trace!(generation, attempt, "No code in frame");
                continue;
            };

            let packet = match transport::decode_payload(&code.raw_value) {
                Ok(packet) => packet,
                Err(e) => {
                    warn!(generation, attempt, error = %e, "Ignoring unreadable QR payload");
                    continue;
                }
            };

            match decoder.enqueue(packet).await {
                Ok(event) if event.done => return LoopExit::Completed,
                Ok(event) => {
                    if !self.is_current(generation) {
                        return LoopExit::Superseded;
                    }
                    trace!(
                        generation,
                        blocks = event.progress.blocks_received,
                        total = event.progress.total_blocks,
                        "Packet accepted"
                    );
                    on_progress(event).await;
                }
                Err(e) if e.is_abort() => return LoopExit::Aborted,
                Err(e) => {
                    if !self.is_current(generation) {
                        return LoopExit::Superseded;
                    }
                    warn!(generation, attempt, error = %e, "Failed to enqueue packet, retrying");
                }
            }
        }
    }

    /// Cancel the active scan, if any
    ///
    /// The scan resolves to `Ok(None)` at its next suspension point.
    pub fn cancel(&self) {
        let slot = lock_slot(&self.session);
        if let Some(session) = slot.as_ref() {
            info!(generation = session.generation, "Cancelling scan");
            session.decoder.cancel();
        }
    }
}

/// Clears the session slot when its scan ends, unless a newer scan owns it
struct SessionGuard<'a, D> {
    slot: &'a SessionSlot<D>,
    generation: Generation,
}

impl<D> Drop for SessionGuard<'_, D> {
    fn drop(&mut self) {
        let mut slot = lock_slot(self.slot);
        if slot.as_ref().is_some_and(|s| s.generation == self.generation) {
            *slot = None;
            debug!(generation = self.generation, "Session released");
        }
    }
}
