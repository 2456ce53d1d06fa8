// SPDX-License-Identifier: GPL-3.0-only

//! Scan session bookkeeping

use crate::decoder::StreamDecoder;
use std::sync::Arc;

/// Generation number assigned to each scan start
pub type Generation = u64;

/// The scan currently allowed to make progress
pub(crate) struct ScanSession<D> {
    pub(crate) generation: Generation,
    pub(crate) decoder: Arc<D>,
}

impl<D: StreamDecoder> ScanSession<D> {
    pub(crate) fn new(generation: Generation, decoder: Arc<D>) -> Self {
        Self {
            generation,
            decoder,
        }
    }
}

/// How the attempt loop of one scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopExit {
    /// The decoder reported the terminal event
    Completed,
    /// A newer scan took over
    Superseded,
    /// The decoder was cancelled
    Aborted,
}
