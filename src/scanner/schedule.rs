// SPDX-License-Identifier: GPL-3.0-only

//! Frame pacing for scan attempts
//!
//! Attempts run once per frame boundary and only while the consumer is
//! visible. Hiding the clock parks every ticker until it is shown again.

use crate::constants::MIN_FRAME_INTERVAL;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{trace, warn};

/// Shared pacing settings and visibility flag
#[derive(Clone)]
pub struct FrameClock {
    interval: Duration,
    visible: Arc<watch::Sender<bool>>,
}

impl FrameClock {
    /// Intervals below [`MIN_FRAME_INTERVAL`] are raised to it
    pub fn new(interval: Duration) -> Self {
        let interval = if interval < MIN_FRAME_INTERVAL {
            warn!(?interval, minimum = ?MIN_FRAME_INTERVAL, "Frame interval too short, raising");
            MIN_FRAME_INTERVAL
        } else {
            interval
        };
        let (visible, _) = watch::channel(true);
        Self {
            interval,
            visible: Arc::new(visible),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Pause (false) or resume (true) every ticker created from this clock
    pub fn set_visible(&self, visible: bool) {
        self.visible.send_replace(visible);
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    /// Per-scan ticker; the first tick fires immediately
    pub fn ticker(&self) -> FrameTicker {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        FrameTicker {
            interval,
            visible: self.visible.subscribe(),
        }
    }
}

pub struct FrameTicker {
    interval: Interval,
    visible: watch::Receiver<bool>,
}

impl FrameTicker {
    /// Wait for the next frame boundary
    pub async fn tick(&mut self) {
        if !*self.visible.borrow_and_update() {
            trace!("Frame clock hidden, waiting");
            // The sender lives in the clock; a closed channel means nobody
            // can hide us any more, so carry on.
            let _ = self.visible.wait_for(|visible| *visible).await;
            // Restart pacing from the moment we became visible
            self.interval.reset_immediately();
        }
        self.interval.tick().await;
        tokio::task::yield_now().await;
    }
}
