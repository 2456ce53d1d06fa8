// SPDX-License-Identifier: GPL-3.0-only

//! Latest-frame source fed by a capture thread

use super::types::{Frame, FrameSource};
use std::sync::Arc;
use tokio::sync::watch;

/// Producer half: the capture loop publishes each new frame here
#[derive(Clone)]
pub struct FramePublisher {
    sender: Arc<watch::Sender<Option<Arc<Frame>>>>,
}

impl FramePublisher {
    /// Replace the current frame. Older frames are dropped unseen.
    pub fn publish(&self, frame: Frame) {
        self.sender.send_replace(Some(Arc::new(frame)));
    }

    /// Clear the current frame, e.g. when the camera stops
    pub fn clear(&self) {
        self.sender.send_replace(None);
    }
}

/// Consumer half: scans sample whatever frame is newest
pub struct LiveFrameSource {
    receiver: watch::Receiver<Option<Arc<Frame>>>,
}

impl LiveFrameSource {
    pub fn new() -> (FramePublisher, Self) {
        let (sender, receiver) = watch::channel(None);
        (
            FramePublisher {
                sender: Arc::new(sender),
            },
            Self { receiver },
        )
    }
}

impl FrameSource for LiveFrameSource {
    fn current_frame(&self) -> Option<Arc<Frame>> {
        self.receiver.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::PixelFormat;

    #[test]
    fn test_latest_frame_wins() {
        let (publisher, source) = LiveFrameSource::new();
        assert!(source.current_frame().is_none());

        publisher.publish(Frame::packed(1, 1, PixelFormat::Gray8, vec![10]));
        publisher.publish(Frame::packed(1, 1, PixelFormat::Gray8, vec![20]));
        assert_eq!(source.current_frame().unwrap().data[0], 20);

        publisher.clear();
        assert!(source.current_frame().is_none());
    }
}
