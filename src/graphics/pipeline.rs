//! The single-slot frame pipeline between the reactor and the display.
//!
//! At most one frame is in flight. A frame carries a semaphore permit that is
//! only returned once the display has flipped it, so the reactor can ask
//! [`FrameSender::is_backpressured`] before drawing and skip the draw
//! entirely instead of queueing stale frames.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace};

use super::drawlist::DrawList;

/// Errors from [`FrameSender::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// The previous frame has not been flipped yet.
    #[error("display is still busy with the previous frame")]
    Backpressured,
    /// The display side has gone away.
    #[error("display pipeline closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A draw list on its way to the display.
///
/// Dropping the frame frees the pipeline slot.
#[derive(Debug)]
pub struct Frame {
    list: DrawList,
    sequence: u64,
    _slot: OwnedSemaphorePermit,
}

impl Frame {
    /// The commands to rasterize.
    pub fn draw_list(&self) -> &DrawList {
        &self.list
    }

    /// Monotonic frame number, starting at 0.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Create a connected sender/receiver pair.
pub fn frame_pipeline() -> (FrameSender, FrameReceiver) {
    let slots = Arc::new(Semaphore::new(1));
    let (tx, rx) = mpsc::channel(1);
    (
        FrameSender {
            slots,
            tx,
            sequence: 0,
        },
        FrameReceiver { rx },
    )
}

// ---------------------------------------------------------------------------
// FrameSender
// ---------------------------------------------------------------------------

/// Reactor side of the pipeline.
#[derive(Debug)]
pub struct FrameSender {
    slots: Arc<Semaphore>,
    tx: mpsc::Sender<Frame>,
    sequence: u64,
}

impl FrameSender {
    /// Whether a frame is still in flight.
    pub fn is_backpressured(&self) -> bool {
        self.slots.available_permits() == 0
    }

    /// Whether the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Number of frames submitted so far.
    pub fn submitted(&self) -> u64 {
        self.sequence
    }

    /// Hand a finished draw list to the display.
    pub fn submit(&mut self, list: DrawList) -> Result<(), PipelineError> {
        if self.tx.is_closed() {
            return Err(PipelineError::Closed);
        }
        let slot = self
            .slots
            .clone()
            .try_acquire_owned()
            .map_err(|_| PipelineError::Backpressured)?;
        let frame = Frame {
            list,
            sequence: self.sequence,
            _slot: slot,
        };
        self.tx.try_send(frame).map_err(|err| match err {
            TrySendError::Full(_) => PipelineError::Backpressured,
            TrySendError::Closed(_) => PipelineError::Closed,
        })?;
        trace!(sequence = self.sequence, "frame submitted");
        self.sequence += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FrameReceiver / Display
// ---------------------------------------------------------------------------

/// Display side of the pipeline.
#[derive(Debug)]
pub struct FrameReceiver {
    rx: mpsc::Receiver<Frame>,
}

impl FrameReceiver {
    /// Wait for the next frame. `None` once the sender is gone.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Take the pending frame, if any, without waiting.
    pub fn try_next(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}

/// Rasterizes finished frames.
pub trait Display {
    /// Show `list` on the panel.
    fn flip(&mut self, list: &DrawList);
}

/// A display that discards every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn flip(&mut self, _list: &DrawList) {}
}

/// Feed frames to `display` until the sender is dropped.
///
/// Each frame's slot is released after its flip.
pub async fn run_display<D: Display>(mut frames: FrameReceiver, mut display: D) -> D {
    while let Some(frame) = frames.next_frame().await {
        display.flip(frame.draw_list());
        trace!(sequence = frame.sequence(), "frame flipped");
    }
    debug!("frame pipeline closed");
    display
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Graphics;
    use tokio_test::{assert_pending, assert_ready, task};

    fn list(text: &str) -> DrawList {
        let mut g = Graphics::new();
        g.text(0.0, 0.0, text);
        g.finish()
    }

    #[test]
    fn one_frame_in_flight() {
        let (mut tx, mut rx) = frame_pipeline();
        assert!(!tx.is_backpressured());
        tx.submit(list("a")).unwrap();
        assert!(tx.is_backpressured());
        assert_eq!(tx.submit(list("b")), Err(PipelineError::Backpressured));

        // Receiving alone does not free the slot; the flip does.
        let frame = rx.try_next().unwrap();
        assert!(tx.is_backpressured());
        drop(frame);
        assert!(!tx.is_backpressured());
        tx.submit(list("c")).unwrap();
        assert_eq!(tx.submitted(), 2);
    }

    #[test]
    fn closed_receiver_is_reported() {
        let (mut tx, rx) = frame_pipeline();
        drop(rx);
        assert!(tx.is_closed());
        assert_eq!(tx.submit(list("a")), Err(PipelineError::Closed));
    }

    #[test]
    fn next_frame_waits_for_submit() {
        let (mut tx, mut rx) = frame_pipeline();
        let mut next = task::spawn(rx.next_frame());
        assert_pending!(next.poll());
        tx.submit(list("hello")).unwrap();
        assert!(next.is_woken());
        let frame = assert_ready!(next.poll()).unwrap();
        assert_eq!(frame.sequence(), 0);
        assert_eq!(frame.draw_list().texts().collect::<Vec<_>>(), vec!["hello"]);
    }

    #[derive(Default)]
    struct Recording(Vec<String>);

    impl Display for Recording {
        fn flip(&mut self, list: &DrawList) {
            self.0.extend(list.texts().map(str::to_owned));
        }
    }

    #[tokio::test]
    async fn run_display_flips_until_closed() {
        let (mut tx, rx) = frame_pipeline();
        let display = tokio::spawn(run_display(rx, Recording::default()));
        tx.submit(list("one")).unwrap();
        while tx.is_backpressured() {
            tokio::task::yield_now().await;
        }
        tx.submit(list("two")).unwrap();
        drop(tx);
        let recording = display.await.unwrap();
        assert_eq!(recording.0, vec!["one", "two"]);
    }
}
