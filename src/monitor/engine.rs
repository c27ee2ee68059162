//! Filter-and-log engine thread
//!
//! Consumer side of the capture pipeline: drains the frame queue, reads
//! the active matcher once per frame, and drives the sink. Dequeues use a
//! short timeout so the loop re-checks the lifecycle flag for responsive
//! shutdown.

use super::{lock, MonitorEvent};
use crate::filter::Matcher;
use crate::monitor::LogSink;
use crate::types::{Frame, SharedState};
use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Dequeue poll interval; bounds how long shutdown can lag
pub const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(100);

/// Consumer side of the capture pipeline
pub struct FilterEngine {
    frame_rx: Receiver<Frame>,
    sink: Arc<Mutex<LogSink>>,
    matcher: Arc<ArcSwap<Matcher>>,
    state: SharedState,
    event_tx: Sender<MonitorEvent>,
}

impl FilterEngine {
    pub fn new(
        frame_rx: Receiver<Frame>,
        sink: Arc<Mutex<LogSink>>,
        matcher: Arc<ArcSwap<Matcher>>,
        state: SharedState,
        event_tx: Sender<MonitorEvent>,
    ) -> Self {
        Self {
            frame_rx,
            sink,
            matcher,
            state,
            event_tx,
        }
    }

    /// Run the consume loop until shutdown or a dropped producer
    pub fn run(self) {
        tracing::debug!("Engine thread started");

        while self.state.is_running() {
            match self.frame_rx.recv_timeout(DEQUEUE_TIMEOUT) {
                Ok(frame) => self.process(frame),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        tracing::debug!("Engine thread stopped");
    }

    fn process(&self, frame: Frame) {
        // One matcher load per frame: a swap during evaluation affects only
        // subsequent frames, and the loaded value is always complete.
        let matcher = self.matcher.load();
        match lock(&self.sink).log(&frame, &matcher) {
            Ok(Some(text)) => {
                let _ = self.event_tx.send(MonitorEvent::FrameLogged {
                    timestamp: frame.format_timestamp(),
                    direction: frame.direction,
                    text,
                });
            }
            Ok(None) => {}
            Err(e) => tracing::error!("Failed to write log record: {e}"),
        }
    }
}
