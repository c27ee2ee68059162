//! Frame receiver thread
//!
//! Owns the transport read loop: pulls delimited chunks, stamps them, and
//! hands them to the engine over the frame queue. The loop ends when the
//! lifecycle flag leaves `Running` or the transport reports an error.

use super::{lock, MonitorEvent};
use crate::transport::Transport;
use crate::types::{Frame, SharedState};
use crossbeam_channel::Sender;
use std::sync::{Arc, Mutex};

/// Frames are delimited by newline on the wire
pub const FRAME_DELIMITER: u8 = b'\n';

/// Producer side of the capture pipeline
pub struct FrameReceiver {
    transport: Arc<Mutex<Box<dyn Transport>>>,
    frame_tx: Sender<Frame>,
    state: SharedState,
    event_tx: Sender<MonitorEvent>,
}

impl FrameReceiver {
    pub fn new(
        transport: Arc<Mutex<Box<dyn Transport>>>,
        frame_tx: Sender<Frame>,
        state: SharedState,
        event_tx: Sender<MonitorEvent>,
    ) -> Self {
        Self {
            transport,
            frame_tx,
            state,
            event_tx,
        }
    }

    /// Run the read loop until shutdown or a transport fault
    ///
    /// Empty reads (per-read timeout, no delimiter seen) loop again so the
    /// lifecycle flag is re-checked at least once per timeout interval. A
    /// transport error is reported exactly once, and only if the session is
    /// still `Running` (a close during shutdown is expected); the thread
    /// then terminates without retrying.
    pub fn run(self) {
        tracing::debug!("Receiver thread started");

        while self.state.is_running() {
            // The lock is released between reads so `send` and `stop` can
            // reach the transport; each read blocks at most one timeout.
            let chunk = lock(&self.transport).read_until(FRAME_DELIMITER);

            match chunk {
                Ok(bytes) if bytes.is_empty() => continue,
                Ok(bytes) => {
                    // A full queue blocks here; a dropped consumer ends the loop
                    if self.frame_tx.send(Frame::rx(bytes)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    if self.state.is_running() {
                        tracing::error!("Receive error: {e}");
                        let _ = self
                            .event_tx
                            .send(MonitorEvent::ReceiverError(e.to_string()));
                    }
                    break;
                }
            }
        }

        tracing::debug!("Receiver thread stopped");
    }
}
