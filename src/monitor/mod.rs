//! Capture pipeline: controller, receiver thread, engine thread, log sink
//!
//! The pipeline captures delimited byte frames from a transport, filters
//! them through the active matcher, and appends matches to a size-rotated
//! log file. Two threads do the work, communicating over a crossbeam
//! channel:
//!
//! - [`FrameReceiver`] - reads the transport and enqueues timestamped frames
//! - [`FilterEngine`] - dequeues, decodes, filters, writes and rotates
//!
//! [`PortMonitor`] orchestrates lifecycle (`Idle → Running → Stopping →
//! Stopped`), owns the swappable matcher, and exposes the synchronous
//! `send` and `update_filter` operations. Operator-visible happenings
//! (matched frames, receiver faults) flow out through a [`MonitorEvent`]
//! channel.
//!
//! # Example
//!
//! ```ignore
//! use portmon_rs::config::MonitorConfig;
//! use portmon_rs::monitor::{MonitorEvent, PortMonitor};
//!
//! let config = MonitorConfig::load_or_default("portmon.toml");
//! let (mut monitor, events) = PortMonitor::new(config)?;
//! monitor.start()?;
//! monitor.update_filter(r#"OR("ERR","WARN")"#)?;
//! for event in events {
//!     if let MonitorEvent::FrameLogged { text, .. } = event {
//!         println!("{text}");
//!     }
//! }
//! ```

pub mod engine;
pub mod receiver;
pub mod sink;

pub use engine::{FilterEngine, DEQUEUE_TIMEOUT};
pub use receiver::{FrameReceiver, FRAME_DELIMITER};
pub use sink::LogSink;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::filter::Matcher;
use crate::transport::{SerialTransport, Transport};
use crate::types::{Frame, SessionState, SharedState};
use arc_swap::ArcSwap;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long `stop` waits for each worker thread before detaching it
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Lock a mutex, recovering the data from a poisoned lock
///
/// Worker threads never hold these locks across panicking code on purpose,
/// but a poisoned transport or sink must not take the controller down too.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Operator-visible pipeline events
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A frame matched the active filter and was written to the log
    FrameLogged {
        timestamp: String,
        direction: crate::types::Direction,
        text: String,
    },
    /// The receiver thread terminated on a transport fault
    ///
    /// Reported exactly once. The session stays `Running`: frame reception
    /// has ended but `send` and the log remain usable until the operator
    /// issues `stop`.
    ReceiverError(String),
}

/// Where `start` gets its transport from
enum TransportSource {
    /// Open the configured serial port on `start`
    Serial,
    /// Use a pre-built transport (tests, loopback demos); consumed by the
    /// first `start`
    Injected(Option<Box<dyn Transport>>),
}

/// Pipeline controller and lifecycle owner
pub struct PortMonitor {
    config: MonitorConfig,
    state: SharedState,
    matcher: Arc<ArcSwap<Matcher>>,
    sink: Arc<Mutex<LogSink>>,
    transport: Option<Arc<Mutex<Box<dyn Transport>>>>,
    source: TransportSource,
    event_tx: Sender<MonitorEvent>,
    receiver_handle: Option<JoinHandle<()>>,
    engine_handle: Option<JoinHandle<()>>,
}

impl PortMonitor {
    /// Create a monitor that opens the configured serial port on `start`
    ///
    /// The first log segment is opened eagerly and the configured filter
    /// expression is compiled here; either failing is a construction error.
    /// Returns the monitor together with the operator event channel.
    pub fn new(config: MonitorConfig) -> Result<(Self, Receiver<MonitorEvent>)> {
        Self::build(config, TransportSource::Serial)
    }

    /// Create a monitor over a pre-built transport
    pub fn with_transport(
        config: MonitorConfig,
        transport: Box<dyn Transport>,
    ) -> Result<(Self, Receiver<MonitorEvent>)> {
        Self::build(config, TransportSource::Injected(Some(transport)))
    }

    fn build(
        config: MonitorConfig,
        source: TransportSource,
    ) -> Result<(Self, Receiver<MonitorEvent>)> {
        let matcher = Matcher::compile(&config.log.match_expression)?;
        let sink = LogSink::open(&config.log)?;
        let (event_tx, event_rx) = unbounded();

        Ok((
            Self {
                config,
                state: SharedState::new(SessionState::Idle),
                matcher: Arc::new(ArcSwap::from_pointee(matcher)),
                sink: Arc::new(Mutex::new(sink)),
                transport: None,
                source,
                event_tx,
                receiver_handle: None,
                engine_handle: None,
            },
            event_rx,
        ))
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Open the transport and start the receiver and engine threads
    ///
    /// Fails and stays `Idle` when the transport cannot be opened; the
    /// operator may retry.
    pub fn start(&mut self) -> Result<()> {
        match self.state.get() {
            SessionState::Idle => {}
            actual => {
                return Err(MonitorError::InvalidState {
                    required: SessionState::Idle,
                    actual,
                })
            }
        }

        let transport: Box<dyn Transport> = match &mut self.source {
            TransportSource::Serial => Box::new(SerialTransport::open(&self.config.serial)?),
            TransportSource::Injected(slot) => slot.take().ok_or(MonitorError::TransportClosed)?,
        };
        let transport = Arc::new(Mutex::new(transport));
        self.transport = Some(transport.clone());

        let (frame_tx, frame_rx) = match self.config.frame_queue_capacity {
            0 => unbounded(),
            capacity => bounded(capacity),
        };

        self.state.set(SessionState::Running);

        let receiver = FrameReceiver::new(
            transport,
            frame_tx,
            self.state.clone(),
            self.event_tx.clone(),
        );
        self.receiver_handle = Some(
            thread::Builder::new()
                .name("portmon-receiver".to_string())
                .spawn(move || receiver.run())?,
        );

        let engine = FilterEngine::new(
            frame_rx,
            self.sink.clone(),
            self.matcher.clone(),
            self.state.clone(),
            self.event_tx.clone(),
        );
        self.engine_handle = Some(
            thread::Builder::new()
                .name("portmon-engine".to_string())
                .spawn(move || engine.run())?,
        );

        tracing::info!("Monitor started on {}", self.config.serial.port);
        Ok(())
    }

    /// Stop the session; idempotent
    ///
    /// Closes the transport (which unblocks a pending receiver read), then
    /// joins both threads with a bounded wait. A thread that does not end
    /// within [`JOIN_TIMEOUT`] is reported and detached; `stop` still
    /// completes and the state becomes `Stopped`, which is terminal.
    /// Stopping a monitor that never started is a no-op: it stays `Idle`
    /// so a failed open can still be retried.
    pub fn stop(&mut self) {
        match self.state.get() {
            SessionState::Idle | SessionState::Stopped => return,
            SessionState::Running | SessionState::Stopping => {}
        }

        self.state.set(SessionState::Stopping);

        if let Some(transport) = &self.transport {
            lock(transport).close();
        }

        join_with_timeout(self.receiver_handle.take(), "receiver");
        join_with_timeout(self.engine_handle.take(), "engine");

        self.state.set(SessionState::Stopped);
        tracing::info!("Monitor stopped");
    }

    /// Write bytes to the transport and log them as a TX frame
    ///
    /// Synchronous: the frame goes through the same filter-and-persist
    /// logic as received frames (bypassing the receive queue) before this
    /// returns. Fails without affecting the pipeline state when the
    /// transport is not open or the write errors.
    pub fn send(&self, data: &[u8]) -> Result<()> {
        let transport = self
            .transport
            .as_ref()
            .ok_or(MonitorError::TransportClosed)?;
        {
            let mut guard = lock(transport);
            if !guard.is_open() {
                return Err(MonitorError::TransportClosed);
            }
            guard.write(data)?;
        }

        let frame = Frame::tx(data.to_vec());
        let matcher = self.matcher.load();
        if let Some(text) = lock(&self.sink).log(&frame, &matcher)? {
            let _ = self.event_tx.send(MonitorEvent::FrameLogged {
                timestamp: frame.format_timestamp(),
                direction: frame.direction,
                text,
            });
        }
        Ok(())
    }

    /// Compile and atomically install a new filter expression
    ///
    /// On a compile error the previously active matcher stays in place.
    /// The new matcher is visible to the next dequeued frame; a frame
    /// already mid-evaluation keeps the matcher it loaded.
    pub fn update_filter(&self, expression: &str) -> Result<()> {
        let matcher = Matcher::compile(expression)?;
        self.matcher.store(Arc::new(matcher));
        tracing::info!("Filter updated to {expression:?}");
        Ok(())
    }

    /// Source text of the active filter expression
    pub fn current_filter(&self) -> String {
        self.matcher.load().source().to_string()
    }

    /// Path of the log segment currently being written
    pub fn log_path(&self) -> PathBuf {
        lock(&self.sink).path().to_path_buf()
    }
}

impl Drop for PortMonitor {
    fn drop(&mut self) {
        if self.state.get() == SessionState::Running {
            self.stop();
        }
    }
}

fn join_with_timeout(handle: Option<JoinHandle<()>>, name: &str) {
    let Some(handle) = handle else { return };
    let deadline = Instant::now() + JOIN_TIMEOUT;

    while !handle.is_finished() {
        if Instant::now() >= deadline {
            tracing::warn!("{name} thread did not stop within {JOIN_TIMEOUT:?}");
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }

    if handle.join().is_err() {
        tracing::warn!("{name} thread panicked");
    }
}
