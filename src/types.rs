//! Core data types shared across the crate
//!
//! This module defines the captured [`Frame`] value, the session lifecycle
//! state machine, and small byte/hex helpers used by the sink and the shell.

use chrono::{DateTime, Local};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Direction of a captured frame relative to the local end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Received from the remote device
    Rx,
    /// Sent by the operator
    Tx,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Rx => write!(f, "RX"),
            Direction::Tx => write!(f, "TX"),
        }
    }
}

/// One timestamped unit of captured or sent data
///
/// Created once at capture or send time and never mutated afterwards;
/// ownership moves from the receiver thread to the engine via the frame
/// queue.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Capture time, millisecond precision when formatted
    pub timestamp: DateTime<Local>,
    /// RX for received data, TX for operator sends
    pub direction: Direction,
    /// Raw bytes as read from or written to the transport
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a received frame stamped with the current time
    pub fn rx(payload: Vec<u8>) -> Self {
        Self {
            timestamp: Local::now(),
            direction: Direction::Rx,
            payload,
        }
    }

    /// Create a sent frame stamped with the current time
    pub fn tx(payload: Vec<u8>) -> Self {
        Self {
            timestamp: Local::now(),
            direction: Direction::Tx,
            payload,
        }
    }

    /// Record timestamp in the log format, e.g. `2026-08-27 10:15:03.042`
    pub fn format_timestamp(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }
}

/// Session lifecycle state
///
/// `Idle → Running → Stopping → Stopped`. `Stopped` is terminal; starting a
/// new session means constructing a new monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Transport not yet opened
    Idle = 0,
    /// Receiver and engine threads active
    Running = 1,
    /// Stop requested, threads winding down
    Stopping = 2,
    /// Threads joined, terminal
    Stopped = 3,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SessionState::Idle,
            1 => SessionState::Running,
            2 => SessionState::Stopping,
            _ => SessionState::Stopped,
        }
    }
}

/// Shared, atomically updated lifecycle flag
///
/// Cloned into the receiver and engine threads, which poll it to decide
/// whether to keep looping. Only the controller writes it.
#[derive(Debug, Clone)]
pub struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub fn new(initial: SessionState) -> Self {
        Self(Arc::new(AtomicU8::new(initial as u8)))
    }

    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: SessionState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.get() == SessionState::Running
    }
}

/// Render bytes as space-separated two-digit uppercase hex, e.g. `0A FF 42`
pub fn to_hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a hex string like `"A1 B2C3"` into bytes; whitespace is ignored
pub fn parse_hex(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty()
        || compact.len() % 2 != 0
        || !compact.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }
    (0..compact.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&compact[i..i + 2], 16).ok())
        .collect()
}
