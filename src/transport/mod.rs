//! Byte-stream transport abstraction
//!
//! The pipeline never talks to the serial driver directly; it goes through
//! the [`Transport`] trait so the same receiver/engine machinery runs
//! against real hardware (via the `serialport` crate) and against the mock
//! transport used by the test suite.
//!
//! # Contract
//!
//! - `read_until` blocks for at most the configured per-read timeout and
//!   returns whatever bytes accumulated; an empty or partial chunk is not
//!   an error, only a driver fault is.
//! - `close` may be called from a thread other than the reader. Closing
//!   makes subsequent reads fail promptly, which is the mechanism the
//!   controller uses to end the receiver thread; the bounded read timeout
//!   is the fallback when a driver does not unblock on close.

pub mod serial;

#[cfg(feature = "mock-transport")]
pub mod mock;

pub use serial::SerialTransport;

#[cfg(feature = "mock-transport")]
pub use mock::{MockHandle, MockTransport};

use crate::error::Result;

/// Unified interface for byte-stream transports
///
/// Implementations must be `Send` so the receiver thread can own reads
/// while the controller thread issues writes and the close.
pub trait Transport: Send {
    /// Read bytes until `delimiter` is seen or the per-read timeout elapses
    ///
    /// Returns the accumulated bytes, delimiter included when seen. An
    /// empty result means the timeout elapsed with nothing pending.
    fn read_until(&mut self, delimiter: u8) -> Result<Vec<u8>>;

    /// Write all bytes to the transport
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Discard any driver-side input and output buffers
    fn reset_buffers(&mut self) -> Result<()>;

    /// Whether the transport is currently open
    fn is_open(&self) -> bool;

    /// Close the transport; subsequent reads and writes fail
    fn close(&mut self);
}
