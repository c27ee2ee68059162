//! Mock transport for testing without real hardware
//!
//! The mock hands out a [`MockHandle`] alongside the transport itself.
//! Tests keep the handle to script incoming chunks, inspect what the
//! pipeline wrote, and simulate a device disappearing mid-session, all
//! while the transport is owned by the receiver thread.
//!
//! # Example
//!
//! ```ignore
//! let (transport, handle) = MockTransport::new();
//! let monitor = PortMonitor::with_transport(config, Box::new(transport))?;
//! monitor.start()?;
//! handle.push_chunk(b"hello world\n");
//! ```
//!
//! # Enabling
//!
//! The mock transport is only available when the `mock-transport` feature
//! is enabled (it is part of the default feature set):
//!
//! ```bash
//! cargo test --features mock-transport
//! ```

use super::Transport;
use crate::error::{MonitorError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct MockInner {
    incoming: VecDeque<Vec<u8>>,
    written: Vec<Vec<u8>>,
    open: bool,
    fail_reads: bool,
}

/// In-memory transport with scripted input
#[derive(Debug)]
pub struct MockTransport {
    inner: Arc<Mutex<MockInner>>,
    /// Simulated per-read timeout when no chunk is queued
    poll_interval: Duration,
}

/// Test-side handle to a [`MockTransport`]
///
/// Cloneable and usable from any thread while the transport itself lives
/// inside the pipeline.
#[derive(Debug, Clone)]
pub struct MockHandle {
    inner: Arc<Mutex<MockInner>>,
}

impl MockTransport {
    /// Create an open mock transport and its controlling handle
    pub fn new() -> (Self, MockHandle) {
        let inner = Arc::new(Mutex::new(MockInner {
            open: true,
            ..MockInner::default()
        }));
        (
            Self {
                inner: inner.clone(),
                poll_interval: Duration::from_millis(10),
            },
            MockHandle { inner },
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl MockHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Queue a chunk for the next `read_until` call
    ///
    /// Chunks are delivered whole, exactly as a delimiter-terminated read
    /// would return them.
    pub fn push_chunk(&self, bytes: &[u8]) {
        self.lock().incoming.push_back(bytes.to_vec());
    }

    /// Everything the pipeline has written so far
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.lock().written.clone()
    }

    /// Simulate the device disappearing; subsequent reads and writes fail
    pub fn disconnect(&self) {
        self.lock().open = false;
    }

    /// Make every subsequent read fail while the transport stays open
    pub fn fail_reads(&self) {
        self.lock().fail_reads = true;
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }
}

impl Transport for MockTransport {
    fn read_until(&mut self, _delimiter: u8) -> Result<Vec<u8>> {
        {
            let mut inner = self.lock();
            if !inner.open {
                return Err(MonitorError::TransportClosed);
            }
            if inner.fail_reads {
                return Err(MonitorError::TransportOpen(
                    "simulated read failure".to_string(),
                ));
            }
            if let Some(chunk) = inner.incoming.pop_front() {
                return Ok(chunk);
            }
        }
        // Nothing queued: behave like a timed-out read
        std::thread::sleep(self.poll_interval);
        Ok(Vec::new())
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        if !inner.open {
            return Err(MonitorError::TransportClosed);
        }
        inner.written.push(data.to_vec());
        Ok(())
    }

    fn reset_buffers(&mut self) -> Result<()> {
        self.lock().incoming.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }

    fn close(&mut self) {
        self.lock().open = false;
    }
}
