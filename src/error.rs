//! Error handling for the portmon-rs crate
//!
//! This module defines the crate-wide error type and a Result alias.
//! All boundary errors (transport, filter compilation, configuration) are
//! converted into [`MonitorError`] variants; none are allowed to escape a
//! worker thread as a panic.

use crate::filter::FilterError;
use crate::types::SessionState;
use thiserror::Error;

/// Main error type for portmon-rs operations
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The transport could not be opened (device busy, absent, bad settings)
    #[error("failed to open transport: {0}")]
    TransportOpen(String),

    /// I/O failure on an already-open transport or on the log file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors reported by the serial port driver after open
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An operation required an open transport and there was none
    #[error("transport is not open")]
    TransportClosed,

    /// A user-supplied filter expression failed to compile
    #[error("invalid filter expression: {0}")]
    Filter(#[from] FilterError),

    /// Errors related to configuration loading/saving
    #[error("configuration error: {0}")]
    Config(String),

    /// An operation was issued in the wrong lifecycle state
    #[error("monitor is {actual:?}, operation requires {required:?}")]
    InvalidState {
        required: SessionState,
        actual: SessionState,
    },
}

/// Result type alias for portmon-rs operations
pub type Result<T> = std::result::Result<T, MonitorError>;
