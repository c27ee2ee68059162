//! Configuration for the serial transport and the log pipeline
//!
//! Configuration is stored as TOML. A missing file is not an error: every
//! field has a default, so `load` on a nonexistent path yields the default
//! configuration, matching the fallback behavior operators expect from the
//! tool. Partial files are merged over the defaults.
//!
//! ```toml
//! frame_queue_capacity = 1024
//!
//! [serial]
//! port = "COM1"
//! baud_rate = 115200
//! parity = "N"
//! stop_bits = "1"
//!
//! [log]
//! file_path = "serial.log"
//! max_size_mb = 10
//! match_expression = 'AND("0x",NOT("DEBUG"))'
//! hex_mode = false
//! ```

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Parity bit setting for the serial line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    #[serde(rename = "N")]
    None,
    #[serde(rename = "E")]
    Even,
    #[serde(rename = "O")]
    Odd,
    #[serde(rename = "M")]
    Mark,
    #[serde(rename = "S")]
    Space,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "1.5")]
    OnePointFive,
    #[serde(rename = "2")]
    Two,
}

/// Serial port parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device name, e.g. `COM1` or `/dev/ttyUSB0`
    pub port: String,
    /// Line speed in baud
    pub baud_rate: u32,
    /// Data bits per character (5..=8)
    pub byte_size: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Per-read timeout in seconds; reads returning nothing within this
    /// window yield an empty chunk, not an error
    pub read_timeout_secs: f64,
    /// RTS/CTS hardware flow control
    pub rts_cts: bool,
    /// Assert DTR on open (DSR/DTR handshaking)
    pub dsr_dtr: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "COM1".to_string(),
            baud_rate: 9600,
            byte_size: 8,
            parity: Parity::None,
            stop_bits: StopBits::One,
            read_timeout_secs: 0.1,
            rts_cts: false,
            dsr_dtr: false,
        }
    }
}

impl SerialConfig {
    /// The per-read timeout as a [`Duration`]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.read_timeout_secs)
    }
}

/// Log file and filter parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base file path; the extension is stripped and replaced by
    /// `_<YYYYMMDD_HHMMSS>.log` for each rotation segment
    pub file_path: String,
    /// Rotation threshold in megabytes
    pub max_size_mb: u32,
    /// Initial filter expression; empty matches everything
    pub match_expression: String,
    /// Render payloads as hex regardless of content
    pub hex_mode: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file_path: "serial.log".to_string(),
            max_size_mb: 10,
            match_expression: String::new(),
            hex_mode: false,
        }
    }
}

impl LogConfig {
    /// Rotation threshold in bytes
    pub fn rotation_threshold_bytes(&self) -> u64 {
        u64::from(self.max_size_mb) * 1024 * 1024
    }
}

/// Complete monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Frame queue capacity between receiver and engine; 0 means unbounded.
    /// A full queue blocks the receiver rather than dropping frames.
    pub frame_queue_capacity: usize,
    pub serial: SerialConfig,
    pub log: LogConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            frame_queue_capacity: 1024,
            serial: SerialConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file
    ///
    /// A nonexistent file yields the defaults; an unreadable or malformed
    /// file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::Config(format!("failed to read {}: {e}", path.display())))?;

        toml::from_str(&content)
            .map_err(|e| MonitorError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Load configuration, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {e}");
            Self::default()
        })
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MonitorError::Config(format!("failed to serialize config: {e}")))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| MonitorError::Config(format!("failed to write config: {e}")))
    }
}
