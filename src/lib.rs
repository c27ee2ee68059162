//! # portmon-rs: filtered serial capture and logging
//!
//! A serial port monitor that captures delimited byte frames, evaluates
//! each against a boolean filter expression, and appends matches to a
//! size-rotated log file, while staying responsive to concurrent sends,
//! filter updates and an explicit stop.
//!
//! ## Architecture
//!
//! - **Transport**: abstract byte-stream collaborator ([`transport::Transport`]),
//!   backed by a real serial port or a mock for tests
//! - **Filter**: a small boolean DSL (`AND`/`OR`/`NOT` over literal and
//!   regex conditions) compiled into an immutable, hot-swappable matcher
//! - **Pipeline**: a receiver thread producing timestamped frames onto a
//!   crossbeam channel and an engine thread consuming, filtering, writing
//!   and rotating
//! - **Controller**: [`monitor::PortMonitor`] owns the lifecycle and the
//!   operator-facing operations (`start`, `stop`, `send`, `update_filter`)
//!
//! ## Example
//!
//! ```ignore
//! use portmon_rs::config::MonitorConfig;
//! use portmon_rs::monitor::PortMonitor;
//!
//! let config = MonitorConfig::load_or_default("portmon.toml");
//! let (mut monitor, events) = PortMonitor::new(config)?;
//! monitor.start()?;
//! monitor.send(b"AT\r\n")?;
//! monitor.update_filter(r#"AND("0x",NOT("DEBUG"))"#)?;
//! monitor.stop();
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod monitor;
pub mod transport;
pub mod types;

pub use error::{MonitorError, Result};
