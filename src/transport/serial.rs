//! Serial port transport backed by the `serialport` crate

use super::Transport;
use crate::config::{self, SerialConfig};
use crate::error::{MonitorError, Result};
use serialport::{ClearBuffer, DataBits, FlowControl, SerialPort};
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

/// A [`Transport`] over a physical serial port
pub struct SerialTransport {
    /// `None` once closed; dropping the boxed port releases the device
    port: Option<Box<dyn SerialPort>>,
    read_timeout: Duration,
}

impl SerialTransport {
    /// Open the configured port and clear its buffers
    ///
    /// Fails with [`MonitorError::TransportOpen`] for parameters the
    /// platform driver cannot express (mark/space parity, 1.5 stop bits,
    /// byte sizes outside 5..=8) as well as for driver-level open failures
    /// (device absent, busy, permission denied).
    pub fn open(cfg: &SerialConfig) -> Result<Self> {
        let data_bits = match cfg.byte_size {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            other => {
                return Err(MonitorError::TransportOpen(format!(
                    "unsupported byte size {other} (expected 5..=8)"
                )))
            }
        };
        let parity = match cfg.parity {
            config::Parity::None => serialport::Parity::None,
            config::Parity::Even => serialport::Parity::Even,
            config::Parity::Odd => serialport::Parity::Odd,
            config::Parity::Mark | config::Parity::Space => {
                return Err(MonitorError::TransportOpen(
                    "mark/space parity is not supported by the serial driver".to_string(),
                ))
            }
        };
        let stop_bits = match cfg.stop_bits {
            config::StopBits::One => serialport::StopBits::One,
            config::StopBits::Two => serialport::StopBits::Two,
            config::StopBits::OnePointFive => {
                return Err(MonitorError::TransportOpen(
                    "1.5 stop bits are not supported by the serial driver".to_string(),
                ))
            }
        };
        let flow_control = if cfg.rts_cts {
            FlowControl::Hardware
        } else {
            FlowControl::None
        };

        let mut port = serialport::new(&cfg.port, cfg.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .flow_control(flow_control)
            .timeout(cfg.read_timeout())
            .open()
            .map_err(|e| MonitorError::TransportOpen(format!("{}: {e}", cfg.port)))?;

        if cfg.dsr_dtr {
            port.write_data_terminal_ready(true)?;
        }

        let mut transport = Self {
            port: Some(port),
            read_timeout: cfg.read_timeout(),
        };
        transport.reset_buffers()?;
        Ok(transport)
    }
}

impl Transport for SerialTransport {
    fn read_until(&mut self, delimiter: u8) -> Result<Vec<u8>> {
        let port = self.port.as_mut().ok_or(MonitorError::TransportClosed)?;

        // The driver timeout bounds each read call; the deadline bounds the
        // whole chunk so a delimiterless stream cannot hold the transport
        // lock indefinitely.
        let deadline = Instant::now() + self.read_timeout;
        let mut buf = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match port.read(&mut byte) {
                Ok(0) => return Ok(buf),
                Ok(_) => {
                    buf.push(byte[0]);
                    if byte[0] == delimiter {
                        return Ok(buf);
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                    return Ok(buf)
                }
                Err(e) => return Err(e.into()),
            }
            if Instant::now() >= deadline {
                return Ok(buf);
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(MonitorError::TransportClosed)?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    fn reset_buffers(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(MonitorError::TransportClosed)?;
        port.clear(ClearBuffer::All)?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        // Dropping the boxed port closes the device handle
        self.port = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Parity, StopBits};

    fn open_error(cfg: &SerialConfig) -> String {
        match SerialTransport::open(cfg) {
            Err(err) => err.to_string(),
            Ok(_) => panic!("expected open to fail"),
        }
    }

    #[test]
    fn test_unsupported_parameters_fail_before_touching_the_device() {
        let cfg = SerialConfig {
            parity: Parity::Mark,
            ..SerialConfig::default()
        };
        assert!(open_error(&cfg).contains("parity"));

        let cfg = SerialConfig {
            stop_bits: StopBits::OnePointFive,
            ..SerialConfig::default()
        };
        assert!(open_error(&cfg).contains("stop bits"));

        let cfg = SerialConfig {
            byte_size: 9,
            ..SerialConfig::default()
        };
        assert!(open_error(&cfg).contains("byte size"));
    }
}
