//! Serial port transport.
//!
//! [`SerialTransport`] owns an open port and performs one 9-byte write and
//! one 9-byte read per exchange. The port is closed when the transport is
//! dropped.
//!
//! # Example
//!
//! ```rust,no_run
//! use rs_stepper_proxy::config::SerialConfig;
//! use rs_stepper_proxy::hal::SerialTransport;
//! use rs_stepper_proxy::{DeviceAddress, ProtocolClient};
//!
//! let transport = SerialTransport::open("/dev/ttyUSB0", &SerialConfig::default())?;
//! let mut client = ProtocolClient::new(DeviceAddress::new(1)?, transport);
//! let reply = client.get_microstep_resolution(1000);
//! println!("{} {:?}", reply.status, reply.value);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, trace, warn};
use serialport::{ClearBuffer, DataBits, SerialPort, StopBits};

use crate::config::{FlowControl, Parity, SerialConfig};
use crate::error::TransportError;
use crate::frame::{RawFrame, FRAME_SIZE};
use crate::traits::Transport;

/// Blocking transport over a serial port.
pub struct SerialTransport {
    path: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open `path` with the given line settings.
    pub fn open(path: &str, config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(path, config.baud_rate)
            .data_bits(data_bits(config.data_bits)?)
            .parity(parity(config.parity))
            .stop_bits(stop_bits(config.stop_bits)?)
            .flow_control(flow_control(config.flow_control))
            .timeout(Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS as u64))
            .open()
            .with_context(|| format!("failed to open serial port '{}'", path))?;

        debug!(
            "opened {} at {} baud, {}{}{}",
            path,
            config.baud_rate,
            config.data_bits,
            parity_letter(config.parity),
            config.stop_bits
        );

        Ok(Self {
            path: path.to_string(),
            port: Some(port),
        })
    }

    /// Port path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// True until [`close`](Self::close) is called.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Close the port. Later exchanges fail with [`TransportError::NotOpen`].
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("closed {}", self.path);
        }
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

impl core::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Transport for SerialTransport {
    type Error = TransportError;

    fn execute(&mut self, command: &RawFrame, timeout_ms: u32) -> Result<RawFrame, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;
        let deadline = Instant::now() + Duration::from_millis(u64::from(timeout_ms));

        // Drop stale bytes from an earlier timed-out exchange.
        discarded(port.clear(ClearBuffer::Input), &self.path)?;

        trace!("{} tx {:02x?}", self.path, command);
        write_frame(port.as_mut(), command, deadline)?;
        let reply = read_frame(port.as_mut(), deadline)?;
        trace!("{} rx {:02x?}", self.path, reply);
        Ok(reply)
    }
}

/// A failed input flush leaves stale bytes that could pass for the reply.
fn discarded(result: serialport::Result<()>, path: &str) -> Result<(), TransportError> {
    result.map_err(|e| {
        warn!("{}: failed to discard stale input: {}", path, e);
        TransportError::Io
    })
}

fn remaining(deadline: Instant) -> Option<Duration> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|d| !d.is_zero())
}

fn write_frame(
    port: &mut dyn SerialPort,
    command: &RawFrame,
    deadline: Instant,
) -> Result<(), TransportError> {
    let mut written = 0;
    while written < FRAME_SIZE {
        let left = remaining(deadline).ok_or(TransportError::ShortWrite(written))?;
        port.set_timeout(left).map_err(|_| TransportError::Io)?;
        match port.write(&command[written..]) {
            Ok(0) => return Err(TransportError::ShortWrite(written)),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                return Err(TransportError::ShortWrite(written))
            }
            Err(_) => return Err(TransportError::Io),
        }
    }
    port.flush().map_err(|_| TransportError::Io)
}

fn read_frame(port: &mut dyn SerialPort, deadline: Instant) -> Result<RawFrame, TransportError> {
    let mut reply = [0u8; FRAME_SIZE];
    let mut filled = 0;
    while filled < FRAME_SIZE {
        let Some(left) = remaining(deadline) else {
            return Err(short_read(filled));
        };
        port.set_timeout(left).map_err(|_| TransportError::Io)?;
        match port.read(&mut reply[filled..]) {
            Ok(0) => return Err(short_read(filled)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if e.kind() == io::ErrorKind::TimedOut => return Err(short_read(filled)),
            Err(_) => return Err(TransportError::Io),
        }
    }
    Ok(reply)
}

fn short_read(filled: usize) -> TransportError {
    if filled == 0 {
        TransportError::Timeout
    } else {
        TransportError::ShortRead(filled)
    }
}

// ============================================================================
// Line setting conversion
// ============================================================================

fn data_bits(bits: u8) -> Result<DataBits> {
    Ok(match bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        8 => DataBits::Eight,
        other => anyhow::bail!("unsupported data bits: {}", other),
    })
}

fn stop_bits(bits: u8) -> Result<StopBits> {
    Ok(match bits {
        1 => StopBits::One,
        2 => StopBits::Two,
        other => anyhow::bail!("unsupported stop bits: {}", other),
    })
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

fn parity_letter(parity: Parity) -> char {
    match parity {
        Parity::None => 'N',
        Parity::Odd => 'O',
        Parity::Even => 'E',
    }
}

fn flow_control(flow: FlowControl) -> serialport::FlowControl {
    match flow {
        FlowControl::None => serialport::FlowControl::None,
        FlowControl::Software => serialport::FlowControl::Software,
        FlowControl::Hardware => serialport::FlowControl::Hardware,
    }
}
