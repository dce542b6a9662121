//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the [`Transport`] trait, enabling
//! development and testing on desktop without a controller attached.
//!
//! # Available Mocks
//!
//! | Mock | Purpose |
//! |------|---------|
//! | [`MockTransport`] | Records sent frames, replays queued replies |
//! | [`SimulatedDevice`] | Answers commands like a controller, tracking its state |
//!
//! # Example
//!
//! ```rust
//! use rs_stepper_proxy::{DeviceAddress, MotionController, MotorConfig, Config, Status};
//! use rs_stepper_proxy::hal::SimulatedDevice;
//!
//! let address = DeviceAddress::new(1).unwrap();
//! let config = Config::default().with_motor(MotorConfig::new("/dev/ttyUSB0", address));
//! let mut controller = MotionController::new(&config, |_, cfg| SimulatedDevice::new(cfg.address));
//!
//! assert_eq!(controller.rotate(0, 300).unwrap(), Status::Success);
//! assert_eq!(controller.bias(0), Some(300));
//! ```
//!
//! [`Transport`]: crate::traits::Transport

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::commands::DeviceAddress;
use crate::error::TransportError;
use crate::frame::{self, RawFrame, ResponseFrame};
use crate::traits::Transport;

/// Module byte the simulated controller reports.
const MODULE: u8 = 1;

// ============================================================================
// Scripted Transport
// ============================================================================

/// Mock transport that replays queued replies.
///
/// Records every frame written and the timeout it was written with. Replies
/// come out in FIFO order; an empty queue behaves like a timeout.
///
/// # Example
///
/// ```rust
/// use rs_stepper_proxy::hal::MockTransport;
/// use rs_stepper_proxy::traits::Transport;
/// use rs_stepper_proxy::TransportError;
///
/// let mut transport = MockTransport::new();
/// transport.queue_reply(1, 100, 6, 3200);
/// transport.queue_error(TransportError::ShortRead(4));
///
/// assert!(transport.execute(&[0; 9], 100).is_ok());
/// assert_eq!(transport.execute(&[0; 9], 100), Err(TransportError::ShortRead(4)));
/// assert_eq!(transport.execute(&[0; 9], 100), Err(TransportError::Timeout));
/// assert_eq!(transport.sent.len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Frames that have been written.
    pub sent: Vec<RawFrame>,
    /// Timeout passed with each write.
    pub timeouts: Vec<u32>,
    replies: VecDeque<Result<RawFrame, TransportError>>,
}

impl MockTransport {
    /// Creates a transport with no queued replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a well-formed reply.
    pub fn queue_reply(&mut self, address: u8, status: u8, command_number: u8, value: u32) {
        self.queue_raw(frame::encode(address, MODULE, status, command_number, value));
    }

    /// Queue raw reply bytes, checksum untouched.
    pub fn queue_raw(&mut self, raw: RawFrame) {
        self.replies.push_back(Ok(raw));
    }

    /// Queue a transport failure.
    pub fn queue_error(&mut self, error: TransportError) {
        self.replies.push_back(Err(error));
    }

    /// Number of replies not consumed yet.
    pub fn pending(&self) -> usize {
        self.replies.len()
    }

    /// Command numbers of all frames written, in order.
    pub fn command_numbers(&self) -> Vec<u8> {
        self.sent.iter().map(|f| f[frame::COMMAND_NUMBER]).collect()
    }
}

impl Transport for MockTransport {
    type Error = TransportError;

    fn execute(&mut self, command: &RawFrame, timeout_ms: u32) -> Result<RawFrame, TransportError> {
        self.sent.push(*command);
        self.timeouts.push(timeout_ms);
        self.replies.pop_front().unwrap_or(Err(TransportError::Timeout))
    }
}

// ============================================================================
// Simulated Controller
// ============================================================================

/// A software controller that answers like a PD-1160.
///
/// Moves complete instantly: an absolute or relative move sets the actual
/// position straight away. Rotation only records the velocity.
///
/// Fault injection:
///
/// - [`offline`](Self::offline): every exchange times out
/// - [`corrupt_replies`](Self::corrupt_replies): replies carry a bad checksum
/// - [`reject`](Self::reject): answer a command number with a fixed status
///
/// # Example
///
/// ```rust
/// use rs_stepper_proxy::{DeviceAddress, ProtocolClient, Status};
/// use rs_stepper_proxy::hal::SimulatedDevice;
///
/// let address = DeviceAddress::new(2).unwrap();
/// let mut device = SimulatedDevice::new(address);
/// device.reject(5, 4); // every set-axis-parameter answers InvalidValue
///
/// let mut client = ProtocolClient::new(address, device);
/// assert_eq!(client.set_max_current(128, 1000), Status::InvalidValue);
/// ```
#[derive(Debug)]
pub struct SimulatedDevice {
    address: DeviceAddress,
    /// Actual position counter.
    pub position: i32,
    /// Signed velocity of the last rotate command (right is positive).
    pub velocity: i32,
    /// Microstep resolution enumerant.
    pub resolution: u8,
    /// Max run current.
    pub max_current: u32,
    /// Standby current.
    pub standby_current: u32,
    /// Power-down delay.
    pub power_down_delay: u32,
    /// Interpolation flag.
    pub interpolation: u32,
    /// Pulse divisor.
    pub pulse_divisor: u32,
    /// Ramp divisor.
    pub ramp_divisor: u32,
    /// Max acceleration.
    pub max_acceleration: u32,
    /// Supply voltage in 0.1 V.
    pub voltage: u32,
    /// Temperature in degrees Celsius.
    pub temperature: u32,
    /// Binary firmware version.
    pub firmware: u32,
    /// Stored coordinates for coordinate moves.
    pub coordinates: [i32; 21],
    /// Answer nothing.
    pub offline: bool,
    /// Answer with a bad checksum.
    pub corrupt_replies: bool,
    /// Every frame received, in order.
    pub received: Vec<RawFrame>,
    rejections: Vec<(u8, u8)>,
}

impl SimulatedDevice {
    /// Creates a controller at `address` with power-on defaults.
    pub fn new(address: DeviceAddress) -> Self {
        Self {
            address,
            position: 0,
            velocity: 0,
            resolution: 4,
            max_current: 0,
            standby_current: 0,
            power_down_delay: 0,
            interpolation: 0,
            pulse_divisor: 0,
            ramp_divisor: 0,
            max_acceleration: 0,
            voltage: 240,
            temperature: 35,
            firmware: 0x0490_0106,
            coordinates: [0; 21],
            offline: false,
            corrupt_replies: false,
            received: Vec::new(),
            rejections: Vec::new(),
        }
    }

    /// Start at the given position.
    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    /// Answer every command with `command_number` using `status`.
    pub fn reject(&mut self, command_number: u8, status: u8) {
        self.rejections.push((command_number, status));
    }

    /// Remove all injected rejections.
    pub fn clear_rejections(&mut self) {
        self.rejections.clear();
    }

    /// Command numbers of all frames received, in order.
    pub fn command_numbers(&self) -> Vec<u8> {
        self.received
            .iter()
            .map(|f| f[frame::COMMAND_NUMBER])
            .collect()
    }

    /// Apply a command and return (status, value).
    fn apply(&mut self, command: &RawFrame) -> (u8, u32) {
        const SUCCESS: u8 = 100;
        const WRONG_CHECKSUM: u8 = 1;
        const INVALID_COMMAND: u8 = 2;
        const WRONG_TYPE: u8 = 3;
        const INVALID_VALUE: u8 = 4;

        if !frame::is_valid(command) {
            return (WRONG_CHECKSUM, 0);
        }

        let number = command[frame::COMMAND_NUMBER];
        let kind = command[frame::TYPE];
        let motor = command[frame::MOTOR];
        let value = frame::value_of(command);

        if let Some(&(_, status)) = self.rejections.iter().find(|(n, _)| *n == number) {
            return (status, 0);
        }

        match (number, kind) {
            (1, 0) => {
                self.velocity = value as i32;
                (SUCCESS, 0)
            }
            (2, 0) => {
                self.velocity = -(value as i32);
                (SUCCESS, 0)
            }
            (3, 0) => {
                self.velocity = 0;
                (SUCCESS, 0)
            }
            (4, 0) => {
                self.velocity = 0;
                self.position = value as i32;
                (SUCCESS, 0)
            }
            (4, 1) => {
                self.velocity = 0;
                self.position = self.position.wrapping_add(value as i32);
                (SUCCESS, 0)
            }
            (4, 2) => match self.coordinates.get(motor as usize) {
                Some(&target) => {
                    self.velocity = 0;
                    self.position = target;
                    (SUCCESS, 0)
                }
                None => (INVALID_VALUE, 0),
            },
            (4, _) => (WRONG_TYPE, 0),
            (5, 1) => {
                self.position = value as i32;
                (SUCCESS, 0)
            }
            (6, 1) => (SUCCESS, self.position as u32),
            (5, 0x8c) => {
                if (1..=8).contains(&value) {
                    self.resolution = value as u8;
                    (SUCCESS, 0)
                } else {
                    (INVALID_VALUE, 0)
                }
            }
            (6, 0x8c) => (SUCCESS, self.resolution as u32),
            (5, param) => {
                let slot = match param {
                    5 => &mut self.max_acceleration,
                    6 => &mut self.max_current,
                    7 => &mut self.standby_current,
                    0x99 => &mut self.ramp_divisor,
                    0x9a => &mut self.pulse_divisor,
                    0xa0 => &mut self.interpolation,
                    0xd6 => &mut self.power_down_delay,
                    _ => return (WRONG_TYPE, 0),
                };
                *slot = value;
                (SUCCESS, 0)
            }
            (0x0f, 8) => (SUCCESS, self.voltage),
            (0x0f, 9) => (SUCCESS, self.temperature),
            (0x88, 1) => (SUCCESS, self.firmware),
            (6, _) | (0x0f, _) | (0x88, _) => (WRONG_TYPE, 0),
            _ => (INVALID_COMMAND, 0),
        }
    }
}

impl Transport for SimulatedDevice {
    type Error = TransportError;

    fn execute(&mut self, command: &RawFrame, _timeout_ms: u32) -> Result<RawFrame, TransportError> {
        self.received.push(*command);

        // Controllers on other addresses stay silent, as on a shared bus
        if self.offline || command[frame::ADDRESS] != self.address.get() {
            return Err(TransportError::Timeout);
        }

        let (status, value) = self.apply(command);
        let reply = ResponseFrame {
            address: self.address.get(),
            module: MODULE,
            status,
            command_number: command[frame::COMMAND_NUMBER],
            value,
            valid: !self.corrupt_replies,
        };
        Ok(reply.to_bytes())
    }
}
