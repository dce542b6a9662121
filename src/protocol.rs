//! Typed command methods on top of a [`Transport`].
//!
//! [`ProtocolClient`] owns one controller's [`DeviceAddress`] and its
//! transport. Every method builds a fresh frame, performs exactly one
//! exchange, validates the reply checksum and maps the status byte.
//!
//! Failures are ordinary values, never panics:
//!
//! - transport failure or bad reply checksum: [`Status::Error`]
//! - device rejection: the device's [`Status`], verbatim
//!
//! # Example
//!
//! ```rust
//! use rs_stepper_proxy::{DeviceAddress, ProtocolClient, Status};
//! use rs_stepper_proxy::hal::SimulatedDevice;
//!
//! let address = DeviceAddress::new(1).unwrap();
//! let mut client = ProtocolClient::new(address, SimulatedDevice::new(address));
//!
//! assert_eq!(client.set_actual_position(1200, 1000), Status::Success);
//! let reply = client.get_actual_position(1000);
//! assert_eq!(reply.status, Status::Success);
//! assert_eq!(reply.value, Some(1200));
//! ```

use log::{trace, warn};

use crate::commands::{build, CommandKind, DeviceAddress, MicrostepResolution, MovementType};
use crate::error::ValidationError;
use crate::frame::ResponseFrame;
use crate::status::Status;
use crate::traits::Transport;

/// Status of an exchange plus the decoded value of a query.
///
/// `value` is only present when the status is [`Status::Success`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reply<V> {
    /// Outcome of the exchange.
    pub status: Status,
    /// Decoded value for queries.
    pub value: Option<V>,
}

impl<V> Reply<V> {
    /// A reply that carries no usable data.
    pub const fn error() -> Self {
        Self {
            status: Status::Error,
            value: None,
        }
    }

    /// True if the exchange succeeded.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Converts the value, keeping the status.
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Reply<U> {
        Reply {
            status: self.status,
            value: self.value.map(f),
        }
    }
}

/// Command client for a single controller.
///
/// # Type Parameter
///
/// - `T`: the link to the controller ([`Transport`] trait)
///
/// # Thread Safety
///
/// Every method takes `&mut self`, so at most one exchange is in flight.
/// Share a client between threads only behind a lock.
#[derive(Debug)]
pub struct ProtocolClient<T: Transport> {
    address: DeviceAddress,
    transport: T,
}

impl<T: Transport> ProtocolClient<T> {
    /// Create a client for the controller at `address`.
    pub fn new(address: DeviceAddress, transport: T) -> Self {
        Self { address, transport }
    }

    /// Address the client talks to.
    #[inline]
    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport, closing the client.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Perform one exchange for `kind`.
    ///
    /// The raw reply value is returned for queries that succeeded.
    pub fn execute(&mut self, kind: &CommandKind, timeout_ms: u32) -> Reply<u32> {
        let command = build(kind, self.address);
        trace!(
            "tx {} to address {}: {:02x?}",
            kind.name(),
            self.address.get(),
            command
        );

        let raw = match self.transport.execute(&command, timeout_ms) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "{} to address {} failed: {:?}",
                    kind.name(),
                    self.address.get(),
                    e
                );
                return Reply::error();
            }
        };
        trace!("rx from address {}: {:02x?}", self.address.get(), raw);

        let response = ResponseFrame::decode(&raw);
        if !response.valid {
            warn!(
                "{} to address {}: reply checksum mismatch",
                kind.name(),
                self.address.get()
            );
            return Reply::error();
        }

        let status = Status::from_code(response.status);
        let value = if kind.is_query() && status.is_success() {
            Some(response.value)
        } else {
            None
        };
        Reply { status, value }
    }

    fn command(&mut self, kind: CommandKind, timeout_ms: u32) -> Status {
        self.execute(&kind, timeout_ms).status
    }

    // ------------------------------------------------------------------------
    // Motion
    // ------------------------------------------------------------------------

    /// Stop the motor.
    pub fn stop(&mut self, timeout_ms: u32) -> Status {
        self.command(CommandKind::Stop, timeout_ms)
    }

    /// Rotate right at `velocity`.
    pub fn rotate_right(&mut self, velocity: u32, timeout_ms: u32) -> Status {
        self.command(CommandKind::RotateRight(velocity), timeout_ms)
    }

    /// Rotate left at `velocity`.
    pub fn rotate_left(&mut self, velocity: u32, timeout_ms: u32) -> Status {
        self.command(CommandKind::RotateLeft(velocity), timeout_ms)
    }

    /// Move to `position`.
    ///
    /// `coordinate` is only transmitted in [`MovementType::Coordinate`] mode.
    pub fn move_to_position(
        &mut self,
        position: i32,
        movement: MovementType,
        coordinate: u8,
        timeout_ms: u32,
    ) -> Status {
        self.command(
            CommandKind::MoveToPosition {
                position,
                movement,
                coordinate,
            },
            timeout_ms,
        )
    }

    /// Move to `position` with a raw movement type code.
    ///
    /// Codes other than 0, 1 and 2 are rejected without touching the
    /// transport.
    pub fn move_to_position_raw(
        &mut self,
        position: i32,
        movement: u8,
        coordinate: u8,
        timeout_ms: u32,
    ) -> Result<Status, ValidationError> {
        let movement = MovementType::try_from(movement)?;
        Ok(self.move_to_position(position, movement, coordinate, timeout_ms))
    }

    // ------------------------------------------------------------------------
    // Axis parameters
    // ------------------------------------------------------------------------

    /// Read the actual position counter.
    pub fn get_actual_position(&mut self, timeout_ms: u32) -> Reply<i32> {
        self.execute(&CommandKind::GetActualPosition, timeout_ms)
            .map(|v| v as i32)
    }

    /// Overwrite the actual position counter.
    pub fn set_actual_position(&mut self, position: i32, timeout_ms: u32) -> Status {
        self.command(CommandKind::SetActualPosition(position), timeout_ms)
    }

    /// Read the microstep resolution.
    ///
    /// A reply outside the known enumerants is reported as [`Status::Error`].
    pub fn get_microstep_resolution(&mut self, timeout_ms: u32) -> Reply<MicrostepResolution> {
        let reply = self.execute(&CommandKind::GetMicrostepResolution, timeout_ms);
        match reply.value {
            None => Reply {
                status: reply.status,
                value: None,
            },
            Some(raw) => match MicrostepResolution::try_from(raw as i32) {
                Ok(resolution) => Reply {
                    status: reply.status,
                    value: Some(resolution),
                },
                Err(e) => {
                    warn!("address {}: {}", self.address.get(), e);
                    Reply::error()
                }
            },
        }
    }

    /// Set the microstep resolution.
    pub fn set_microstep_resolution(
        &mut self,
        resolution: MicrostepResolution,
        timeout_ms: u32,
    ) -> Status {
        self.command(CommandKind::SetMicrostepResolution(resolution), timeout_ms)
    }

    /// Set the maximum run current.
    pub fn set_max_current(&mut self, value: u32, timeout_ms: u32) -> Status {
        self.command(CommandKind::SetMaxCurrent(value), timeout_ms)
    }

    /// Set the standby current.
    pub fn set_standby_current(&mut self, value: u32, timeout_ms: u32) -> Status {
        self.command(CommandKind::SetStandbyCurrent(value), timeout_ms)
    }

    /// Set the power-down delay (10 ms units).
    pub fn set_power_down_delay(&mut self, value: u32, timeout_ms: u32) -> Status {
        self.command(CommandKind::SetPowerDownDelay(value), timeout_ms)
    }

    /// Enable (1) or disable (0) step interpolation.
    pub fn set_interpolation(&mut self, value: u32, timeout_ms: u32) -> Status {
        self.command(CommandKind::SetInterpolation(value), timeout_ms)
    }

    /// Set the pulse divisor.
    pub fn set_pulse_divisor(&mut self, value: u32, timeout_ms: u32) -> Status {
        self.command(CommandKind::SetPulseDivisor(value), timeout_ms)
    }

    /// Set the ramp divisor.
    pub fn set_ramp_divisor(&mut self, value: u32, timeout_ms: u32) -> Status {
        self.command(CommandKind::SetRampDivisor(value), timeout_ms)
    }

    /// Set the maximum acceleration.
    pub fn set_max_acceleration(&mut self, value: u32, timeout_ms: u32) -> Status {
        self.command(CommandKind::SetMaxAcceleration(value), timeout_ms)
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    /// Read the supply voltage in 0.1 V units.
    pub fn get_gio_voltage(&mut self, timeout_ms: u32) -> Reply<u32> {
        self.execute(&CommandKind::GetGioVoltage, timeout_ms)
    }

    /// Read the driver temperature in degrees Celsius.
    pub fn get_gio_temperature(&mut self, timeout_ms: u32) -> Reply<u32> {
        self.execute(&CommandKind::GetGioTemperature, timeout_ms)
    }

    /// Read the binary firmware version.
    pub fn get_firmware_version(&mut self, timeout_ms: u32) -> Reply<u32> {
        self.execute(&CommandKind::GetFirmwareVersion, timeout_ms)
    }
}
