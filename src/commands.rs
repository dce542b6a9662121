//! Command kinds, their wire templates, and upstream motor requests.
//!
//! Two layers of commands live here:
//!
//! - [`CommandKind`]: one variant per controller operation, carrying its
//!   typed payload. [`build`] turns a kind plus a [`DeviceAddress`] into a
//!   fresh 9-byte frame. Templates are never shared or mutated.
//! - [`MotorCommand`]: the requests an upstream dispatcher hands to the
//!   [`MotionController`](crate::MotionController), addressed by motor index.
//!
//! # Example
//!
//! ```rust
//! use rs_stepper_proxy::{build, CommandKind, DeviceAddress, MovementType};
//!
//! let address = DeviceAddress::new(1).unwrap();
//! let frame = build(
//!     &CommandKind::MoveToPosition {
//!         position: 90_000,
//!         movement: MovementType::Absolute,
//!         coordinate: 0,
//!     },
//!     address,
//! );
//! assert_eq!(frame, [1, 4, 0, 0, 0x00, 0x01, 0x5f, 0x90, 0xf5]);
//! ```

use crate::error::ValidationError;
use crate::frame::{self, RawFrame};
use crate::status::Status;

// ============================================================================
// Device Address
// ============================================================================

/// Serial-protocol address of one controller, always in `[1, 255]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i32", into = "u8"))]
pub struct DeviceAddress(u8);

impl DeviceAddress {
    /// Address used when none is configured.
    pub const DEFAULT: DeviceAddress = DeviceAddress(1);

    /// Validates an address.
    ///
    /// ```rust
    /// use rs_stepper_proxy::DeviceAddress;
    ///
    /// assert!(DeviceAddress::new(1).is_ok());
    /// assert!(DeviceAddress::new(255).is_ok());
    /// assert!(DeviceAddress::new(0).is_err());
    /// assert!(DeviceAddress::new(256).is_err());
    /// ```
    pub fn new(address: i32) -> Result<Self, ValidationError> {
        match u8::try_from(address) {
            Ok(a) if a >= 1 => Ok(DeviceAddress(a)),
            _ => Err(ValidationError::DeviceAddress(address as i64)),
        }
    }

    /// Raw address byte.
    #[inline]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl Default for DeviceAddress {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i32> for DeviceAddress {
    type Error = ValidationError;

    fn try_from(address: i32) -> Result<Self, Self::Error> {
        Self::new(address)
    }
}

impl From<DeviceAddress> for u8 {
    fn from(address: DeviceAddress) -> u8 {
        address.0
    }
}

// ============================================================================
// Payload Types
// ============================================================================

/// Interpretation of the position passed to move-to-position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum MovementType {
    /// Position is an absolute step count.
    Absolute = 0,
    /// Position is relative to the current position.
    Relative = 1,
    /// Move to a stored coordinate.
    Coordinate = 2,
}

impl TryFrom<u8> for MovementType {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MovementType::Absolute),
            1 => Ok(MovementType::Relative),
            2 => Ok(MovementType::Coordinate),
            other => Err(ValidationError::MovementType(other)),
        }
    }
}

/// Microstep resolution enumerant as understood by the controller.
///
/// The enumerant `n` selects `2^n` microsteps per full step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i32", into = "u8"))]
#[repr(u8)]
pub enum MicrostepResolution {
    /// 2 microsteps.
    Micro2 = 1,
    /// 4 microsteps.
    Micro4 = 2,
    /// 8 microsteps.
    Micro8 = 3,
    /// 16 microsteps.
    Micro16 = 4,
    /// 32 microsteps.
    Micro32 = 5,
    /// 64 microsteps.
    Micro64 = 6,
    /// 128 microsteps.
    Micro128 = 7,
    /// 256 microsteps.
    Micro256 = 8,
}

impl MicrostepResolution {
    /// Microsteps per full step.
    #[inline]
    pub const fn microsteps(&self) -> u32 {
        1 << (*self as u8)
    }
}

impl TryFrom<i32> for MicrostepResolution {
    type Error = ValidationError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Ok(match raw {
            1 => Self::Micro2,
            2 => Self::Micro4,
            3 => Self::Micro8,
            4 => Self::Micro16,
            5 => Self::Micro32,
            6 => Self::Micro64,
            7 => Self::Micro128,
            8 => Self::Micro256,
            other => return Err(ValidationError::MicrostepResolution(other as i64)),
        })
    }
}

impl From<MicrostepResolution> for u8 {
    fn from(resolution: MicrostepResolution) -> u8 {
        resolution as u8
    }
}

// ============================================================================
// Command Kinds
// ============================================================================

/// Every operation the controller accepts, with its typed payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// Rotate right with the given velocity.
    RotateRight(u32),
    /// Rotate left with the given velocity.
    RotateLeft(u32),
    /// Stop the motor.
    Stop,
    /// Move to a position.
    MoveToPosition {
        /// Target or offset in steps.
        position: i32,
        /// How `position` is interpreted.
        movement: MovementType,
        /// Coordinate slot; only sent in [`MovementType::Coordinate`] mode.
        coordinate: u8,
    },
    /// Overwrite the actual position counter.
    SetActualPosition(i32),
    /// Read the actual position counter.
    GetActualPosition,
    /// Set the maximum acceleration.
    SetMaxAcceleration(u32),
    /// Set the maximum (run) current.
    SetMaxCurrent(u32),
    /// Set the standby current.
    SetStandbyCurrent(u32),
    /// Set the microstep resolution.
    SetMicrostepResolution(MicrostepResolution),
    /// Read the microstep resolution.
    GetMicrostepResolution,
    /// Set the ramp divisor.
    SetRampDivisor(u32),
    /// Set the pulse divisor.
    SetPulseDivisor(u32),
    /// Enable (1) or disable (0) step interpolation.
    SetInterpolation(u32),
    /// Set the power-down delay in 10 ms units.
    SetPowerDownDelay(u32),
    /// Read the supply voltage in 0.1 V units.
    GetGioVoltage,
    /// Read the driver temperature in degrees Celsius.
    GetGioTemperature,
    /// Read the binary firmware version.
    GetFirmwareVersion,
}

/// Command number, type and motor byte of a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Template {
    /// Command number (byte 1).
    pub command_number: u8,
    /// Type / sub-selector (byte 2).
    pub kind: u8,
    /// Motor or coordinate (byte 3).
    pub motor: u8,
}

const fn template(command_number: u8, kind: u8, motor: u8) -> Template {
    Template {
        command_number,
        kind,
        motor,
    }
}

impl CommandKind {
    /// Fixed template bytes for this kind.
    pub const fn template(&self) -> Template {
        match self {
            Self::RotateRight(_) => template(1, 0, 0),
            Self::RotateLeft(_) => template(2, 0, 0),
            Self::Stop => template(3, 0, 0),
            Self::MoveToPosition {
                movement,
                coordinate,
                ..
            } => match movement {
                MovementType::Coordinate => template(4, *movement as u8, *coordinate),
                _ => template(4, *movement as u8, 0),
            },
            Self::SetActualPosition(_) => template(5, 1, 0),
            Self::GetActualPosition => template(6, 1, 0),
            Self::SetMaxAcceleration(_) => template(5, 5, 0),
            Self::SetMaxCurrent(_) => template(5, 6, 0),
            Self::SetStandbyCurrent(_) => template(5, 7, 0),
            Self::SetMicrostepResolution(_) => template(5, 0x8c, 0),
            Self::GetMicrostepResolution => template(6, 0x8c, 0),
            Self::SetRampDivisor(_) => template(5, 0x99, 0),
            Self::SetPulseDivisor(_) => template(5, 0x9a, 0),
            Self::SetInterpolation(_) => template(5, 0xa0, 0),
            Self::SetPowerDownDelay(_) => template(5, 0xd6, 0),
            Self::GetGioVoltage => template(0x0f, 8, 1),
            Self::GetGioTemperature => template(0x0f, 9, 1),
            Self::GetFirmwareVersion => template(0x88, 1, 0),
        }
    }

    /// Value slot contents.
    pub const fn value(&self) -> u32 {
        match self {
            Self::RotateRight(v)
            | Self::RotateLeft(v)
            | Self::SetMaxAcceleration(v)
            | Self::SetMaxCurrent(v)
            | Self::SetStandbyCurrent(v)
            | Self::SetRampDivisor(v)
            | Self::SetPulseDivisor(v)
            | Self::SetInterpolation(v)
            | Self::SetPowerDownDelay(v) => *v,
            Self::MoveToPosition { position, .. } => *position as u32,
            Self::SetActualPosition(p) => *p as u32,
            Self::SetMicrostepResolution(r) => *r as u32,
            Self::Stop
            | Self::GetActualPosition
            | Self::GetMicrostepResolution
            | Self::GetGioVoltage
            | Self::GetGioTemperature
            | Self::GetFirmwareVersion => 0,
        }
    }

    /// Whether the reply value carries data for this kind.
    pub const fn is_query(&self) -> bool {
        matches!(
            self,
            Self::GetActualPosition
                | Self::GetMicrostepResolution
                | Self::GetGioVoltage
                | Self::GetGioTemperature
                | Self::GetFirmwareVersion
        )
    }

    /// Name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RotateRight(_) => "rotate_right",
            Self::RotateLeft(_) => "rotate_left",
            Self::Stop => "stop",
            Self::MoveToPosition { .. } => "move_to_position",
            Self::SetActualPosition(_) => "set_actual_position",
            Self::GetActualPosition => "get_actual_position",
            Self::SetMaxAcceleration(_) => "set_max_acceleration",
            Self::SetMaxCurrent(_) => "set_max_current",
            Self::SetStandbyCurrent(_) => "set_standby_current",
            Self::SetMicrostepResolution(_) => "set_microstep_resolution",
            Self::GetMicrostepResolution => "get_microstep_resolution",
            Self::SetRampDivisor(_) => "set_ramp_divisor",
            Self::SetPulseDivisor(_) => "set_pulse_divisor",
            Self::SetInterpolation(_) => "set_interpolation",
            Self::SetPowerDownDelay(_) => "set_power_down_delay",
            Self::GetGioVoltage => "get_gio_voltage",
            Self::GetGioTemperature => "get_gio_temperature",
            Self::GetFirmwareVersion => "get_firmware_version",
        }
    }
}

/// Builds a fresh command frame for `kind` addressed to `address`.
pub fn build(kind: &CommandKind, address: DeviceAddress) -> RawFrame {
    let t = kind.template();
    frame::encode(
        address.get(),
        t.command_number,
        t.kind,
        t.motor,
        kind.value(),
    )
}

// ============================================================================
// Upstream Motor Requests
// ============================================================================

/// A request from the upstream dispatcher, addressed by motor index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "command", rename_all = "snake_case"))]
pub enum MotorCommand {
    /// Re-apply driver settings and reset the bias.
    Init {
        /// Motor index.
        motor: usize,
    },
    /// Stop the motor.
    Stop {
        /// Motor index.
        motor: usize,
    },
    /// Stop and zero the position counter.
    ResetPosition {
        /// Motor index.
        motor: usize,
    },
    /// Relative move by an angle in degrees.
    MoveByAngle {
        /// Motor index.
        motor: usize,
        /// Degrees, `[-360, 360]`.
        angle: i32,
    },
    /// Absolute move to an angle in degrees.
    MoveToAngle {
        /// Motor index.
        motor: usize,
        /// Degrees, `[-360, 360]`.
        angle: i32,
    },
    /// Continuous rotation.
    Rotate {
        /// Motor index.
        motor: usize,
        /// Signed velocity, `[-2049, 2049]`.
        velocity: i32,
    },
    /// Change the microstep resolution.
    SetMicrostepResolution {
        /// Motor index.
        motor: usize,
        /// Enumerant, `[1, 8]`.
        resolution: i32,
    },
    /// Read the driver temperature.
    Temperature {
        /// Motor index.
        motor: usize,
    },
    /// Read the supply voltage.
    Voltage {
        /// Motor index.
        motor: usize,
    },
}

impl MotorCommand {
    /// Motor index the request targets.
    pub const fn motor(&self) -> usize {
        match self {
            Self::Init { motor }
            | Self::Stop { motor }
            | Self::ResetPosition { motor }
            | Self::MoveByAngle { motor, .. }
            | Self::MoveToAngle { motor, .. }
            | Self::Rotate { motor, .. }
            | Self::SetMicrostepResolution { motor, .. }
            | Self::Temperature { motor }
            | Self::Voltage { motor } => *motor,
        }
    }

    /// Name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Stop { .. } => "stop",
            Self::ResetPosition { .. } => "reset-position",
            Self::MoveByAngle { .. } => "move-by-angle",
            Self::MoveToAngle { .. } => "move-to-angle",
            Self::Rotate { .. } => "rotate",
            Self::SetMicrostepResolution { .. } => "msr",
            Self::Temperature { .. } => "temp",
            Self::Voltage { .. } => "volt",
        }
    }
}

/// Result of applying a [`MotorCommand`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandOutcome {
    /// Status of the last exchange performed.
    pub status: Status,
    /// Reading returned by temperature and voltage requests.
    pub value: Option<u32>,
}

impl CommandOutcome {
    /// Outcome without a reading.
    pub const fn status(status: Status) -> Self {
        Self {
            status,
            value: None,
        }
    }
}
