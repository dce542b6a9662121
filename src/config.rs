//! Configuration for the motor table, the serial line and driver settings.
//!
//! Uses `heapless` collections for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_stepper_proxy::config::{Config, MotorConfig, SerialConfig};
//! use rs_stepper_proxy::{DeviceAddress, Rotation};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.steps_per_rotation, 3200);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_motor(MotorConfig::new("/dev/ttyUSB0", DeviceAddress::new(1).unwrap()))
//!     .with_motor(
//!         MotorConfig::new("/dev/ttyUSB1", DeviceAddress::new(2).unwrap())
//!             .with_direction(Rotation::Left),
//!     )
//!     .with_serial(SerialConfig::default().with_baud_rate(19_200));
//! assert_eq!(config.motor_count(), 2);
//! ```

use heapless::String as HString;
use heapless::Vec as HVec;

use crate::commands::{DeviceAddress, MicrostepResolution};
use crate::error::ValidationError;
use crate::traits::Rotation;

/// Maximum number of motors one proxy drives.
pub const MAX_MOTORS: usize = 3;

/// Full steps per revolution of the reference motor (1.8° per step).
pub const FULL_STEPS_PER_ROTATION: u32 = 200;

/// Default command timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u32 = 1000;

/// Maximum length for serial port names.
pub const MAX_PORT_NAME: usize = 128;

/// Type alias for port name strings.
pub type PortName = HString<MAX_PORT_NAME>;

/// Create a PortName from a &str, truncating if too long.
pub fn port_name(s: &str) -> PortName {
    let mut hs = PortName::new();
    let take = s.len().min(MAX_PORT_NAME);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete proxy configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Motors in index order.
    pub motors: HVec<MotorConfig, MAX_MOTORS>,
    /// Serial line settings shared by all motors.
    pub serial: SerialConfig,
    /// Driver settings applied when a motor is initialized.
    pub driver: DriverSettings,
    /// Timeout for every exchange in milliseconds.
    pub timeout_ms: u32,
    /// Steps for one full revolution at the configured resolution.
    pub steps_per_rotation: i32,
}

impl Default for Config {
    fn default() -> Self {
        let driver = DriverSettings::default();
        Self {
            motors: HVec::new(),
            serial: SerialConfig::default(),
            steps_per_rotation: driver.steps_per_rotation(),
            driver,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Append a motor; ignored once [`MAX_MOTORS`] are configured.
    pub fn with_motor(mut self, motor: MotorConfig) -> Self {
        let _ = self.motors.push(motor);
        self
    }

    /// Append a motor, failing when the table is full.
    pub fn push_motor(&mut self, motor: MotorConfig) -> Result<(), MotorConfig> {
        self.motors.push(motor)
    }

    /// Set serial configuration
    pub fn with_serial(mut self, serial: SerialConfig) -> Self {
        self.serial = serial;
        self
    }

    /// Set driver settings.
    ///
    /// Also recomputes [`steps_per_rotation`](Self::steps_per_rotation) from
    /// the new microstep resolution, unless it was set with
    /// [`with_steps_per_rotation`](Self::with_steps_per_rotation) to a value
    /// the previous driver settings would not give. Builder order does not
    /// matter for such an override.
    pub fn with_driver(mut self, driver: DriverSettings) -> Self {
        if self.steps_per_rotation == self.driver.steps_per_rotation() {
            self.steps_per_rotation = driver.steps_per_rotation();
        }
        self.driver = driver;
        self
    }

    /// Set the exchange timeout
    pub fn with_timeout_ms(mut self, ms: u32) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Override steps per revolution
    pub fn with_steps_per_rotation(mut self, steps: i32) -> Self {
        self.steps_per_rotation = steps;
        self
    }

    /// Number of configured motors
    pub fn motor_count(&self) -> usize {
        self.motors.len()
    }

    /// Motor config by index
    pub fn motor(&self, index: usize) -> Option<&MotorConfig> {
        self.motors.get(index)
    }

    /// Mutable motor config by index
    pub fn motor_mut(&mut self, index: usize) -> Option<&mut MotorConfig> {
        self.motors.get_mut(index)
    }
}

// ============================================================================
// Motor Config
// ============================================================================

/// One motor: where it is attached and how it is calibrated.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorConfig {
    /// Serial port name (e.g. `/dev/ttyUSB0`).
    pub port: PortName,
    /// Controller address on that port.
    pub address: DeviceAddress,
    /// Which command a positive velocity maps to.
    pub direction: Rotation,
}

impl MotorConfig {
    /// Motor on `port` at `address`, rotating right.
    pub fn new(port: &str, address: DeviceAddress) -> Self {
        Self {
            port: port_name(port),
            address,
            direction: Rotation::Right,
        }
    }

    /// Set the port
    pub fn with_port(mut self, port: &str) -> Self {
        self.port = port_name(port);
        self
    }

    /// Set the address
    pub fn with_address(mut self, address: DeviceAddress) -> Self {
        self.address = address;
        self
    }

    /// Set the configured direction
    pub fn with_direction(mut self, direction: Rotation) -> Self {
        self.direction = direction;
        self
    }
}

// ============================================================================
// Serial Config
// ============================================================================

/// Parity setting of the serial line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Parity {
    /// No parity bit.
    #[default]
    None,
    /// Odd parity.
    Odd,
    /// Even parity.
    Even,
}

/// Flow control setting of the serial line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FlowControl {
    /// No flow control.
    #[default]
    None,
    /// XON/XOFF.
    Software,
    /// RTS/CTS.
    Hardware,
}

/// Serial line settings.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerialConfig {
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5 to 8)
    pub data_bits: u8,
    /// Parity
    pub parity: Parity,
    /// Stop bits (1 or 2)
    pub stop_bits: u8,
    /// Flow control
    pub flow_control: FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            flow_control: FlowControl::None,
        }
    }
}

impl SerialConfig {
    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the data bits
    pub fn with_data_bits(mut self, bits: u8) -> Self {
        self.data_bits = bits;
        self
    }

    /// Set the parity
    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Set the stop bits
    pub fn with_stop_bits(mut self, bits: u8) -> Self {
        self.stop_bits = bits;
        self
    }

    /// Set the flow control
    pub fn with_flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }
}

// ============================================================================
// Driver Settings
// ============================================================================

/// Axis parameters written to a controller during motor initialization.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriverSettings {
    /// Microstep resolution.
    pub microstep_resolution: MicrostepResolution,
    /// Step interpolation. Only written when enabled.
    pub interpolation: bool,
    /// Max run current (0 to 255).
    pub max_current: u32,
    /// Power-down delay in 10 ms units.
    pub power_down_delay: u32,
    /// Pulse divisor.
    pub pulse_divisor: u32,
    /// Ramp divisor.
    pub ramp_divisor: u32,
    /// Max acceleration.
    pub max_acceleration: u32,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            microstep_resolution: MicrostepResolution::Micro16,
            interpolation: true,
            max_current: 128,
            power_down_delay: 20,
            pulse_divisor: 6,
            ramp_divisor: 8,
            max_acceleration: 200,
        }
    }
}

impl DriverSettings {
    /// Steps for one revolution at this microstep resolution.
    ///
    /// ```rust
    /// use rs_stepper_proxy::config::DriverSettings;
    ///
    /// assert_eq!(DriverSettings::default().steps_per_rotation(), 3200);
    /// ```
    pub fn steps_per_rotation(&self) -> i32 {
        (FULL_STEPS_PER_ROTATION * self.microstep_resolution.microsteps()) as i32
    }

    /// Set the microstep resolution
    pub fn with_microstep_resolution(mut self, resolution: MicrostepResolution) -> Self {
        self.microstep_resolution = resolution;
        self
    }

    /// Enable or disable interpolation
    pub fn with_interpolation(mut self, enabled: bool) -> Self {
        self.interpolation = enabled;
        self
    }

    /// Set the max run current
    pub fn with_max_current(mut self, current: u32) -> Self {
        self.max_current = current;
        self
    }

    /// Set the power-down delay
    pub fn with_power_down_delay(mut self, delay: u32) -> Self {
        self.power_down_delay = delay;
        self
    }

    /// Set the pulse divisor
    pub fn with_pulse_divisor(mut self, divisor: u32) -> Self {
        self.pulse_divisor = divisor;
        self
    }

    /// Set the ramp divisor
    pub fn with_ramp_divisor(mut self, divisor: u32) -> Self {
        self.ramp_divisor = divisor;
        self
    }

    /// Set the max acceleration
    pub fn with_max_acceleration(mut self, acceleration: u32) -> Self {
        self.max_acceleration = acceleration;
        self
    }
}

// ============================================================================
// Option Parsing
// ============================================================================

/// Error from parsing an `index:value` option.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionError {
    /// Not of the form `index:value`.
    Malformed,
    /// Index not below [`MAX_MOTORS`].
    MotorIndex(usize),
    /// Address outside `[1, 255]`.
    Address(ValidationError),
    /// Direction other than `r` or `l`.
    Direction,
}

impl core::fmt::Display for OptionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed => write!(f, "expected <motor-index>:<value>"),
            Self::MotorIndex(i) => {
                write!(f, "motor index too high: {} (max {})", i, MAX_MOTORS - 1)
            }
            Self::Address(e) => write!(f, "{}", e),
            Self::Direction => write!(f, "invalid direction (must be r or l)"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OptionError {}

fn split_option(option: &str) -> Result<(usize, &str), OptionError> {
    let (index, value) = option.split_once(':').ok_or(OptionError::Malformed)?;
    let index: usize = index.trim().parse().map_err(|_| OptionError::Malformed)?;
    if index >= MAX_MOTORS {
        return Err(OptionError::MotorIndex(index));
    }
    Ok((index, value))
}

/// Parse `<motor-index>:<address>`.
///
/// ```rust
/// use rs_stepper_proxy::config::parse_address_option;
///
/// let (index, address) = parse_address_option("1:42").unwrap();
/// assert_eq!(index, 1);
/// assert_eq!(address.get(), 42);
/// assert!(parse_address_option("1:0").is_err());
/// ```
pub fn parse_address_option(option: &str) -> Result<(usize, DeviceAddress), OptionError> {
    let (index, value) = split_option(option)?;
    let raw: i32 = value.trim().parse().map_err(|_| OptionError::Malformed)?;
    let address = DeviceAddress::new(raw).map_err(OptionError::Address)?;
    Ok((index, address))
}

/// Parse `<motor-index>:r` or `<motor-index>:l`.
pub fn parse_direction_option(option: &str) -> Result<(usize, Rotation), OptionError> {
    let (index, value) = split_option(option)?;
    let direction = Rotation::from_text(value).ok_or(OptionError::Direction)?;
    Ok((index, direction))
}

// ============================================================================
// Tests
// ============================================================================
