//! # rs-stepper-proxy
//!
//! Serial protocol engine and angle-level motion control for PD-1160 style
//! stepper motor controllers.
//!
//! ## Features
//!
//! - **Wire codec**: 9-byte command and reply frames with additive checksum
//! - **Typed commands**: one method per controller command, no panics on bad replies
//! - **Motion control**: velocity and angle requests with direction-consistent wraparound
//! - **Hardware abstraction**: a [`Transport`] trait with mock and serial implementations
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `frame` - Byte layout, checksum, encode and decode
//! - `commands` - Command kinds, device addresses and upstream requests
//! - `protocol` - Per-controller typed command client
//! - `motion` - Motor table, bias tracking and angle math
//! - `hal` - Concrete transports (mock for testing, serial for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_stepper_proxy::{
//!     Config, DeviceAddress, MotionController, MotorCommand, MotorConfig, Status,
//!     hal::SimulatedDevice,
//! };
//!
//! let config = Config::default()
//!     .with_motor(MotorConfig::new("/dev/ttyUSB0", DeviceAddress::new(1).unwrap()));
//! let mut controller = MotionController::new(&config, |_, cfg| SimulatedDevice::new(cfg.address));
//!
//! let outcome = controller
//!     .apply_command(MotorCommand::MoveToAngle { motor: 0, angle: 90 })
//!     .unwrap();
//! assert_eq!(outcome.status, Status::Success);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Command kinds, device addresses and upstream motor requests.
pub mod commands;
/// Local validation and transport error types.
pub mod error;
/// Frame layout, checksum and codec.
pub mod frame;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Angle-level motion control over a table of motors.
pub mod motion;
/// Typed command client for one controller.
pub mod protocol;
/// Controller status codes.
pub mod status;
/// Core traits for hardware abstraction.
pub mod traits;

/// Configuration for motors, serial line and driver settings.
pub mod config;

/// Thread-safe controller wrapper (std only).
#[cfg(feature = "std")]
pub mod shared;

// Re-exports for convenience
pub use commands::{
    build, CommandKind, CommandOutcome, DeviceAddress, MicrostepResolution, MotorCommand,
    MovementType,
};
pub use error::{TransportError, ValidationError};
pub use frame::{RawFrame, ResponseFrame, FRAME_SIZE};
pub use motion::{angle_to_steps, wrapped_target, MotionController};
pub use protocol::{ProtocolClient, Reply};
pub use status::Status;
pub use traits::{Rotation, Transport};

// Config re-exports
pub use config::{
    parse_address_option, parse_direction_option, Config, DriverSettings, MotorConfig,
    SerialConfig, MAX_MOTORS,
};

#[cfg(feature = "std")]
pub use shared::{MotionProvider, SharedMotionController};
