//! Angle-level motion control over a table of motors.
//!
//! [`MotionController`] is the central component: it owns one
//! [`ProtocolClient`] per configured motor and translates angle and velocity
//! requests into controller commands.
//!
//! # Overview
//!
//! The motion controller:
//! - Validates motor index, velocity and angle before any transport call
//! - Remembers the last commanded direction of travel (the *bias*)
//! - Uses the bias to pick which way an absolute move wraps around
//! - Applies the configured driver settings on init
//!
//! # Example
//!
//! ```rust
//! use rs_stepper_proxy::{Config, DeviceAddress, MotionController, MotorConfig, Status};
//! use rs_stepper_proxy::hal::SimulatedDevice;
//!
//! let address = DeviceAddress::new(1).unwrap();
//! let config = Config::default().with_motor(MotorConfig::new("/dev/ttyUSB0", address));
//! let mut controller = MotionController::new(&config, |_, cfg| {
//!     SimulatedDevice::new(cfg.address).with_position(100)
//! });
//!
//! // Stopped motors wrap forward: 0° from step 100 is step 3200, not step 0
//! assert_eq!(controller.move_to_angle(0, 0).unwrap(), Status::Success);
//! assert_eq!(controller.client(0).unwrap().transport().position, 3200);
//! ```
//!
//! # Wraparound Policy
//!
//! Absolute moves keep the direction of travel instead of taking the shortest
//! path. With a non-negative bias the target is the next position at or after
//! the current one that corresponds to the requested angle; with a negative
//! bias it is the previous one. See [`wrapped_target`].

use heapless::Vec as HVec;
use log::{debug, warn};

use crate::commands::{
    CommandKind, CommandOutcome, MicrostepResolution, MotorCommand, MovementType,
};
use crate::config::{Config, DriverSettings, MotorConfig, MAX_MOTORS};
use crate::error::ValidationError;
use crate::protocol::{ProtocolClient, Reply};
use crate::status::Status;
use crate::traits::{Rotation, Transport};

/// Largest accepted velocity magnitude.
pub const MAX_VELOCITY: i32 = 2049;

/// Largest accepted angle magnitude in degrees.
pub const MAX_ANGLE: i32 = 360;

/// Convert degrees to steps, truncating toward zero.
///
/// Results outside the `i32` range saturate.
///
/// ```rust
/// use rs_stepper_proxy::motion::angle_to_steps;
///
/// assert_eq!(angle_to_steps(90, 3200), 800);
/// assert_eq!(angle_to_steps(1, 3200), 8);
/// assert_eq!(angle_to_steps(-1, 3200), -8);
/// ```
pub fn angle_to_steps(angle: i32, steps_per_rotation: i32) -> i32 {
    let steps = i64::from(angle) * i64::from(steps_per_rotation) / 360;
    steps.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Absolute step target for moving to `angle` from `current`.
///
/// A negative angle is measured as `angle + 360` and the result is then
/// shifted one revolution against the bias direction. Step arithmetic uses
/// truncating division and remainder throughout.
///
/// `steps_per_rotation` must be positive; otherwise `current` is returned.
/// Returns `None` when the target does not fit the position counter.
///
/// ```rust
/// use rs_stepper_proxy::motion::wrapped_target;
///
/// assert_eq!(wrapped_target(100, 0, 0, 3200), Some(3200));
/// assert_eq!(wrapped_target(100, 0, -50, 3200), Some(0));
/// assert_eq!(wrapped_target(100, 90, -50, 3200), Some(-2400));
/// assert_eq!(wrapped_target(i32::MAX - 10, 0, 1, 3200), None);
/// ```
pub fn wrapped_target(
    current: i32,
    angle: i32,
    bias: i32,
    steps_per_rotation: i32,
) -> Option<i32> {
    if steps_per_rotation <= 0 {
        return Some(current);
    }

    let (angle, inverted) = if angle < 0 {
        (angle + 360, true)
    } else {
        (angle, false)
    };
    let spr = i64::from(steps_per_rotation);
    let desired = i64::from(angle_to_steps(angle, steps_per_rotation));
    let current = i64::from(current);
    let within = current % spr;
    let base = current - within;

    let target = if bias >= 0 {
        let target = if within > desired {
            base + spr + desired
        } else {
            base + desired
        };
        if inverted {
            target - spr
        } else {
            target
        }
    } else {
        let target = if within < desired {
            base - spr + desired
        } else {
            base + desired
        };
        if inverted {
            target + spr
        } else {
            target
        }
    };
    i32::try_from(target).ok()
}

/// Per-motor state.
#[derive(Debug)]
struct MotorSlot<T: Transport> {
    client: ProtocolClient<T>,
    direction: Rotation,
    bias: i32,
}

/// Motion controller for up to [`MAX_MOTORS`] motors.
///
/// # Type Parameter
///
/// - `T`: the link to each controller ([`Transport`] trait)
///
/// # Errors
///
/// Methods return `Err` only for arguments rejected locally. Everything that
/// happened on the wire is reported as a [`Status`], including
/// [`Status::Error`] for transport failures.
///
/// # Thread Safety
///
/// The controller itself is not thread-safe. Share it between threads with
/// `SharedMotionController` (requires the `std` feature).
#[derive(Debug)]
pub struct MotionController<T: Transport> {
    motors: HVec<MotorSlot<T>, MAX_MOTORS>,
    driver: DriverSettings,
    timeout_ms: u32,
    steps_per_rotation: i32,
}

impl<T: Transport> MotionController<T> {
    /// Create a controller, connecting each configured motor with `connect`.
    ///
    /// Every motor starts stopped with a bias of 0.
    pub fn new(config: &Config, mut connect: impl FnMut(usize, &MotorConfig) -> T) -> Self {
        let result: Result<Self, core::convert::Infallible> =
            Self::try_new(config, |index, motor| Ok(connect(index, motor)));
        match result {
            Ok(controller) => controller,
            Err(never) => match never {},
        }
    }

    /// Create a controller with a fallible `connect`.
    ///
    /// Stops at the first motor that fails to connect.
    pub fn try_new<E>(
        config: &Config,
        mut connect: impl FnMut(usize, &MotorConfig) -> Result<T, E>,
    ) -> Result<Self, E> {
        let mut motors = HVec::new();
        for (index, motor) in config.motors.iter().enumerate() {
            let transport = connect(index, motor)?;
            // Both tables share the MAX_MOTORS capacity.
            let _ = motors.push(MotorSlot {
                client: ProtocolClient::new(motor.address, transport),
                direction: motor.direction,
                bias: 0,
            });
        }
        Ok(Self {
            motors,
            driver: config.driver.clone(),
            timeout_ms: config.timeout_ms,
            steps_per_rotation: config.steps_per_rotation,
        })
    }

    /// Number of motors
    pub fn motor_count(&self) -> usize {
        self.motors.len()
    }

    /// Exchange timeout in milliseconds
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Steps per revolution used for angle conversion
    pub fn steps_per_rotation(&self) -> i32 {
        self.steps_per_rotation
    }

    /// Last commanded direction of travel, or `None` for an unknown motor.
    pub fn bias(&self, motor: usize) -> Option<i32> {
        self.motors.get(motor).map(|slot| slot.bias)
    }

    /// Configured direction of a motor.
    pub fn direction(&self, motor: usize) -> Option<Rotation> {
        self.motors.get(motor).map(|slot| slot.direction)
    }

    /// Protocol client of a motor.
    pub fn client(&self, motor: usize) -> Option<&ProtocolClient<T>> {
        self.motors.get(motor).map(|slot| &slot.client)
    }

    /// Mutable protocol client of a motor, for commands without a
    /// motion-level wrapper.
    ///
    /// Moves issued this way do not update the bias.
    pub fn client_mut(&mut self, motor: usize) -> Option<&mut ProtocolClient<T>> {
        self.motors.get_mut(motor).map(|slot| &mut slot.client)
    }

    fn slot(&mut self, motor: usize) -> Result<&mut MotorSlot<T>, ValidationError> {
        let count = self.motors.len();
        self.motors
            .get_mut(motor)
            .ok_or(ValidationError::MotorIndex {
                index: motor as i64,
                count,
            })
    }

    // ------------------------------------------------------------------------
    // Motion
    // ------------------------------------------------------------------------

    /// Stop a motor.
    ///
    /// The bias is cleared whatever the device answers.
    pub fn stop(&mut self, motor: usize) -> Result<Status, ValidationError> {
        let timeout_ms = self.timeout_ms;
        let slot = self.slot(motor)?;
        let status = slot.client.stop(timeout_ms);
        slot.bias = 0;
        if !status.is_success() {
            warn!("motor {}: stop failed: {}", motor, status);
        }
        Ok(status)
    }

    /// Stop a motor and zero its position counter.
    ///
    /// Both commands are always sent. Returns the status of the position
    /// write; a failed stop is only logged.
    pub fn reset_position(&mut self, motor: usize) -> Result<Status, ValidationError> {
        let timeout_ms = self.timeout_ms;
        let slot = self.slot(motor)?;
        let stopped = slot.client.stop(timeout_ms);
        slot.bias = 0;
        if !stopped.is_success() {
            warn!("motor {}: stop before reset failed: {}", motor, stopped);
        }
        Ok(slot.client.set_actual_position(0, timeout_ms))
    }

    /// Rotate continuously.
    ///
    /// The sign of `velocity` is combined with the configured [`Rotation`]:
    /// a non-negative result rotates right, a negative one rotates left.
    /// The bias becomes that signed result.
    pub fn rotate(&mut self, motor: usize, velocity: i32) -> Result<Status, ValidationError> {
        let timeout_ms = self.timeout_ms;
        let slot = self.slot(motor)?;
        if !(-MAX_VELOCITY..=MAX_VELOCITY).contains(&velocity) {
            return Err(ValidationError::Velocity(velocity));
        }

        let effective = velocity * slot.direction.sign();
        debug!("motor {}: rotate {}", motor, effective);
        let status = if effective >= 0 {
            slot.client.rotate_right(effective.unsigned_abs(), timeout_ms)
        } else {
            slot.client.rotate_left(effective.unsigned_abs(), timeout_ms)
        };
        slot.bias = effective;
        Ok(status)
    }

    /// Move by `angle` degrees relative to the current position.
    ///
    /// The bias is left unchanged.
    pub fn move_by_angle(&mut self, motor: usize, angle: i32) -> Result<Status, ValidationError> {
        let timeout_ms = self.timeout_ms;
        let steps_per_rotation = self.steps_per_rotation;
        let slot = self.slot(motor)?;
        check_angle(angle)?;

        let delta = angle_to_steps(angle, steps_per_rotation);
        debug!("motor {}: move by {} deg ({} steps)", motor, angle, delta);
        Ok(slot
            .client
            .move_to_position(delta, MovementType::Relative, 0, timeout_ms))
    }

    /// Move to `angle` degrees within the revolution.
    ///
    /// Reads the actual position first; if that fails its status is returned
    /// and no move is sent. A target past the range of the position counter
    /// is not sent either and gives [`Status::InvalidValue`].
    pub fn move_to_angle(&mut self, motor: usize, angle: i32) -> Result<Status, ValidationError> {
        let timeout_ms = self.timeout_ms;
        let steps_per_rotation = self.steps_per_rotation;
        let slot = self.slot(motor)?;
        check_angle(angle)?;

        let reply = slot.client.get_actual_position(timeout_ms);
        let current = match reply.value {
            Some(position) => position,
            None => {
                warn!(
                    "motor {}: position read failed: {}",
                    motor, reply.status
                );
                return Ok(reply.status);
            }
        };

        let target = match wrapped_target(current, angle, slot.bias, steps_per_rotation) {
            Some(target) => target,
            None => {
                warn!(
                    "motor {}: target for {} deg from {} is out of range",
                    motor, angle, current
                );
                return Ok(Status::InvalidValue);
            }
        };
        debug!(
            "motor {}: move to {} deg, {} -> {} (bias {})",
            motor, angle, current, target, slot.bias
        );
        Ok(slot
            .client
            .move_to_position(target, MovementType::Absolute, 0, timeout_ms))
    }

    // ------------------------------------------------------------------------
    // Settings and readings
    // ------------------------------------------------------------------------

    /// Apply the configured [`DriverSettings`] and clear the bias.
    ///
    /// Settings are written in order: interpolation (when enabled), max
    /// current, power-down delay, pulse divisor, ramp divisor, max
    /// acceleration, microstep resolution. The first non-success status
    /// aborts and is returned.
    pub fn init_motor(&mut self, motor: usize) -> Result<Status, ValidationError> {
        let timeout_ms = self.timeout_ms;
        let writes = init_sequence(&self.driver);
        let slot = self.slot(motor)?;
        slot.bias = 0;

        for kind in writes.iter() {
            let status = slot.client.execute(kind, timeout_ms).status;
            if !status.is_success() {
                warn!("motor {}: init aborted at {}: {}", motor, kind.name(), status);
                return Ok(status);
            }
        }
        debug!("motor {}: initialized", motor);
        Ok(Status::Success)
    }

    /// Set the microstep resolution from a raw enumerant in `[1, 8]`.
    ///
    /// Does not change the steps per revolution used for angle conversion.
    pub fn set_microstep_resolution(
        &mut self,
        motor: usize,
        resolution: i32,
    ) -> Result<Status, ValidationError> {
        let timeout_ms = self.timeout_ms;
        let slot = self.slot(motor)?;
        let resolution = MicrostepResolution::try_from(resolution)?;
        Ok(slot.client.set_microstep_resolution(resolution, timeout_ms))
    }

    /// Read the driver temperature.
    pub fn temperature(&mut self, motor: usize) -> Result<Reply<u32>, ValidationError> {
        let timeout_ms = self.timeout_ms;
        Ok(self.slot(motor)?.client.get_gio_temperature(timeout_ms))
    }

    /// Read the supply voltage.
    pub fn voltage(&mut self, motor: usize) -> Result<Reply<u32>, ValidationError> {
        let timeout_ms = self.timeout_ms;
        Ok(self.slot(motor)?.client.get_gio_voltage(timeout_ms))
    }

    /// Apply a request from the upstream dispatcher.
    pub fn apply_command(&mut self, command: MotorCommand) -> Result<CommandOutcome, ValidationError> {
        debug!("motor {}: {}", command.motor(), command.name());
        let outcome = match command {
            MotorCommand::Init { motor } => CommandOutcome::status(self.init_motor(motor)?),
            MotorCommand::Stop { motor } => CommandOutcome::status(self.stop(motor)?),
            MotorCommand::ResetPosition { motor } => {
                CommandOutcome::status(self.reset_position(motor)?)
            }
            MotorCommand::MoveByAngle { motor, angle } => {
                CommandOutcome::status(self.move_by_angle(motor, angle)?)
            }
            MotorCommand::MoveToAngle { motor, angle } => {
                CommandOutcome::status(self.move_to_angle(motor, angle)?)
            }
            MotorCommand::Rotate { motor, velocity } => {
                CommandOutcome::status(self.rotate(motor, velocity)?)
            }
            MotorCommand::SetMicrostepResolution { motor, resolution } => {
                CommandOutcome::status(self.set_microstep_resolution(motor, resolution)?)
            }
            MotorCommand::Temperature { motor } => reading(self.temperature(motor)?),
            MotorCommand::Voltage { motor } => reading(self.voltage(motor)?),
        };
        Ok(outcome)
    }
}

fn check_angle(angle: i32) -> Result<(), ValidationError> {
    if (-MAX_ANGLE..=MAX_ANGLE).contains(&angle) {
        Ok(())
    } else {
        Err(ValidationError::Angle(angle))
    }
}

fn reading(reply: Reply<u32>) -> CommandOutcome {
    CommandOutcome {
        status: reply.status,
        value: reply.value,
    }
}

fn init_sequence(driver: &DriverSettings) -> HVec<CommandKind, 7> {
    let mut writes = HVec::new();
    if driver.interpolation {
        let _ = writes.push(CommandKind::SetInterpolation(1));
    }
    let _ = writes.push(CommandKind::SetMaxCurrent(driver.max_current));
    let _ = writes.push(CommandKind::SetPowerDownDelay(driver.power_down_delay));
    let _ = writes.push(CommandKind::SetPulseDivisor(driver.pulse_divisor));
    let _ = writes.push(CommandKind::SetRampDivisor(driver.ramp_divisor));
    let _ = writes.push(CommandKind::SetMaxAcceleration(driver.max_acceleration));
    let _ = writes.push(CommandKind::SetMicrostepResolution(
        driver.microstep_resolution,
    ));
    writes
}
