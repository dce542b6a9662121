//! Thread-safe access to one [`MotionController`].
//!
//! `SharedMotionController` lets several request sources (a network
//! listener, a console, a watchdog) drive the same motors while keeping
//! exactly one exchange in flight.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_stepper_proxy::shared::{MotionProvider, SharedMotionController};
//! use rs_stepper_proxy::hal::SimulatedDevice;
//! use rs_stepper_proxy::{Config, DeviceAddress, MotionController, MotorCommand, MotorConfig};
//!
//! let address = DeviceAddress::new(1).unwrap();
//! let config = Config::default().with_motor(MotorConfig::new("/dev/ttyUSB0", address));
//! let controller = MotionController::new(&config, |_, cfg| SimulatedDevice::new(cfg.address));
//! let shared = Arc::new(SharedMotionController::new(controller));
//!
//! let worker = Arc::clone(&shared);
//! std::thread::spawn(move || {
//!     worker.apply_command(MotorCommand::Rotate { motor: 0, velocity: 400 })
//! })
//! .join()
//! .unwrap()
//! .unwrap();
//!
//! assert_eq!(shared.biases(), vec![400]);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::commands::{CommandOutcome, MotorCommand};
use crate::error::ValidationError;
use crate::motion::MotionController;
use crate::traits::Transport;

// ============================================================================
// Provider Trait
// ============================================================================

/// Access to a motion controller from request handlers.
///
/// Handlers written against this trait work with any locking strategy.
pub trait MotionProvider: Send + Sync {
    /// Number of configured motors.
    fn motor_count(&self) -> usize;

    /// Current bias of every motor, in index order.
    fn biases(&self) -> Vec<i32>;

    /// Apply a request.
    fn apply_command(&self, command: MotorCommand) -> Result<CommandOutcome, ValidationError>;
}

// ============================================================================
// Shared Controller
// ============================================================================

/// A [`MotionController`] behind a `Mutex`.
///
/// # Thread Safety
///
/// Every request holds the lock for its whole exchange sequence, so a
/// `move_to_angle` (position read then move) is never interleaved with
/// another request. A poisoned lock is recovered; the controller holds no
/// invariant a panicking caller could break halfway.
pub struct SharedMotionController<T: Transport> {
    controller: Mutex<MotionController<T>>,
}

impl<T: Transport> SharedMotionController<T> {
    /// Wrap a controller.
    pub fn new(controller: MotionController<T>) -> Self {
        Self {
            controller: Mutex::new(controller),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MotionController<T>> {
        self.controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Access the controller with the lock held.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let status = shared.with_controller(|controller| controller.move_to_angle(0, 90));
    /// ```
    pub fn with_controller<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut MotionController<T>) -> R,
    {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Apply a request with the lock held.
    pub fn apply_command(&self, command: MotorCommand) -> Result<CommandOutcome, ValidationError> {
        self.lock().apply_command(command)
    }

    /// Number of configured motors
    pub fn motor_count(&self) -> usize {
        self.lock().motor_count()
    }

    /// Current bias of every motor, in index order.
    pub fn biases(&self) -> Vec<i32> {
        let controller = self.lock();
        (0..controller.motor_count())
            .filter_map(|motor| controller.bias(motor))
            .collect()
    }

    /// Unwrap the controller.
    pub fn into_inner(self) -> MotionController<T> {
        self.controller
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// MotionProvider Implementation for Arc<SharedMotionController>
// ============================================================================

impl<T: Transport + Send + 'static> MotionProvider for Arc<SharedMotionController<T>> {
    fn motor_count(&self) -> usize {
        SharedMotionController::motor_count(self)
    }

    fn biases(&self) -> Vec<i32> {
        SharedMotionController::biases(self)
    }

    fn apply_command(&self, command: MotorCommand) -> Result<CommandOutcome, ValidationError> {
        SharedMotionController::apply_command(self, command)
    }
}
