//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the [`Transport`]
//! trait defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Scripted and simulated controllers for desktop testing
//! - `serial`: Real serial ports via `serialport` (requires `serial` feature)
//!
//! [`Transport`]: crate::traits::Transport

pub mod mock;

#[cfg(feature = "serial")]
pub mod serial;

pub use mock::*;

#[cfg(feature = "serial")]
pub use serial::*;
