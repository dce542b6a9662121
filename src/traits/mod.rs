//! Trait definitions for hardware abstraction.
//!
//! This module defines the seam between the protocol engine and the serial
//! line, so the engine can run against a real port or a desktop mock.
//!
//! # Submodules
//!
//! - `hardware`: [`Transport`] and the [`Rotation`] calibration setting

pub mod hardware;

pub use hardware::*;
