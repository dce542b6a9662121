//! Hardware abstraction for the serial link and motor calibration.
//!
//! # Key Items
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Transport`] | One blocking 9-byte write followed by one 9-byte read |
//! | [`Rotation`] | Which controller command a positive velocity maps to |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations from
//! [`crate::hal::mock`]. For a real serial port, use `hal::SerialTransport`
//! (requires the `serial` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_stepper_proxy::traits::Transport;
//! use rs_stepper_proxy::hal::MockTransport;
//!
//! let mut transport = MockTransport::new();
//! transport.queue_reply(1, 100, 3, 0);
//!
//! let reply = transport.execute(&[1, 3, 0, 0, 0, 0, 0, 0, 4], 1000).unwrap();
//! assert_eq!(reply[2], 100);
//! assert_eq!(transport.sent.len(), 1);
//! ```

use crate::frame::RawFrame;

/// Configured turning sense of a motor.
///
/// This is a static calibration setting, not motion state: it decides
/// whether a positive requested velocity is sent as rotate-right or
/// rotate-left, so that mirrored mounts can share the same requests.
///
/// # Default
///
/// Defaults to [`Right`](Self::Right).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Rotation {
    /// Positive velocity rotates right.
    #[default]
    Right,
    /// Positive velocity rotates left.
    Left,
}

impl Rotation {
    /// Returns the rotation as a lowercase string.
    ///
    /// ```
    /// use rs_stepper_proxy::Rotation;
    ///
    /// assert_eq!(Rotation::Right.as_str(), "right");
    /// assert_eq!(Rotation::Left.as_str(), "left");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Rotation::Right => "right",
            Rotation::Left => "left",
        }
    }

    /// Parse rotation from text input.
    ///
    /// Accepts `"r"`/`"right"` and `"l"`/`"left"`, trimmed and
    /// case-insensitive.
    ///
    /// ```
    /// use rs_stepper_proxy::Rotation;
    ///
    /// assert_eq!(Rotation::from_text("r"), Some(Rotation::Right));
    /// assert_eq!(Rotation::from_text(" Left "), Some(Rotation::Left));
    /// assert_eq!(Rotation::from_text("x"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("r") || s.eq_ignore_ascii_case("right") {
            Some(Rotation::Right)
        } else if s.eq_ignore_ascii_case("l") || s.eq_ignore_ascii_case("left") {
            Some(Rotation::Left)
        } else {
            None
        }
    }

    /// Sign applied to a requested velocity.
    #[inline]
    pub const fn sign(&self) -> i32 {
        match self {
            Rotation::Right => 1,
            Rotation::Left => -1,
        }
    }
}

/// Synchronous request/response link to one controller.
///
/// An exchange is one blocking write of exactly 9 bytes followed by one
/// blocking read of exactly 9 bytes, both bounded by `timeout_ms`. A short
/// write or short read is an error of the transport, not of the protocol.
///
/// `execute` takes `&mut self`, so a transport can never have two
/// exchanges in flight.
///
/// # Implementation Notes
///
/// - Do not retry; the caller owns any retry policy
/// - After a timeout the device state is unknown
/// - Checksum validation happens in [`ProtocolClient`](crate::ProtocolClient)
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_stepper_proxy::traits::Transport;
///
/// struct Loopback;
///
/// impl Transport for Loopback {
///     type Error = ();
///
///     fn execute(&mut self, command: &[u8; 9], _timeout_ms: u32) -> Result<[u8; 9], ()> {
///         Ok(*command)
///     }
/// }
/// ```
pub trait Transport {
    /// Error type for failed exchanges.
    type Error: core::fmt::Debug;

    /// Write `command` and read the 9-byte reply.
    fn execute(&mut self, command: &RawFrame, timeout_ms: u32) -> Result<RawFrame, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn execute(&mut self, command: &RawFrame, timeout_ms: u32) -> Result<RawFrame, Self::Error> {
        (**self).execute(command, timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Rotation Tests
    // =========================================================================

    #[test]
    fn rotation_default() {
        assert_eq!(Rotation::default(), Rotation::Right);
    }

    #[test]
    fn rotation_from_text_variants() {
        assert_eq!(Rotation::from_text("r"), Some(Rotation::Right));
        assert_eq!(Rotation::from_text("R"), Some(Rotation::Right));
        assert_eq!(Rotation::from_text("right"), Some(Rotation::Right));
        assert_eq!(Rotation::from_text("l"), Some(Rotation::Left));
        assert_eq!(Rotation::from_text("LEFT"), Some(Rotation::Left));
        assert_eq!(Rotation::from_text("\tl\n"), Some(Rotation::Left));
    }

    #[test]
    fn rotation_from_text_invalid() {
        assert_eq!(Rotation::from_text(""), None);
        assert_eq!(Rotation::from_text("rl"), None);
        assert_eq!(Rotation::from_text("up"), None);
    }

    #[test]
    fn rotation_sign() {
        assert_eq!(Rotation::Right.sign(), 1);
        assert_eq!(Rotation::Left.sign(), -1);
    }

    // =========================================================================
    // Transport Forwarding Tests
    // =========================================================================

    struct Echo {
        calls: usize,
    }

    impl Transport for Echo {
        type Error = ();

        fn execute(&mut self, command: &RawFrame, _timeout_ms: u32) -> Result<RawFrame, ()> {
            self.calls += 1;
            Ok(*command)
        }
    }

    fn exchange<T: Transport>(mut transport: T) -> Result<RawFrame, T::Error> {
        transport.execute(&[1; 9], 10)
    }

    #[test]
    fn mutable_reference_forwards() {
        let mut echo = Echo { calls: 0 };
        assert_eq!(exchange(&mut echo), Ok([1; 9]));
        assert_eq!(exchange(&mut echo), Ok([1; 9]));
        assert_eq!(echo.calls, 2);
    }
}
