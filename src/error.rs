//! Local error types.
//!
//! [`ValidationError`] rejects arguments before any byte is written to a
//! controller. [`TransportError`] describes why an exchange produced no reply;
//! the protocol layer folds it into [`Status::Error`](crate::Status::Error).

/// An argument was outside its documented range.
///
/// Returned before any transport call, so the device never sees the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValidationError {
    /// Motor index not in `[0, motor_count)`.
    MotorIndex {
        /// Requested index.
        index: i64,
        /// Number of configured motors.
        count: usize,
    },
    /// Velocity not in `[-2049, 2049]`.
    Velocity(i32),
    /// Angle not in `[-360, 360]` degrees.
    Angle(i32),
    /// Microstep resolution enumerant not in `[1, 8]`.
    MicrostepResolution(i64),
    /// Device address not in `[1, 255]`.
    DeviceAddress(i64),
    /// Movement type code not Absolute (0), Relative (1) or Coordinate (2).
    MovementType(u8),
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MotorIndex { index, count } => write!(
                f,
                "invalid motor index: {} (0 - {})",
                index,
                count.saturating_sub(1)
            ),
            Self::Velocity(v) => write!(f, "invalid velocity: {} [-2049, 2049]", v),
            Self::Angle(a) => write!(f, "invalid angle: {} [-360, 360]", a),
            Self::MicrostepResolution(r) => {
                write!(f, "invalid microstep resolution: {} [1, 8]", r)
            }
            Self::DeviceAddress(a) => write!(f, "invalid device address: {} [1, 255]", a),
            Self::MovementType(t) => write!(f, "invalid movement type: {}", t),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ValidationError {}

/// Failure of a single write-then-read exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// The port is not open.
    NotOpen,
    /// Nothing (or not enough) arrived before the timeout.
    Timeout,
    /// Fewer than 9 bytes were written.
    ShortWrite(usize),
    /// Fewer than 9 bytes were read.
    ShortRead(usize),
    /// Any other I/O failure from the serial layer.
    Io,
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotOpen => write!(f, "port is not open"),
            Self::Timeout => write!(f, "timed out waiting for reply"),
            Self::ShortWrite(n) => write!(f, "short write: {} of 9 bytes", n),
            Self::ShortRead(n) => write!(f, "short read: {} of 9 bytes", n),
            Self::Io => write!(f, "serial I/O error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_range() {
        assert_eq!(
            format!("{}", ValidationError::Velocity(2050)),
            "invalid velocity: 2050 [-2049, 2049]"
        );
        assert_eq!(
            format!("{}", ValidationError::MotorIndex { index: 3, count: 2 }),
            "invalid motor index: 3 (0 - 1)"
        );
        assert_eq!(
            format!("{}", ValidationError::DeviceAddress(0)),
            "invalid device address: 0 [1, 255]"
        );
    }

    #[test]
    fn transport_messages() {
        assert_eq!(
            format!("{}", TransportError::ShortRead(4)),
            "short read: 4 of 9 bytes"
        );
        assert_eq!(format!("{}", TransportError::Timeout), "timed out waiting for reply");
    }
}
