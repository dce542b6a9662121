//! Response status codes.
//!
//! Controllers answer every command with a status byte. [`Status::Error`]
//! is a local sentinel for exchanges that produced no usable reply (timeout,
//! short read, checksum mismatch); it is never transmitted.

/// Outcome of a single command exchange.
///
/// # Example
///
/// ```rust
/// use rs_stepper_proxy::Status;
///
/// assert_eq!(Status::from_code(100), Status::Success);
/// assert_eq!(Status::from_code(4), Status::InvalidValue);
/// assert!(Status::Success.is_success());
/// assert!(!Status::Error.is_success());
/// assert_eq!(Status::Error.code(), 1000);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Status {
    /// The controller saw a bad checksum in our command.
    WrongChecksum,
    /// Unknown command number.
    InvalidCommand,
    /// Type byte not valid for this command.
    WrongType,
    /// Value out of the accepted range.
    InvalidValue,
    /// Configuration EEPROM is locked.
    ConfigurationEepromLocked,
    /// Command exists but is not available in this mode.
    CommandNotAvailable,
    /// Command executed.
    Success,
    /// Command stored into EEPROM (stand-alone program mode).
    CommandLoadedIntoEeprom,
    /// A status byte outside the documented set.
    Unknown(u8),
    /// No usable reply. Never seen on the wire.
    Error,
}

impl Status {
    /// Numeric value used for [`Status::Error`], outside the 8-bit wire range.
    pub const ERROR_CODE: u16 = 1000;

    /// Maps an on-wire status byte.
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Status::WrongChecksum,
            2 => Status::InvalidCommand,
            3 => Status::WrongType,
            4 => Status::InvalidValue,
            5 => Status::ConfigurationEepromLocked,
            6 => Status::CommandNotAvailable,
            100 => Status::Success,
            101 => Status::CommandLoadedIntoEeprom,
            other => Status::Unknown(other),
        }
    }

    /// Numeric code, [`Self::ERROR_CODE`] for the local sentinel.
    pub const fn code(&self) -> u16 {
        match self {
            Status::WrongChecksum => 1,
            Status::InvalidCommand => 2,
            Status::WrongType => 3,
            Status::InvalidValue => 4,
            Status::ConfigurationEepromLocked => 5,
            Status::CommandNotAvailable => 6,
            Status::Success => 100,
            Status::CommandLoadedIntoEeprom => 101,
            Status::Unknown(code) => *code as u16,
            Status::Error => Self::ERROR_CODE,
        }
    }

    /// True only for [`Status::Success`].
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }

    /// True for the local transport/checksum failure sentinel.
    #[inline]
    pub const fn is_error(&self) -> bool {
        matches!(self, Status::Error)
    }

    /// Short lowercase name for logs and replies.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Status::WrongChecksum => "wrong_checksum",
            Status::InvalidCommand => "invalid_command",
            Status::WrongType => "wrong_type",
            Status::InvalidValue => "invalid_value",
            Status::ConfigurationEepromLocked => "configuration_eeprom_locked",
            Status::CommandNotAvailable => "command_not_available",
            Status::Success => "success",
            Status::CommandLoadedIntoEeprom => "command_loaded_into_eeprom",
            Status::Unknown(_) => "unknown",
            Status::Error => "error",
        }
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Status::Unknown(code) => write!(f, "unknown ({})", code),
            other => write!(f, "{} ({})", other.as_str(), other.code()),
        }
    }
}
