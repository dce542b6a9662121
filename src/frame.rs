//! Fixed 9-byte frame layout shared by commands and responses.
//!
//! Every exchange with a controller is one 9-byte command followed by one
//! 9-byte response. Both directions end with a checksum byte that is the
//! wrapping sum of the eight bytes before it.
//!
//! | Offset | Command | Response |
//! |--------|---------|----------|
//! | 0 | device address | device address |
//! | 1 | command number | module |
//! | 2 | type | status code |
//! | 3 | motor / coordinate | command number echo |
//! | 4-7 | value (big-endian) | value (big-endian) |
//! | 8 | checksum | checksum |
//!
//! # Example
//!
//! ```rust
//! use rs_stepper_proxy::frame::{self, ResponseFrame};
//!
//! let bytes = frame::encode(1, 6, 1, 0, 0);
//! assert_eq!(bytes, [1, 6, 1, 0, 0, 0, 0, 0, 0x08]);
//!
//! let response = ResponseFrame::decode(&[2, 1, 100, 6, 0, 0, 0x0c, 0x80, 0xf9]);
//! assert!(response.valid);
//! assert_eq!(response.value, 3200);
//! ```

/// Size of every frame in bytes.
pub const FRAME_SIZE: usize = 9;

/// A raw frame as it travels on the wire.
pub type RawFrame = [u8; FRAME_SIZE];

/// Byte offset of the device address.
pub const ADDRESS: usize = 0;
/// Byte offset of the command number (command frames).
pub const COMMAND_NUMBER: usize = 1;
/// Byte offset of the type / sub-selector (command frames).
pub const TYPE: usize = 2;
/// Byte offset of the motor or coordinate byte (command frames).
pub const MOTOR: usize = 3;
/// Byte offset of the module echo (response frames).
pub const MODULE: usize = 1;
/// Byte offset of the status code (response frames).
pub const STATUS: usize = 2;
/// Byte offset of the echoed command number (response frames).
pub const RESPONSE_COMMAND_NUMBER: usize = 3;
/// Byte offset of the first value byte.
pub const VALUE: usize = 4;
/// Byte offset of the checksum.
pub const CHECKSUM: usize = 8;

/// Wrapping 8-bit sum of the first eight bytes of a frame.
#[inline]
pub fn checksum(bytes: &RawFrame) -> u8 {
    bytes[..CHECKSUM]
        .iter()
        .fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Packs a command frame and writes its checksum.
///
/// The value is written big-endian. Signed values are passed through
/// `as u32`, which keeps their two's complement bytes.
pub fn encode(address: u8, command_number: u8, kind: u8, motor: u8, value: u32) -> RawFrame {
    let mut bytes = [0u8; FRAME_SIZE];
    bytes[ADDRESS] = address;
    bytes[COMMAND_NUMBER] = command_number;
    bytes[TYPE] = kind;
    bytes[MOTOR] = motor;
    bytes[VALUE..CHECKSUM].copy_from_slice(&value.to_be_bytes());
    bytes[CHECKSUM] = checksum(&bytes);
    bytes
}

/// Reads the big-endian value slot of any frame.
#[inline]
pub fn value_of(bytes: &RawFrame) -> u32 {
    u32::from_be_bytes([
        bytes[VALUE],
        bytes[VALUE + 1],
        bytes[VALUE + 2],
        bytes[VALUE + 3],
    ])
}

/// Returns true if the trailing byte matches the checksum of the rest.
#[inline]
pub fn is_valid(bytes: &RawFrame) -> bool {
    bytes[CHECKSUM] == checksum(bytes)
}

/// A decoded response frame.
///
/// Decoding never fails because the frame size is fixed. A frame whose
/// checksum does not match has `valid == false` and must be treated the
/// same way as a transport failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Address of the replying controller.
    pub address: u8,
    /// Module byte echoed by the controller.
    pub module: u8,
    /// Raw status code.
    pub status: u8,
    /// Command number this response answers.
    pub command_number: u8,
    /// Raw 32-bit value; reinterpret as signed where the command demands.
    pub value: u32,
    /// Whether the checksum agreed.
    pub valid: bool,
}

impl ResponseFrame {
    /// Decodes a raw response.
    pub fn decode(bytes: &RawFrame) -> Self {
        Self {
            address: bytes[ADDRESS],
            module: bytes[MODULE],
            status: bytes[STATUS],
            command_number: bytes[RESPONSE_COMMAND_NUMBER],
            value: value_of(bytes),
            valid: is_valid(bytes),
        }
    }

    /// Value reinterpreted as a signed 32-bit integer.
    #[inline]
    pub fn signed_value(&self) -> i32 {
        self.value as i32
    }

    /// Builds the wire bytes for a response (used by simulated devices).
    pub fn to_bytes(&self) -> RawFrame {
        let mut bytes = encode(
            self.address,
            self.module,
            self.status,
            self.command_number,
            self.value,
        );
        if !self.valid {
            bytes[CHECKSUM] = bytes[CHECKSUM].wrapping_add(1);
        }
        bytes
    }
}
