//! Edge case and boundary condition tests for the codec and controller

use rs_stepper_proxy::{
    build, frame, hal::SimulatedDevice, parse_address_option, parse_direction_option,
    CommandKind, Config, DeviceAddress, MicrostepResolution, MotionController, MotorCommand,
    MotorConfig, ResponseFrame, Rotation, Status, ValidationError, MAX_MOTORS,
};

fn single() -> MotionController<SimulatedDevice> {
    let config = Config::default().with_motor(MotorConfig::new(
        "/dev/ttyUSB0",
        DeviceAddress::new(1).unwrap(),
    ));
    MotionController::new(&config, |_, cfg| SimulatedDevice::new(cfg.address))
}

// ============================================================================
// Codec Boundaries
// ============================================================================

#[test]
fn extreme_values_encode_deterministically() {
    let address = DeviceAddress::new(1).unwrap();
    for value in [i32::MIN, -1, 0, 1, i32::MAX] {
        let a = build(&CommandKind::SetActualPosition(value), address);
        let b = build(&CommandKind::SetActualPosition(value), address);
        assert_eq!(a, b);
        assert!(frame::is_valid(&a));
        assert_eq!(frame::value_of(&a) as i32, value);
    }
}

#[test]
fn any_single_bit_flip_is_detected() {
    let raw = build(
        &CommandKind::SetActualPosition(-123_456),
        DeviceAddress::new(77).unwrap(),
    );
    for byte in 0..frame::FRAME_SIZE {
        for bit in 0..8 {
            let mut corrupted = raw;
            corrupted[byte] ^= 1 << bit;
            assert!(!frame::is_valid(&corrupted), "byte {} bit {}", byte, bit);
        }
    }
}

#[test]
fn checksum_wraps_past_255() {
    let raw = frame::encode(255, 255, 255, 255, u32::MAX);
    // 8 * 255 = 2040 = 7 * 256 + 248
    assert_eq!(raw[frame::CHECKSUM], 248);
    let decoded = ResponseFrame::decode(&raw);
    assert!(decoded.valid);
    assert_eq!(decoded.signed_value(), -1);
}

#[test]
fn status_code_mapping() {
    let expected = [
        (1, Status::WrongChecksum),
        (2, Status::InvalidCommand),
        (3, Status::WrongType),
        (4, Status::InvalidValue),
        (5, Status::ConfigurationEepromLocked),
        (6, Status::CommandNotAvailable),
        (100, Status::Success),
        (101, Status::CommandLoadedIntoEeprom),
    ];
    for (code, status) in expected {
        assert_eq!(Status::from_code(code), status);
        assert_eq!(status.code(), code as u16);
    }
    assert_eq!(Status::from_code(0), Status::Unknown(0));
    assert_eq!(Status::Error.code(), 1000);
}

// ============================================================================
// Validation Boundaries
// ============================================================================

#[test]
fn velocity_at_limits() {
    let mut controller = single();
    assert_eq!(controller.rotate(0, 2049), Ok(Status::Success));
    assert_eq!(controller.rotate(0, -2049), Ok(Status::Success));
    assert_eq!(controller.rotate(0, 2050), Err(ValidationError::Velocity(2050)));
    assert_eq!(controller.rotate(0, i32::MIN), Err(ValidationError::Velocity(i32::MIN)));
}

#[test]
fn angle_at_limits() {
    let mut controller = single();
    assert!(controller.move_to_angle(0, 360).is_ok());
    assert!(controller.move_to_angle(0, -360).is_ok());
    assert!(controller.move_by_angle(0, 360).is_ok());
    assert!(controller.move_by_angle(0, -360).is_ok());
    assert_eq!(controller.move_to_angle(0, 361), Err(ValidationError::Angle(361)));
    assert_eq!(controller.move_by_angle(0, -361), Err(ValidationError::Angle(-361)));
}

#[test]
fn microstep_resolution_at_limits() {
    assert_eq!(MicrostepResolution::try_from(1i32), Ok(MicrostepResolution::Micro2));
    assert_eq!(MicrostepResolution::try_from(8i32), Ok(MicrostepResolution::Micro256));
    assert!(MicrostepResolution::try_from(0i32).is_err());
    assert!(MicrostepResolution::try_from(9i32).is_err());
}

#[test]
fn motor_index_at_limits() {
    let mut controller = single();
    assert!(controller.stop(0).is_ok());
    assert_eq!(
        controller.apply_command(MotorCommand::Voltage { motor: 1 }),
        Err(ValidationError::MotorIndex { index: 1, count: 1 })
    );
    assert!(controller
        .apply_command(MotorCommand::Voltage { motor: usize::MAX })
        .is_err());
}

#[test]
fn validation_error_messages() {
    let err = ValidationError::MotorIndex { index: 3, count: 2 };
    assert_eq!(err.to_string(), "invalid motor index: 3 (0 - 1)");
    assert_eq!(
        ValidationError::Velocity(3000).to_string(),
        "invalid velocity: 3000 [-2049, 2049]"
    );
}

// ============================================================================
// Option Parsing
// ============================================================================

#[test]
fn option_parsing_limits() {
    assert!(parse_address_option(&format!("{}:1", MAX_MOTORS - 1)).is_ok());
    assert!(parse_address_option(&format!("{}:1", MAX_MOTORS)).is_err());
    assert!(parse_address_option("0:255").is_ok());
    assert!(parse_address_option("0:256").is_err());
    assert!(parse_address_option("0:").is_err());
    assert!(parse_address_option(":1").is_err());

    assert_eq!(parse_direction_option("2:L"), Ok((2, Rotation::Left)));
    assert!(parse_direction_option("2:").is_err());
}

#[test]
fn oversized_motor_table_is_truncated() {
    let config = (0..5).fold(Config::default(), |config, i| {
        config.with_motor(MotorConfig::new(
            "/dev/ttyUSB0",
            DeviceAddress::new(i + 1).unwrap(),
        ))
    });
    assert_eq!(config.motor_count(), MAX_MOTORS);

    let controller = MotionController::new(&config, |_, cfg| SimulatedDevice::new(cfg.address));
    assert_eq!(controller.motor_count(), MAX_MOTORS);
}
