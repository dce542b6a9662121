//! Protocol client tests against scripted replies

use rs_stepper_proxy::{
    frame, hal::MockTransport, CommandKind, DeviceAddress, MicrostepResolution, MovementType,
    ProtocolClient, Status, TransportError, ValidationError,
};

fn client(address: i32) -> ProtocolClient<MockTransport> {
    ProtocolClient::new(DeviceAddress::new(address).unwrap(), MockTransport::new())
}

fn last_sent(client: &ProtocolClient<MockTransport>) -> [u8; 9] {
    *client.transport().sent.last().unwrap()
}

// ============================================================================
// Frames on the wire
// ============================================================================

#[test]
fn stop_frame_bytes() {
    let mut client = client(2);
    client.transport_mut().queue_reply(2, 100, 3, 0);

    assert_eq!(client.stop(1000), Status::Success);
    assert_eq!(last_sent(&client), [2, 3, 0, 0, 0, 0, 0, 0, 5]);
}

#[test]
fn rotate_right_frame_bytes() {
    let mut client = client(1);
    client.transport_mut().queue_reply(1, 100, 1, 0);

    client.rotate_right(2049, 1000);
    assert_eq!(last_sent(&client), [1, 1, 0, 0, 0, 0, 0x08, 0x01, 0x0b]);
}

#[test]
fn negative_position_is_twos_complement() {
    let mut client = client(1);
    client.transport_mut().queue_reply(1, 100, 4, 0);

    client.move_to_position(-1, MovementType::Absolute, 0, 1000);
    let sent = last_sent(&client);
    assert_eq!(&sent[4..8], &[0xff, 0xff, 0xff, 0xff]);
    assert_eq!(sent[8], frame::checksum(&sent));
}

#[test]
fn coordinate_byte_only_in_coordinate_mode() {
    let mut client = client(1);
    client.transport_mut().queue_reply(1, 100, 4, 0);
    client.transport_mut().queue_reply(1, 100, 4, 0);

    client.move_to_position(0, MovementType::Coordinate, 7, 1000);
    let sent = last_sent(&client);
    assert_eq!(sent[frame::TYPE], 2);
    assert_eq!(sent[frame::MOTOR], 7);

    client.move_to_position(0, MovementType::Relative, 7, 1000);
    let sent = last_sent(&client);
    assert_eq!(sent[frame::TYPE], 1);
    assert_eq!(sent[frame::MOTOR], 0);
}

#[test]
fn gio_queries_select_bank_one() {
    let mut client = client(1);
    client.transport_mut().queue_reply(1, 100, 0x0f, 241);
    client.transport_mut().queue_reply(1, 100, 0x0f, 36);

    assert_eq!(client.get_gio_voltage(1000).value, Some(241));
    assert_eq!(&last_sent(&client)[1..4], &[0x0f, 8, 1]);

    assert_eq!(client.get_gio_temperature(1000).value, Some(36));
    assert_eq!(&last_sent(&client)[1..4], &[0x0f, 9, 1]);
}

#[test]
fn every_kind_carries_a_valid_checksum() {
    let kinds = [
        CommandKind::RotateRight(10),
        CommandKind::RotateLeft(10),
        CommandKind::Stop,
        CommandKind::SetActualPosition(-5),
        CommandKind::GetActualPosition,
        CommandKind::SetMaxAcceleration(200),
        CommandKind::SetMaxCurrent(128),
        CommandKind::SetStandbyCurrent(8),
        CommandKind::SetMicrostepResolution(MicrostepResolution::Micro16),
        CommandKind::GetMicrostepResolution,
        CommandKind::SetRampDivisor(8),
        CommandKind::SetPulseDivisor(6),
        CommandKind::SetInterpolation(1),
        CommandKind::SetPowerDownDelay(20),
        CommandKind::GetGioVoltage,
        CommandKind::GetGioTemperature,
        CommandKind::GetFirmwareVersion,
    ];

    let mut client = client(255);
    for kind in kinds.iter() {
        client.execute(kind, 10);
    }
    for sent in client.transport().sent.iter() {
        assert_eq!(sent[frame::ADDRESS], 255);
        assert!(frame::is_valid(sent));
    }
}

#[test]
fn timeout_is_forwarded() {
    let mut client = client(1);
    client.stop(250);
    client.get_actual_position(40);
    assert_eq!(client.transport().timeouts, vec![250, 40]);
}

// ============================================================================
// Reply handling
// ============================================================================

#[test]
fn signed_position_reply() {
    let mut client = client(1);
    client.transport_mut().queue_reply(1, 100, 6, (-100i32) as u32);

    let reply = client.get_actual_position(1000);
    assert_eq!(reply.status, Status::Success);
    assert_eq!(reply.value, Some(-100));
}

#[test]
fn device_status_is_verbatim() {
    let mut client = client(1);
    client.transport_mut().queue_reply(1, 4, 5, 0);
    client.transport_mut().queue_reply(1, 5, 5, 0);
    client.transport_mut().queue_reply(1, 101, 5, 0);

    assert_eq!(client.set_max_current(999, 1000), Status::InvalidValue);
    assert_eq!(
        client.set_max_current(10, 1000),
        Status::ConfigurationEepromLocked
    );
    assert_eq!(
        client.set_max_current(10, 1000),
        Status::CommandLoadedIntoEeprom
    );
}

#[test]
fn failed_query_has_no_value() {
    let mut client = client(1);
    client.transport_mut().queue_reply(1, 3, 6, 1234);

    let reply = client.get_actual_position(1000);
    assert_eq!(reply.status, Status::WrongType);
    assert_eq!(reply.value, None);
}

#[test]
fn unknown_status_code_is_preserved() {
    let mut client = client(1);
    client.transport_mut().queue_reply(1, 42, 3, 0);

    let status = client.stop(1000);
    assert_eq!(status, Status::Unknown(42));
    assert!(!status.is_success());
}

#[test]
fn corrupt_reply_is_error() {
    let mut client = client(1);
    let mut raw = frame::encode(1, 1, 100, 6, 3200);
    raw[frame::CHECKSUM] ^= 0x01;
    client.transport_mut().queue_raw(raw);

    let reply = client.get_actual_position(1000);
    assert_eq!(reply.status, Status::Error);
    assert_eq!(reply.value, None);
}

#[test]
fn transport_failures_are_error() {
    let mut client = client(1);
    client.transport_mut().queue_error(TransportError::ShortRead(3));
    client.transport_mut().queue_error(TransportError::Io);

    assert_eq!(client.stop(1000), Status::Error);
    assert_eq!(client.get_gio_voltage(1000).status, Status::Error);
    // empty queue times out
    assert_eq!(client.stop(1000), Status::Error);
    assert_eq!(client.transport().sent.len(), 3);
}

#[test]
fn microstep_resolution_reply_is_typed() {
    let mut client = client(1);
    client.transport_mut().queue_reply(1, 100, 6, 8);
    client.transport_mut().queue_reply(1, 100, 6, 9);

    let reply = client.get_microstep_resolution(1000);
    assert_eq!(reply.value, Some(MicrostepResolution::Micro256));
    assert_eq!(reply.value.map(|r| r.microsteps()), Some(256));

    let reply = client.get_microstep_resolution(1000);
    assert_eq!(reply.status, Status::Error);
    assert_eq!(reply.value, None);
}

#[test]
fn firmware_version_is_unsigned() {
    let mut client = client(1);
    client.transport_mut().queue_reply(1, 100, 0x88, 0x9000_0106);

    assert_eq!(client.get_firmware_version(1000).value, Some(0x9000_0106));
    assert_eq!(&last_sent(&client)[1..4], &[0x88, 1, 0]);
}

// ============================================================================
// Local validation
// ============================================================================

#[test]
fn raw_movement_type_validated_locally() {
    let mut client = client(1);
    assert_eq!(
        client.move_to_position_raw(100, 3, 0, 1000),
        Err(ValidationError::MovementType(3))
    );
    assert!(client.transport().sent.is_empty());

    client.transport_mut().queue_reply(1, 100, 4, 0);
    assert_eq!(client.move_to_position_raw(100, 1, 0, 1000), Ok(Status::Success));
}

#[test]
fn device_address_bounds() {
    assert!(DeviceAddress::new(0).is_err());
    assert!(DeviceAddress::new(256).is_err());
    assert!(DeviceAddress::new(-1).is_err());
    assert_eq!(DeviceAddress::new(1).unwrap().get(), 1);
    assert_eq!(DeviceAddress::new(255).unwrap().get(), 255);
}
