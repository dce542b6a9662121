//! One-shot diagnostic tool for a single stepper controller.
//!
//! Opens a serial port, sends one command to one controller and prints the
//! result. With no command it reads the microstep resolution, which is a
//! harmless way to check wiring and addressing.
//!
//! # Usage
//!
//! ```bash
//! motor_cmd /dev/ttyUSB0 1
//! motor_cmd /dev/ttyUSB0 1 rotate -- -300
//! motor_cmd /dev/ttyUSB0 2 move-to-angle 90
//! RUST_LOG=trace motor_cmd /dev/ttyUSB0 1 position
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};

use rs_stepper_proxy::config::SerialConfig;
use rs_stepper_proxy::hal::SerialTransport;
use rs_stepper_proxy::{
    Config, DeviceAddress, MotionController, MotorCommand, MotorConfig, MovementType, Rotation,
    Status,
};

#[derive(Parser)]
#[command(name = "motor_cmd")]
#[command(about = "Send one command to a stepper controller", long_about = None)]
struct Cli {
    /// Serial port (e.g. /dev/ttyUSB0)
    port: String,

    /// Controller address (1-255)
    address: i32,

    /// Baud rate
    #[arg(long, default_value = "9600")]
    baud: u32,

    /// Reply timeout in milliseconds
    #[arg(long, default_value = "1000")]
    timeout_ms: u32,

    /// Treat positive velocities as leftward
    #[arg(long)]
    left: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Read the microstep resolution
    Msr,
    /// Set the microstep resolution (1-8)
    SetMsr { resolution: i32 },
    /// Apply the default driver settings
    Init,
    /// Rotate continuously (-2049 to 2049)
    Rotate { velocity: i32 },
    /// Stop the motor
    Stop,
    /// Stop and zero the position counter
    Reset,
    /// Read the actual position
    Position,
    /// Overwrite the actual position
    SetPosition { position: i32 },
    /// Move to an absolute step position
    MoveTo {
        position: i32,
        /// Move relative to the current position
        #[arg(long)]
        relative: bool,
    },
    /// Move to an angle within the revolution (-360 to 360)
    MoveToAngle { angle: i32 },
    /// Move by an angle (-360 to 360)
    MoveByAngle { angle: i32 },
    /// Read the driver temperature
    Temp,
    /// Read the supply voltage
    Volt,
    /// Read the firmware version
    Firmware,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    // Validate before touching the port.
    let address = DeviceAddress::new(cli.address)?;
    let direction = if cli.left {
        Rotation::Left
    } else {
        Rotation::Right
    };
    let serial = SerialConfig::default().with_baud_rate(cli.baud);
    let config = Config::default()
        .with_motor(MotorConfig::new(&cli.port, address).with_direction(direction))
        .with_serial(serial.clone())
        .with_timeout_ms(cli.timeout_ms);

    let mut controller = MotionController::try_new(&config, |_, motor| {
        SerialTransport::open(motor.port.as_str(), &serial)
    })?;
    info!("opened {} (address {})", cli.port, address.get());

    run(&mut controller, cli.command.unwrap_or(Command::Msr), cli.timeout_ms)
}

fn run(
    controller: &mut MotionController<SerialTransport>,
    command: Command,
    timeout_ms: u32,
) -> Result<()> {
    let outcome = match command {
        Command::Init => controller.apply_command(MotorCommand::Init { motor: 0 })?,
        Command::SetMsr { resolution } => {
            controller.apply_command(MotorCommand::SetMicrostepResolution {
                motor: 0,
                resolution,
            })?
        }
        Command::Rotate { velocity } => {
            controller.apply_command(MotorCommand::Rotate { motor: 0, velocity })?
        }
        Command::Stop => controller.apply_command(MotorCommand::Stop { motor: 0 })?,
        Command::Reset => controller.apply_command(MotorCommand::ResetPosition { motor: 0 })?,
        Command::MoveToAngle { angle } => {
            controller.apply_command(MotorCommand::MoveToAngle { motor: 0, angle })?
        }
        Command::MoveByAngle { angle } => {
            controller.apply_command(MotorCommand::MoveByAngle { motor: 0, angle })?
        }
        Command::Temp => controller.apply_command(MotorCommand::Temperature { motor: 0 })?,
        Command::Volt => controller.apply_command(MotorCommand::Voltage { motor: 0 })?,
        Command::Msr => {
            let client = controller.client_mut(0).context("no motor configured")?;
            let reply = client.get_microstep_resolution(timeout_ms);
            let resolution = check(reply.status, reply.value, "get microstep resolution")?;
            println!(
                "microstep resolution: {} ({} microsteps)",
                u8::from(resolution),
                resolution.microsteps()
            );
            return Ok(());
        }
        Command::Position => {
            let client = controller.client_mut(0).context("no motor configured")?;
            let reply = client.get_actual_position(timeout_ms);
            println!("position: {}", check(reply.status, reply.value, "get position")?);
            return Ok(());
        }
        Command::SetPosition { position } => {
            let client = controller.client_mut(0).context("no motor configured")?;
            let status = client.set_actual_position(position, timeout_ms);
            return check(status, Some(()), "set position");
        }
        Command::MoveTo { position, relative } => {
            let movement = if relative {
                MovementType::Relative
            } else {
                MovementType::Absolute
            };
            let client = controller.client_mut(0).context("no motor configured")?;
            let status = client.move_to_position(position, movement, 0, timeout_ms);
            return check(status, Some(()), "move");
        }
        Command::Firmware => {
            let client = controller.client_mut(0).context("no motor configured")?;
            let reply = client.get_firmware_version(timeout_ms);
            let version = check(reply.status, reply.value, "get firmware version")?;
            println!("firmware: 0x{:08x}", version);
            return Ok(());
        }
    };

    debug!("outcome: {:?}", outcome);
    let value = check(outcome.status, Some(outcome.value), "command")?;
    if let Some(value) = value {
        println!("{}", value);
    }
    Ok(())
}

/// Turn a device status into an error unless it is success.
fn check<V>(status: Status, value: Option<V>, what: &str) -> Result<V> {
    match value {
        Some(value) if status.is_success() => Ok(value),
        _ => bail!("{} failed: {}", what, status),
    }
}
