use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use pzemlink_core::protocol::{decode_ack, decode_quantity, encode_command, parse_response};
use pzemlink_core::{
    Command, DEFAULT_BAUD_RATE, DeviceAddress, EmulatedMeter, MonotonicClock, Pzem, PzemConfig,
    PzemError, Quantity, Reading, Transport, TransportError,
};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::EnvFilter;

mod serial;

use serial::SerialTransport;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("PZEMLINK_BUILD_COMMIT"),
    " ",
    env!("PZEMLINK_BUILD_DATE"),
    ")"
);

/// Address an unconfigured emulated meter answers to.
const EMULATED_ADDRESS: DeviceAddress = DeviceAddress::new([192, 168, 1, 1]);

#[derive(Parser, Debug)]
#[command(name = "pzemlink")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Query and configure PZEM-004T energy meters over a serial line.",
    long_about = None,
    after_help = "Examples:\n  pzemlink read --port /dev/ttyUSB0 --address 192.168.1.1\n  pzemlink read --port /dev/ttyUSB0 --address 192.168.1.1 --quantity voltage\n  pzemlink set-alarm --port /dev/ttyUSB0 --address 192.168.1.1 20\n  pzemlink frame encode voltage --address 192.168.1.1"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read one or all measurements from a meter.
    Read {
        #[command(flatten)]
        link: LinkArgs,

        /// Meter address in dotted form
        #[arg(short, long)]
        address: DeviceAddress,

        /// Measurement to read
        #[arg(short, long, value_enum, default_value_t = QuantityArg::All)]
        quantity: QuantityArg,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output
        #[arg(long, requires = "json")]
        pretty: bool,
    },
    /// Assign a new address to the meter on the bus.
    ///
    /// Connect only the meter being configured: every meter on the bus
    /// accepts this command.
    SetAddress {
        #[command(flatten)]
        link: LinkArgs,

        /// New address in dotted form
        new_address: DeviceAddress,
    },
    /// Set the power alarm threshold of a meter.
    SetAlarm {
        #[command(flatten)]
        link: LinkArgs,

        /// Meter address in dotted form
        #[arg(short, long)]
        address: DeviceAddress,

        /// Threshold byte sent to the meter (0-255)
        threshold: u8,
    },
    /// Build or check raw frames without touching a serial port.
    Frame {
        #[command(subcommand)]
        command: FrameCommands,
    },
    /// List serial ports.
    Ports,
}

#[derive(Subcommand, Debug)]
enum FrameCommands {
    /// Print the command frame for an operation as hex.
    Encode {
        #[arg(value_enum)]
        command: CommandArg,

        /// Meter address in dotted form
        #[arg(short, long)]
        address: DeviceAddress,

        /// Payload byte (alarm threshold)
        #[arg(short, long, default_value_t = 0)]
        payload: u8,
    },
    /// Validate a hex response frame and print its value.
    Decode {
        /// Response bytes as hex; spaces are ignored
        hex: String,

        /// Operation the response answers
        #[arg(short, long, value_enum)]
        expect: CommandArg,
    },
}

#[derive(Args, Debug)]
struct LinkArgs {
    /// Serial port the meter is attached to
    #[arg(long, required_unless_present = "emulate", conflicts_with = "emulate")]
    port: Option<String>,

    /// Talk to an in-process emulated meter instead of a serial port
    #[arg(long)]
    emulate: bool,

    /// Serial line speed
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Response timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum QuantityArg {
    Voltage,
    Current,
    Power,
    Energy,
    All,
}

impl QuantityArg {
    fn quantity(self) -> Option<Quantity> {
        match self {
            QuantityArg::Voltage => Some(Quantity::Voltage),
            QuantityArg::Current => Some(Quantity::Current),
            QuantityArg::Power => Some(Quantity::Power),
            QuantityArg::Energy => Some(Quantity::Energy),
            QuantityArg::All => None,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CommandArg {
    Voltage,
    Current,
    Power,
    Energy,
    SetAddress,
    PowerAlarm,
}

impl From<CommandArg> for Command {
    fn from(value: CommandArg) -> Self {
        match value {
            CommandArg::Voltage => Command::Voltage,
            CommandArg::Current => Command::Current,
            CommandArg::Power => Command::Power,
            CommandArg::Energy => Command::Energy,
            CommandArg::SetAddress => Command::SetAddress,
            CommandArg::PowerAlarm => Command::PowerAlarm,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Read {
            link,
            address,
            quantity,
            json,
            pretty,
        } => cmd_read(&link, address, quantity, json, pretty),
        Commands::SetAddress { link, new_address } => cmd_set_address(&link, new_address),
        Commands::SetAlarm {
            link,
            address,
            threshold,
        } => cmd_set_alarm(&link, address, threshold),
        Commands::Frame { command } => match command {
            FrameCommands::Encode {
                command,
                address,
                payload,
            } => cmd_frame_encode(command.into(), address, payload),
            FrameCommands::Decode { hex, expect } => cmd_frame_decode(&hex, expect.into()),
        },
        Commands::Ports => cmd_ports(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

impl From<PzemError> for CliError {
    fn from(err: PzemError) -> Self {
        let hint = match &err {
            PzemError::Timeout { .. } | PzemError::Framing { .. } => {
                Some("check wiring, the meter address and --baud".to_string())
            }
            PzemError::Checksum { .. } => Some("line noise: retry the request".to_string()),
            PzemError::TagMismatch { .. } => {
                Some("another meter may be answering; check addresses on the bus".to_string())
            }
            PzemError::Transport(TransportError::Disconnected) => {
                Some("the serial adapter went away; reconnect it and retry".to_string())
            }
            PzemError::Protocol(_) | PzemError::Transport(_) => None,
        };
        CliError::new(format!("meter request failed: {err}"), hint)
    }
}

fn open_link(link: &LinkArgs) -> Result<Pzem<Box<dyn Transport>>, CliError> {
    let transport: Box<dyn Transport> = if link.emulate {
        Box::new(EmulatedMeter::new(
            EMULATED_ADDRESS,
            Reading::new(230.5, 1.25, 288.0, 300.0),
        ))
    } else {
        let path = link.port.as_deref().ok_or_else(|| {
            CliError::new(
                "missing serial port",
                Some("use --port <PATH> or --emulate".to_string()),
            )
        })?;
        let port = SerialTransport::open(path, link.baud)
            .with_context(|| format!("Failed to open serial port: {path}"))?;
        Box::new(port)
    };
    let config = PzemConfig {
        timeout: Duration::from_millis(link.timeout_ms),
    };
    Ok(Pzem::with_config(transport, MonotonicClock::new(), config))
}

#[derive(Serialize)]
struct ReadingReport {
    address: DeviceAddress,
    timestamp: String,
    #[serde(flatten)]
    values: ReportValues,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ReportValues {
    All(Reading),
    Single {
        quantity: String,
        value: f64,
        unit: &'static str,
    },
}

fn cmd_read(
    link: &LinkArgs,
    address: DeviceAddress,
    quantity: QuantityArg,
    json: bool,
    pretty: bool,
) -> Result<(), CliError> {
    let mut pzem = open_link(link)?;
    let values = match quantity.quantity() {
        Some(q) => ReportValues::Single {
            quantity: q.to_string(),
            value: pzem.read(q, address)?,
            unit: q.unit(),
        },
        None => ReportValues::All(pzem.read_all(address)?),
    };

    if json {
        let report = ReadingReport {
            address,
            timestamp: now_rfc3339()?,
            values,
        };
        let out = if pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        }
        .context("JSON serialization failed")?;
        println!("{out}");
        return Ok(());
    }

    match values {
        ReportValues::All(reading) => {
            for q in Quantity::ALL {
                println!("{}", format_value(q, reading.get(q)));
            }
        }
        ReportValues::Single { value, .. } => {
            if let Some(q) = quantity.quantity() {
                println!("{}", format_value(q, value));
            }
        }
    }
    Ok(())
}

fn cmd_set_address(link: &LinkArgs, new_address: DeviceAddress) -> Result<(), CliError> {
    let mut pzem = open_link(link)?;
    if !pzem.set_address(new_address)? {
        return Err(not_acknowledged(Command::SetAddress));
    }
    println!("OK: meter address set to {new_address}");
    Ok(())
}

fn cmd_set_alarm(link: &LinkArgs, address: DeviceAddress, threshold: u8) -> Result<(), CliError> {
    let mut pzem = open_link(link)?;
    if !pzem.set_power_alarm(address, threshold)? {
        return Err(not_acknowledged(Command::PowerAlarm));
    }
    println!("OK: power alarm of {address} set to {threshold}");
    Ok(())
}

fn not_acknowledged(command: Command) -> CliError {
    CliError::new(
        format!("meter did not acknowledge {command}"),
        Some("retry the request".to_string()),
    )
}

fn cmd_frame_encode(command: Command, address: DeviceAddress, payload: u8) -> Result<(), CliError> {
    let frame = encode_command(command, address, payload);
    println!("{}", hex::encode(frame.to_bytes()));
    Ok(())
}

fn cmd_frame_decode(input: &str, expect: Command) -> Result<(), CliError> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);
    let bytes = hex::decode(compact).map_err(|err| {
        CliError::new(
            format!("invalid hex input '{input}': {err}"),
            Some("pass 6 bytes, e.g. 'a0 00 e6 05 00 8b'".to_string()),
        )
    })?;
    let frame = parse_response(&bytes, expect.response_tag()).map_err(|err| {
        CliError::new(
            format!("invalid {expect} response: {err}"),
            Some(format!(
                "expected 6 bytes starting with tag {:#04x}",
                expect.response_tag()
            )),
        )
    })?;

    match Quantity::from_command(expect) {
        Some(q) => println!("{}", format_value(q, decode_quantity(q, &frame.data))),
        None if decode_ack(&frame.data) => println!("{expect}: ack"),
        None => println!("{expect}: nack"),
    }
    Ok(())
}

fn cmd_ports() -> Result<(), CliError> {
    let ports = serialport::available_ports().context("Could not enumerate serial ports")?;
    if ports.is_empty() {
        return Err(CliError::new(
            "no serial ports found",
            Some("check that the USB-serial adapter is plugged in".to_string()),
        ));
    }
    for port in ports {
        println!("{}", port.port_name);
    }
    Ok(())
}

fn format_value(quantity: Quantity, value: f64) -> String {
    format!(
        "{quantity}: {value:.prec$} {unit}",
        prec = quantity.precision(),
        unit = quantity.unit()
    )
}

fn now_rfc3339() -> Result<String, CliError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("timestamp formatting failed")
        .map_err(Into::into)
}
