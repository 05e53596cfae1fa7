use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod bridge;
pub mod ports;
pub mod shell;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Relay traffic between the calculator and the server.
    Bridge(BridgeArgs),
    /// Open an interactive logged-in session with the server.
    Shell(ShellArgs),
    /// List attached serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Bridge(args) => bridge::run(args),
        Command::Shell(args) => shell::run(args),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct BridgeArgs {
    /// Server hostname or IP.
    #[arg(long, env = "CALCBRIDGE_ADDRESS", default_value = "tinethub.tkbstudios.com")]
    pub address: String,
    /// Server TCP port.
    #[arg(long, env = "CALCBRIDGE_PORT", default_value = "2052")]
    pub port: u16,
    /// Open this serial device directly instead of scanning for one.
    #[arg(long, value_name = "PATH")]
    pub port_path: Option<String>,
    /// Serial baud rate.
    #[arg(long, default_value = "9600")]
    pub baud_rate: u32,
    /// Exit instead of reopening the serial device after an I/O failure.
    #[arg(long)]
    pub no_reconnect: bool,
    /// Serial read idle timeout (e.g. 3s, 500ms).
    #[arg(long, default_value = "3s")]
    pub serial_timeout: String,
    /// TCP connect timeout (e.g. 10s).
    #[arg(long, default_value = "10s")]
    pub connect_timeout: String,
    /// Sleep between discovery and reconnect attempts (e.g. 1s).
    #[arg(long, default_value = "1s")]
    pub retry_interval: String,
}

#[derive(Args, Debug)]
pub struct ShellArgs {
    /// Server hostname or IP.
    #[arg(long, env = "CALCBRIDGE_ADDRESS", default_value = "tinethub.tkbstudios.com")]
    pub address: String,
    /// Server TCP port.
    #[arg(long, env = "CALCBRIDGE_PORT", default_value = "2052")]
    pub port: u16,
    /// Calculator ID used for login.
    #[arg(long, env = "CALC_ID")]
    pub calc_id: Option<String>,
    /// Account username used for login.
    #[arg(long, env = "USERNAME")]
    pub username: Option<String>,
    /// Session token used for login.
    #[arg(long, env = "TOKEN")]
    pub token: Option<String>,
    /// TCP connect timeout (e.g. 10s).
    #[arg(long, default_value = "10s")]
    pub connect_timeout: String,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
