use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use pipelink_client::{ConnectionConfig, PipeClient, PipeMode, DEFAULT_MAX_ATTEMPTS};
use pipelink_transport::DefaultConnector;

use crate::exit::{pipe_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod envinfo;
pub mod recv;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one message, optionally waiting for a reply.
    Send(SendArgs),
    /// Receive and print messages.
    Recv(RecvArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Recv(args) => recv::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ModeArg {
    Byte,
    Message,
}

impl From<ModeArg> for PipeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Byte => PipeMode::Byte,
            ModeArg::Message => PipeMode::Message,
        }
    }
}

/// Endpoint and retry settings shared by every connecting command.
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Endpoint name (joined onto the prefix unless --no-prefix).
    pub name: String,
    /// Namespace prefix joined before the name.
    #[arg(long, env = "PIPELINK_PREFIX")]
    pub prefix: Option<String>,
    /// Use the name as the full address.
    #[arg(long)]
    pub no_prefix: bool,
    /// Message delimiter byte (decimal, 0x hex, or a single character).
    #[arg(long, default_value = "0x0c", value_parser = parse_delimiter)]
    pub delimiter: u8,
    /// Delay before each connection attempt (e.g. 250ms, 1s).
    #[arg(long, default_value = "250ms")]
    pub retry_interval: String,
    /// How long one attempt waits on a busy endpoint (e.g. 15s).
    #[arg(long, default_value = "15s")]
    pub connect_timeout: String,
    /// Connection attempts before giving up.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
    /// Pipe read mode.
    #[arg(long, value_enum, default_value = "byte")]
    pub mode: ModeArg,
}

impl ConnectArgs {
    pub fn config(&self) -> CliResult<ConnectionConfig> {
        Ok(ConnectionConfig {
            include_address_prefix: !self.no_prefix,
            delimiter: self.delimiter,
            retry_interval: parse_duration(&self.retry_interval)?,
            connect_timeout: parse_duration(&self.connect_timeout)?,
            max_attempts: self.max_attempts,
            mode: self.mode.into(),
        })
    }

    /// Build a client and run the open sequence.
    pub fn connect(&self) -> CliResult<PipeClient<DefaultConnector>> {
        let config = self.config()?;
        let mut client = PipeClient::new();
        if let Some(prefix) = &self.prefix {
            client.set_prefix(prefix.clone());
        }
        client
            .connect(self.name.clone(), config)
            .map_err(|err| pipe_error("connect failed", err))?;
        Ok(client)
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// JSON payload (validated, then sent as text).
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub json: Option<String>,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["json", "file"])]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["json", "data"])]
    pub file: Option<PathBuf>,
    /// Wait for one reply message and print it.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug)]
pub struct RecvArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Number of messages to receive before exiting.
    #[arg(long, default_value_t = 1)]
    pub count: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}

/// Parse `250ms`, `15s`, or a bare number of seconds. Zero is allowed.
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
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Parse a delimiter given as decimal (`12`), hex (`0x0c`), or one ASCII character.
pub fn parse_delimiter(input: &str) -> Result<u8, String> {
    if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        return u8::from_str_radix(hex, 16).map_err(|_| format!("invalid hex byte: {input}"));
    }
    if let Ok(value) = input.parse::<u8>() {
        return Ok(value);
    }
    match input.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(format!(
            "delimiter must be a byte value or a single ASCII character: {input}"
        )),
    }
}
