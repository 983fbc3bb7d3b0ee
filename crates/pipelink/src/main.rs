mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "pipelink", version, about = "Named-pipe client CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). RUST_LOG, when set, takes precedence.
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "PIPELINK_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "pipelink",
            "send",
            "tmp-app.world",
            "--data",
            "hello",
            "--max-attempts",
            "3",
        ])
        .expect("send args should parse");

        assert!(matches!(cli.command, Command::Send(_)));
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "pipelink",
            "send",
            "tmp-app.world",
            "--json",
            "{\"x\":1}",
            "--data",
            "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_recv_with_mode_and_delimiter() {
        let cli = Cli::try_parse_from([
            "pipelink",
            "recv",
            "tmp-app.world",
            "--mode",
            "message",
            "--delimiter",
            "0x0a",
            "--count",
            "2",
        ])
        .expect("recv args should parse");

        match cli.command {
            Command::Recv(args) => {
                assert_eq!(args.connect.delimiter, b'\n');
                assert_eq!(args.count, 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_delimiter() {
        let err = Cli::try_parse_from(["pipelink", "recv", "x", "--delimiter", "0x1ff"])
            .expect_err("oversized delimiter should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
