mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "serlink",
    version,
    about = "Checksummed, acknowledged messages over serial-style links"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
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
            "serlink",
            "send",
            "/tmp/test.sock",
            "--task",
            "5",
            "--field",
            "u8:42",
            "-f",
            "str:hello",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.message.task, 5);
                assert_eq!(args.message.fields.len(), 2);
                assert_eq!(args.retries, 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_socket_and_device_together() {
        let err = Cli::try_parse_from([
            "serlink",
            "send",
            "/tmp/test.sock",
            "--device",
            "/dev/ttyUSB0",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_task_above_seven_bits() {
        let err = Cli::try_parse_from(["serlink", "encode", "--task", "128"])
            .expect_err("task 128 should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_listen_with_device() {
        let cli = Cli::try_parse_from(["serlink", "listen", "--device", "/dev/ttyS0", "--count", "1"])
            .expect("listen args should parse");
        assert!(matches!(cli.command, Command::Listen(_)));
    }
}
