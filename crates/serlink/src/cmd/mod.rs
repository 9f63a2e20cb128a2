use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serlink_message::{Field, Message, MessageError};
use serlink_peer::ExchangeConfig;

use crate::exit::{message_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one message and wait for the acknowledgement.
    Send(SendArgs),
    /// Accept messages and acknowledge them.
    Listen(ListenArgs),
    /// Build a message and print its frame.
    Encode(EncodeArgs),
    /// Decode and verify a frame.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Header values and fields of an outbound message.
#[derive(Args, Debug, Clone)]
pub struct MessageArgs {
    /// Task value (0-127).
    #[arg(long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..=127))]
    pub task: u8,
    /// Clear the success flag.
    #[arg(long)]
    pub failed: bool,
    /// Message type byte.
    #[arg(long = "type", default_value = "0")]
    pub msg_type: u8,
    /// Message number.
    #[arg(long, default_value = "1")]
    pub number: u8,
    /// Total quantity.
    #[arg(long, default_value = "1")]
    pub total: u8,
    /// Payload field as KIND:VALUE (u8, u16, i16, u32, i32, bool, char, str,
    /// hex, int, float). Repeatable.
    #[arg(long = "field", short = 'f', value_name = "KIND:VALUE")]
    pub fields: Vec<FieldArg>,
}

impl MessageArgs {
    /// Set the type byte and append every field to `message`.
    pub fn fill(&self, message: &mut Message) -> CliResult<()> {
        message.set_msg_type(self.msg_type);
        for arg in &self.fields {
            message
                .append(arg.field.clone())
                .map_err(|err| message_error(&format!("field {arg}"), err))?;
        }
        Ok(())
    }

    /// Fill a fresh message and serialize it with its checksum.
    pub fn build(&self, mut message: Message) -> CliResult<(Message, Vec<u8>)> {
        self.fill(&mut message)?;
        let raw = message
            .build(self.task, !self.failed, self.number, self.total)
            .map_err(|err| message_error("build failed", err))?;
        Ok((message, raw.to_vec()))
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Socket path to connect to.
    #[arg(required_unless_present = "device", conflicts_with = "device")]
    pub path: Option<PathBuf>,
    /// Device node to open instead of a socket (already configured).
    #[arg(long, value_name = "PATH")]
    pub device: Option<PathBuf>,
    #[command(flatten)]
    pub message: MessageArgs,
    /// Send cycles before giving up.
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..))]
    pub retries: u32,
    /// Reply read timeout (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub timeout: String,
    /// Pause between writing a frame and reading the reply (e.g. 50ms).
    #[arg(long, default_value = "50ms")]
    pub quiet: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket path to bind.
    #[arg(required_unless_present = "device", conflicts_with = "device")]
    pub path: Option<PathBuf>,
    /// Device node to read instead of a socket (already configured).
    #[arg(long, value_name = "PATH")]
    pub device: Option<PathBuf>,
    /// Exit after accepting N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Line read timeout (e.g. 1s, 200ms).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub message: MessageArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame text, e.g. '#AgCFAQEBKjnS;'. Read from stdin when omitted.
    pub frame: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// A `KIND:VALUE` payload field argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldArg {
    text: String,
    pub field: Field,
}

impl std::fmt::Display for FieldArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for FieldArg {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (kind, value) = input
            .split_once(':')
            .ok_or_else(|| format!("expected KIND:VALUE, got '{input}'"))?;
        let field = parse_field(kind, value)?;
        Ok(Self {
            text: input.to_string(),
            field,
        })
    }
}

fn parse_field(kind: &str, value: &str) -> Result<Field, String> {
    let bad = |err: &dyn std::fmt::Display| format!("invalid {kind} value '{value}': {err}");
    let field = match kind {
        "u8" => Field::U8(value.parse::<u8>().map_err(|e| bad(&e))?),
        "u16" => Field::U16(value.parse::<u16>().map_err(|e| bad(&e))?),
        "i16" => Field::I16(value.parse::<i16>().map_err(|e| bad(&e))?),
        "u32" => Field::U32(value.parse::<u32>().map_err(|e| bad(&e))?),
        "i32" => Field::I32(value.parse::<i32>().map_err(|e| bad(&e))?),
        "bool" => Field::Bool(value.parse::<bool>().map_err(|e| bad(&e))?),
        "char" => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Field::Char(c as u8),
                _ => return Err(format!("char value must be one ASCII character: '{value}'")),
            }
        }
        "str" => Field::Str(value.to_string()),
        "hex" => Field::Bytes(parse_hex(value).map_err(|e| bad(&e))?),
        "int" => {
            let parsed = value.parse::<i64>().map_err(|e| bad(&e))?;
            Field::auto(parsed).map_err(|e: MessageError| bad(&e))?
        }
        "float" => {
            let parsed = value.parse::<f64>().map_err(|e| bad(&e))?;
            Field::truncated_float(parsed).map_err(|e: MessageError| bad(&e))?
        }
        other => return Err(format!("unknown field kind '{other}'")),
    };
    Ok(field)
}

fn parse_hex(input: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err("odd number of hex digits".to_string());
    }
    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).map_err(|e| e.to_string())?;
            u8::from_str_radix(text, 16).map_err(|e| e.to_string())
        })
        .collect()
}

/// Parse `2s`, `150ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

/// Exchange settings with the given read timeout and quiet interval.
pub fn exchange_config(read_timeout: Duration, quiet_interval: Duration) -> ExchangeConfig {
    let mut config = ExchangeConfig {
        quiet_interval,
        ..ExchangeConfig::default()
    };
    if !read_timeout.is_zero() {
        config.frame.read_timeout = Some(read_timeout);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_fields() {
        let arg: FieldArg = "u16:300".parse().expect("u16 should parse");
        assert_eq!(arg.field, Field::U16(300));
        let arg: FieldArg = "str:a:b".parse().expect("str keeps later colons");
        assert_eq!(arg.field, Field::Str("a:b".to_string()));
        let arg: FieldArg = "hex:01 ff".parse().expect("hex should parse");
        assert_eq!(arg.field, Field::Bytes(vec![0x01, 0xFF]));
        let arg: FieldArg = "char:A".parse().expect("char should parse");
        assert_eq!(arg.field, Field::Char(b'A'));
    }

    #[test]
    fn int_and_float_pick_legacy_widths() {
        let arg: FieldArg = "int:-5".parse().expect("int should parse");
        assert_eq!(arg.field, Field::I16(-5));
        let arg: FieldArg = "int:70000".parse().expect("int should parse");
        assert_eq!(arg.field, Field::I32(70_000));
        let arg: FieldArg = "float:-2.9".parse().expect("float should parse");
        assert_eq!(arg.field, Field::I32(-2));
    }

    #[test]
    fn rejects_malformed_field_args() {
        assert!("42".parse::<FieldArg>().is_err());
        assert!("u8:256".parse::<FieldArg>().is_err());
        assert!("hex:abc".parse::<FieldArg>().is_err());
        assert!("char:ab".parse::<FieldArg>().is_err());
        assert!("f64:1.0".parse::<FieldArg>().is_err());
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("0ms").unwrap(), Duration::ZERO);
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn zero_timeout_means_blocking() {
        let cfg = exchange_config(Duration::ZERO, Duration::from_millis(10));
        assert_eq!(cfg.frame.read_timeout, None);
        assert_eq!(cfg.quiet_interval, Duration::from_millis(10));
    }

    #[test]
    fn build_echo_message() {
        let args = MessageArgs {
            task: 5,
            failed: false,
            msg_type: 0,
            number: 1,
            total: 1,
            fields: vec!["u8:42".parse().expect("u8 should parse")],
        };
        let (_, raw) = args.build(Message::new()).expect("echo should build");
        assert_eq!(raw, [2, 0, 0x85, 1, 1, 1, 42, 0x39, 0xD2]);
    }
}
