use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serlink_message::Message;
use serlink_peer::SendReport;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FieldOutput {
    index: usize,
    hex: String,
    text: Option<String>,
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    event: &'a str,
    version: u8,
    msg_type: u8,
    task_value: u8,
    succeeded: bool,
    message_number: u8,
    total_quantity: u8,
    data_size: u8,
    checksum: String,
    fields: Vec<FieldOutput>,
    frame: Option<&'a str>,
    timestamp: String,
}

impl<'a> MessageOutput<'a> {
    fn new(event: &'a str, message: &Message, frame: Option<&'a str>) -> Self {
        let fields = message
            .payload()
            .fields()
            .into_iter()
            .enumerate()
            .map(|(index, bytes)| FieldOutput {
                index,
                hex: hex(&bytes),
                text: printable(&bytes),
            })
            .collect();
        Self {
            event,
            version: message.version(),
            msg_type: message.msg_type(),
            task_value: message.task_value(),
            succeeded: message.succeeded(),
            message_number: message.message_number(),
            total_quantity: message.total_quantity(),
            data_size: message.data_size(),
            checksum: format!("{:04X}", message.checksum()),
            fields,
            frame,
            timestamp: now_unix_seconds(),
        }
    }
}

/// Print a message. `frame` is its encoded text when one is at hand; raw
/// output writes the frame if given, else the field bytes.
pub fn print_message(event: &str, message: &Message, frame: Option<&str>, format: OutputFormat) {
    let out = MessageOutput::new(event, message, frame);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            table.add_row(vec!["event".to_string(), out.event.to_string()]);
            table.add_row(vec!["version".to_string(), out.version.to_string()]);
            table.add_row(vec!["type".to_string(), out.msg_type.to_string()]);
            table.add_row(vec!["task".to_string(), out.task_value.to_string()]);
            table.add_row(vec!["succeeded".to_string(), out.succeeded.to_string()]);
            table.add_row(vec![
                "number".to_string(),
                format!("{}/{}", out.message_number, out.total_quantity),
            ]);
            table.add_row(vec!["data size".to_string(), out.data_size.to_string()]);
            table.add_row(vec!["checksum".to_string(), out.checksum.clone()]);
            for field in &out.fields {
                table.add_row(vec![format!("[{}]", field.index), field_cell(field)]);
            }
            if let Some(frame) = out.frame {
                table.add_row(vec!["frame".to_string(), frame.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let fields: Vec<String> = out.fields.iter().map(field_cell).collect();
            println!(
                "{} task={} succeeded={} number={}/{} type={} checksum={} fields=[{}]",
                out.event,
                out.task_value,
                out.succeeded,
                out.message_number,
                out.total_quantity,
                out.msg_type,
                out.checksum,
                fields.join(", ")
            );
            if let Some(frame) = out.frame {
                println!("{frame}");
            }
        }
        OutputFormat::Raw => match frame {
            Some(frame) => print_raw(format!("{frame}\n").as_bytes()),
            None => print_raw(message.payload().as_bytes()),
        },
    }
}

#[derive(Serialize)]
struct SendOutput<'a> {
    event: &'a str,
    acked: bool,
    #[serde(flatten)]
    report: SendReport,
    timestamp: String,
}

pub fn print_send_report(report: SendReport, format: OutputFormat) {
    let acked = report.outcome.is_acked();
    match format {
        OutputFormat::Json => {
            let out = SendOutput {
                event: "sent",
                acked,
                report,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ACKED", "ATTEMPTS"])
                .add_row(vec![acked.to_string(), report.attempts.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!("acked={} attempts={}", acked, report.attempts);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn field_cell(field: &FieldOutput) -> String {
    match &field.text {
        Some(text) => format!("{} \"{}\"", field.hex, text),
        None => field.hex.clone(),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn printable(bytes: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(bytes).ok()?;
    if text.is_empty() || text.chars().any(char::is_control) {
        return None;
    }
    Some(text.to_string())
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
