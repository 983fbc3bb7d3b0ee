use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pipelink_client::SendReport;
use pipelink_frame::Message;
use serde::Serialize;

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
struct MessageOutput<'a> {
    event: &'static str,
    address: &'a str,
    payload_size: usize,
    terminated: bool,
    payload: String,
    timestamp: String,
}

#[derive(Serialize)]
struct SendOutput<'a> {
    event: &'static str,
    address: &'a str,
    success: bool,
    bytes_written: usize,
    message: String,
    timestamp: String,
}

pub fn print_message(message: &Message, address: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                event: "message_received",
                address,
                payload_size: message.payload.len(),
                terminated: message.terminated,
                payload: payload_preview(message.payload.as_ref()),
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
                .set_header(vec!["ADDRESS", "SIZE", "TERMINATED", "PAYLOAD"])
                .add_row(vec![
                    address.to_string(),
                    message.payload.len().to_string(),
                    message.terminated.to_string(),
                    payload_preview(message.payload.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "address={} size={} terminated={} payload={}",
                address,
                message.payload.len(),
                message.terminated,
                payload_preview(message.payload.as_ref())
            );
        }
        OutputFormat::Raw => {
            print_raw(message.payload.as_ref());
        }
    }
}

pub fn print_send_report(report: &SendReport, address: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SendOutput {
                event: "message_sent",
                address,
                success: true,
                bytes_written: report.bytes_written,
                message: report.to_string(),
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
                .set_header(vec!["ADDRESS", "BYTES WRITTEN"])
                .add_row(vec![address.to_string(), report.bytes_written.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => println!("{report}"),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_marks_binary_payloads() {
        assert_eq!(payload_preview(b"pong"), "pong");
        assert_eq!(payload_preview(&[0xff, 0xfe, 0x00]), "<binary 3 bytes>");
    }

    #[test]
    fn message_output_serializes_termination() {
        let out = MessageOutput {
            event: "message_received",
            address: "/tmp/app",
            payload_size: 4,
            terminated: false,
            payload: "tail".to_string(),
            timestamp: "0".to_string(),
        };
        let json = serde_json::to_string(&out).expect("message output should serialize");
        assert!(json.contains("\"terminated\":false"));
        assert!(json.contains("\"address\":\"/tmp/app\""));
    }
}
