use std::fs;

use crate::cmd::SendArgs;
use crate::exit::{io_error, pipe_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, print_send_report, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let mut client = args.connect.connect()?;
    let address = client.address();

    let report = client
        .send_bytes(&payload)
        .map_err(|err| pipe_error("send failed", err))?;
    if report.bytes_written < payload.len() + 1 {
        tracing::warn!(
            bytes_written = report.bytes_written,
            expected = payload.len() + 1,
            "short write"
        );
    }

    if args.wait {
        let reply = client
            .receive_message()
            .map_err(|err| pipe_error("receive failed", err))?;
        print_message(&reply, &address, format);
    } else {
        print_send_report(&report, &address, format);
    }

    client.close();
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(json) = &args.json {
        serde_json::from_str::<serde_json::Value>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return Ok(json.as_bytes().to_vec());
    }
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{ConnectArgs, ModeArg};

    fn args() -> SendArgs {
        SendArgs {
            connect: ConnectArgs {
                name: "app".to_string(),
                prefix: None,
                no_prefix: false,
                delimiter: 0x0C,
                retry_interval: "1ms".to_string(),
                connect_timeout: "1s".to_string(),
                max_attempts: 1,
                mode: ModeArg::Byte,
            },
            json: None,
            data: None,
            file: None,
            wait: false,
        }
    }

    #[test]
    fn json_payload_must_parse() {
        let mut bad = args();
        bad.json = Some("{not json".to_string());
        let err = resolve_payload(&bad).unwrap_err();
        assert_eq!(err.code, USAGE);

        let mut good = args();
        good.json = Some(r#"{"type":"message","data":"hi"}"#.to_string());
        assert_eq!(
            resolve_payload(&good).unwrap(),
            br#"{"type":"message","data":"hi"}"#.to_vec()
        );
    }

    #[test]
    fn data_and_empty_payloads() {
        let mut with_data = args();
        with_data.data = Some("ping".to_string());
        assert_eq!(resolve_payload(&with_data).unwrap(), b"ping".to_vec());

        assert!(resolve_payload(&args()).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_reported() {
        let mut from_file = args();
        from_file.file = Some("/nonexistent/pipelink/payload".into());
        let err = resolve_payload(&from_file).unwrap_err();
        assert!(err.message.contains("failed reading"));
    }
}
