//! Minimal echo peer. Accepts one client and echoes each message back.
//!
//! Run with:
//!   cargo run --example echo-peer
//!
//! In another terminal (use the directory printed by the peer):
//!   cargo run --features cli -- send echo --prefix /tmp/pipelink-echo-<pid>/ \
//!     --data hello --wait

#[cfg(unix)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::fs;
    use std::os::unix::net::UnixListener;

    use pipelink::frame::{MessageReader, MessageWriter};

    let dir = std::env::temp_dir().join(format!("pipelink-echo-{}", std::process::id()));
    fs::create_dir_all(&dir)?;
    let path = dir.join("echo");
    let _ = fs::remove_file(&path);

    let listener = UnixListener::bind(&path)?;
    eprintln!("Listening on {}", path.display());

    let (mut stream, _) = listener.accept()?;
    eprintln!("Client connected");

    let mut reader = MessageReader::new();
    let mut writer = MessageWriter::new();
    loop {
        let message = reader.read_message(&mut stream)?;
        if !message.payload.is_empty() {
            eprintln!("Received {} bytes", message.payload.len());
            writer.write_message(&mut stream, &message.payload)?;
        }
        if !message.terminated {
            eprintln!("Client disconnected");
            break;
        }
    }

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}

#[cfg(not(unix))]
fn main() {
    eprintln!("echo-peer listens on a Unix domain socket and is not available on this platform");
}
