use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Default message delimiter: ASCII form feed.
pub const DEFAULT_DELIMITER: u8 = 0x0C;

/// Bytes requested from the stream per read call.
pub const READ_CHUNK_SIZE: usize = 512;

/// A message taken off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The message payload, without the delimiter.
    pub payload: Bytes,
    /// `false` when the stream ended before a delimiter arrived.
    pub terminated: bool,
}

impl Message {
    /// A message that ended with the delimiter.
    pub fn terminated(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            terminated: true,
        }
    }

    /// Whatever was left when the stream ended.
    pub fn unterminated(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            terminated: false,
        }
    }

    /// Payload decoded as text, replacing invalid UTF-8.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// The total wire size of this message (payload + delimiter if present).
    pub fn wire_size(&self) -> usize {
        self.payload.len() + usize::from(self.terminated)
    }
}

/// Encode a message into the wire format.
///
/// ```text
/// ┌──────────────────────────┬───────────┐
/// │ Payload (any length)     │ Delimiter │
/// │ must not hold delimiter  │ (1B)      │
/// └──────────────────────────┴───────────┘
/// ```
pub fn encode_message(payload: &[u8], delimiter: u8, dst: &mut BytesMut) {
    dst.reserve(payload.len() + 1);
    dst.put_slice(payload);
    dst.put_u8(delimiter);
}

/// Decode one message from a buffer.
///
/// Returns `None` if the buffer doesn't hold a delimiter yet. On success,
/// consumes the payload and its delimiter; trailing bytes stay in `src`.
pub fn decode_message(src: &mut BytesMut, delimiter: u8) -> Option<Bytes> {
    decode_message_from(src, delimiter, 0)
}

/// Like [`decode_message`], skipping the first `scan_from` bytes already
/// known to be delimiter-free.
pub(crate) fn decode_message_from(
    src: &mut BytesMut,
    delimiter: u8,
    scan_from: usize,
) -> Option<Bytes> {
    let start = scan_from.min(src.len());
    let offset = src[start..].iter().position(|&b| b == delimiter)?;
    let payload = src.split_to(start + offset).freeze();
    src.advance(1);
    Some(payload)
}
