//! Delimiter-terminated message framing.
//!
//! Every message on the wire is an arbitrary byte sequence followed by a
//! single delimiter byte (form feed, `0x0C`, by default). The payload must
//! not contain the delimiter; the sender does not check.
//!
//! The reader keeps whatever follows a delimiter for the next call, so
//! several messages arriving in one read are all delivered.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_message, encode_message, Message, DEFAULT_DELIMITER, READ_CHUNK_SIZE};
pub use error::{FrameError, Result};
pub use reader::MessageReader;
pub use writer::MessageWriter;
