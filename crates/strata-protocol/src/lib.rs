//! Line protocol shared by the Strata services.
//!
//! Every service speaks the same framing: one ASCII command per
//! newline-terminated line, fields separated by a single space, and exactly
//! one newline-terminated response line per command, written in order on the
//! same connection. Payloads cannot contain spaces or newlines.

pub mod command;
pub mod error;
pub mod framer;
pub mod ports;
pub mod response;

pub use command::{
    validate_token, Command, IndexRequest, StorageRequest, TransportRequest, Verb, SEPARATOR,
};
pub use error::{ProtocolError, ProtocolResult};
pub use framer::LineFramer;
pub use ports::{DEFAULT_MAX_LINE_BYTES, INDEX_PORT, READ_CHUNK_SIZE, STORAGE_PORT, TRANSPORT_PORT};
pub use response::Response;
