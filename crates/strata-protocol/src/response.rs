use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};

pub const OK: &str = "OK";
pub const FAIL_PREFIX: &str = "FAIL: ";
pub const ERROR: &str = "ERROR";

/// One response line. Every variant encodes to exactly one newline-terminated line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// Bare text: an object id, or the index's JSON map.
    Line(String),
    /// An empty line (acknowledges an index registration).
    Empty,
    /// `OK`, optionally followed by a space and a body.
    Ok(Option<String>),
    /// `FAIL: <reason>` for operational failures.
    Fail(String),
    /// `ERROR` for malformed or unknown commands.
    Error,
}

impl Response {
    pub fn fail(reason: impl fmt::Display) -> Self {
        Self::Fail(reason.to_string())
    }

    /// Wire form, newline included.
    ///
    /// Always exactly one line: any newline inside a body or reason is
    /// replaced by a space. Services that cannot afford the rewrite (blob
    /// contents) must refuse such bodies before building the response.
    pub fn encode(&self) -> String {
        let mut out = match self {
            Self::Line(text) => flatten(text),
            Self::Empty => String::new(),
            Self::Ok(None) => OK.to_owned(),
            Self::Ok(Some(body)) => format!("{OK} {}", flatten(body)),
            Self::Fail(reason) => format!("{FAIL_PREFIX}{}", flatten(reason)),
            Self::Error => ERROR.to_owned(),
        };
        out.push('\n');
        out
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Decode a Storage service reply line (newline already stripped).
    pub fn decode_storage(line: &str) -> ProtocolResult<Self> {
        if line == OK {
            return Ok(Self::Ok(None));
        }
        if let Some(body) = line.strip_prefix("OK ") {
            return Ok(Self::Ok(Some(body.to_owned())));
        }
        if let Some(reason) = line.strip_prefix(FAIL_PREFIX) {
            return Ok(Self::Fail(reason.to_owned()));
        }
        if line == ERROR {
            return Ok(Self::Error);
        }
        Err(ProtocolError::MalformedReply(line.to_owned()))
    }

    /// Decode a Transport or Index reply line, where anything but `ERROR` is data.
    pub fn decode_text(line: &str) -> Self {
        match line {
            ERROR => Self::Error,
            "" => Self::Empty,
            text => Self::Line(text.to_owned()),
        }
    }
}

fn flatten(text: &str) -> String {
    text.replace('\n', " ")
}
