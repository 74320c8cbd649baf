use thiserror::Error;

use crate::command::Verb;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty command")]
    EmptyCommand,

    #[error("unknown verb: {0:?}")]
    UnknownVerb(String),

    #[error("{verb} expects {expected} tokens, got {actual}")]
    Arity { verb: Verb, expected: usize, actual: usize },

    #[error("token cannot be sent on the wire: {0:?}")]
    InvalidToken(String),

    #[error("line too long: {size} bytes buffered (max {max})")]
    LineTooLong { size: usize, max: usize },

    #[error("malformed reply: {0:?}")]
    MalformedReply(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
