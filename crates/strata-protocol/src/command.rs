use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};

/// Token separator. Exactly one ASCII space; runs of spaces produce empty tokens.
pub const SEPARATOR: char = ' ';

/// The verbs understood by every Strata service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    pub fn from_token(token: &str) -> ProtocolResult<Self> {
        match token {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            other => Err(ProtocolError::UnknownVerb(other.to_owned())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parsed command line: a verb followed by its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    pub args: Vec<String>,
}

impl Command {
    /// Split a line on single spaces. The line must not contain the trailing newline.
    pub fn parse(line: &str) -> ProtocolResult<Self> {
        if line.is_empty() {
            return Err(ProtocolError::EmptyCommand);
        }
        let mut tokens = line.split(SEPARATOR);
        let verb = Verb::from_token(tokens.next().unwrap_or_default())?;
        let args = tokens.map(str::to_owned).collect();
        Ok(Self { verb, args })
    }

    /// Number of tokens on the line, verb included.
    pub fn token_count(&self) -> usize {
        1 + self.args.len()
    }

    fn expect_tokens(&self, expected: usize) -> ProtocolResult<()> {
        if self.token_count() != expected {
            return Err(ProtocolError::Arity {
                verb: self.verb,
                expected,
                actual: self.token_count(),
            });
        }
        Ok(())
    }

    fn into_args<const N: usize>(self) -> ProtocolResult<[String; N]> {
        self.expect_tokens(N + 1)?;
        let actual = self.token_count();
        let verb = self.verb;
        self.args
            .try_into()
            .map_err(|_| ProtocolError::Arity { verb, expected: N + 1, actual })
    }
}

/// Reject values the line framing cannot carry: empty tokens and tokens with
/// spaces or newlines.
pub fn validate_token(token: &str) -> ProtocolResult<()> {
    if token.is_empty() || token.contains([SEPARATOR, '\n']) {
        return Err(ProtocolError::InvalidToken(token.to_owned()));
    }
    Ok(())
}

/// Requests accepted by the Transport service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportRequest {
    Get { id: String },
    Post { payload: String },
}

impl TransportRequest {
    pub fn parse(line: &str) -> ProtocolResult<Self> {
        Command::parse(line)?.try_into()
    }
}

impl TryFrom<Command> for TransportRequest {
    type Error = ProtocolError;

    fn try_from(cmd: Command) -> ProtocolResult<Self> {
        let verb = cmd.verb;
        let [arg] = cmd.into_args::<1>()?;
        Ok(match verb {
            Verb::Get => Self::Get { id: arg },
            Verb::Post => Self::Post { payload: arg },
        })
    }
}

impl fmt::Display for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get { id } => write!(f, "GET {id}"),
            Self::Post { payload } => write!(f, "POST {payload}"),
        }
    }
}

/// Requests accepted by the Index service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexRequest {
    Get,
    /// Carries the raw JSON text; decoding belongs to the index.
    Post { descriptor: String },
}

impl IndexRequest {
    pub fn parse(line: &str) -> ProtocolResult<Self> {
        Command::parse(line)?.try_into()
    }
}

impl TryFrom<Command> for IndexRequest {
    type Error = ProtocolError;

    fn try_from(cmd: Command) -> ProtocolResult<Self> {
        match cmd.verb {
            Verb::Get => {
                cmd.expect_tokens(1)?;
                Ok(Self::Get)
            }
            Verb::Post => {
                let [descriptor] = cmd.into_args::<1>()?;
                Ok(Self::Post { descriptor })
            }
        }
    }
}

impl fmt::Display for IndexRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post { descriptor } => write!(f, "POST {descriptor}"),
        }
    }
}

/// Requests accepted by the Storage service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageRequest {
    Get { path: String },
    Post { path: String, body: String },
}

impl StorageRequest {
    pub fn parse(line: &str) -> ProtocolResult<Self> {
        Command::parse(line)?.try_into()
    }
}

impl TryFrom<Command> for StorageRequest {
    type Error = ProtocolError;

    fn try_from(cmd: Command) -> ProtocolResult<Self> {
        match cmd.verb {
            Verb::Get => {
                let [path] = cmd.into_args::<1>()?;
                Ok(Self::Get { path })
            }
            Verb::Post => {
                let [path, body] = cmd.into_args::<2>()?;
                Ok(Self::Post { path, body })
            }
        }
    }
}

impl fmt::Display for StorageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get { path } => write!(f, "GET {path}"),
            Self::Post { path, body } => write!(f, "POST {path} {body}"),
        }
    }
}
