use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::trace;

use crate::error::{ClientError, ClientResult};

/// How long to wait for a connect or a reply before giving up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connection to one Strata service: write a line, read a line.
pub struct LineClient {
    peer: String,
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    timeout: Duration,
}

impl LineClient {
    pub async fn connect(addr: &str) -> ClientResult<Self> {
        Self::connect_with_timeout(addr, DEFAULT_TIMEOUT).await
    }

    pub async fn connect_with_timeout(addr: &str, timeout: Duration) -> ClientResult<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::Timeout { peer: addr.to_owned(), timeout })??;
        stream.set_nodelay(true)?;
        let (read, writer) = stream.into_split();
        Ok(Self {
            peer: addr.to_owned(),
            lines: BufReader::new(read).lines(),
            writer,
            timeout,
        })
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Send one command line (without newline) and return the reply line.
    pub async fn request(&mut self, line: &str) -> ClientResult<String> {
        trace!(peer = %self.peer, %line, "request");
        self.writer.write_all(format!("{line}\n").as_bytes()).await?;
        let reply = tokio::time::timeout(self.timeout, self.lines.next_line())
            .await
            .map_err(|_| ClientError::Timeout { peer: self.peer.clone(), timeout: self.timeout })??;
        match reply {
            Some(reply) => {
                trace!(peer = %self.peer, %reply, "reply");
                Ok(reply)
            }
            None => Err(ClientError::ConnectionClosed(self.peer.clone())),
        }
    }
}

impl std::fmt::Debug for LineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineClient")
            .field("peer", &self.peer)
            .field("timeout", &self.timeout)
            .finish()
    }
}
