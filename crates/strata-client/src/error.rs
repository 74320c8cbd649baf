use std::time::Duration;

use strata_index::PartitionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{peer} did not answer within {timeout:?}")]
    Timeout { peer: String, timeout: Duration },

    #[error("connection closed by {0}")]
    ConnectionClosed(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] strata_protocol::ProtocolError),

    #[error("index error: {0}")]
    Index(#[from] strata_index::IndexError),

    /// The peer answered `ERROR`.
    #[error("request rejected by {0}")]
    Rejected(String),

    /// The storage node answered `FAIL: <reason>`.
    #[error("storage failure: {0}")]
    Storage(String),

    #[error("no storage nodes registered in partition {0}")]
    NoStorageNodes(PartitionId),

    #[error("unexpected reply from {peer}: {reply:?}")]
    UnexpectedReply { peer: String, reply: String },
}

pub type ClientResult<T> = Result<T, ClientError>;
