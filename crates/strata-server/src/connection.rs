use std::sync::Arc;
use std::time::Duration;

use strata_protocol::{LineFramer, Response, READ_CHUNK_SIZE};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::ServerResult;
use crate::service::LineService;

/// How long to keep reading after an oversized line before dropping the
/// socket. Closing with unread input makes the kernel reset the connection,
/// which can discard the `ERROR` reply before the peer reads it.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

/// Counters for one finished connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub bytes_read: u64,
    pub commands: u64,
}

/// Drive one connection to completion.
///
/// Reads chunks, frames them into lines, and answers every complete line in
/// order before reading again. A line that outgrows `max_line_bytes` gets a
/// single `ERROR`, the write side is shut, pending input is drained for a
/// short while, and the connection is dropped. An unterminated fragment left
/// at end of stream is discarded. Write failures (peer gone) end the
/// connection with an I/O error.
pub async fn serve_connection<S, IO>(
    service: Arc<S>,
    mut io: IO,
    max_line_bytes: usize,
) -> ServerResult<ConnectionStats>
where
    S: LineService,
    IO: AsyncRead + AsyncWrite + Unpin + Send,
{
    let mut session = service.open_session();
    let mut framer = LineFramer::new(max_line_bytes);
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    let mut stats = ConnectionStats::default();

    loop {
        let n = io.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        stats.bytes_read += n as u64;

        for line in framer.push(&chunk[..n]) {
            let response = service.handle(&mut session, &line).await;
            io.write_all(response.encode().as_bytes()).await?;
            stats.commands += 1;
        }

        if let Err(err) = framer.check_capacity() {
            warn!(service = service.name(), %err, "closing connection");
            io.write_all(Response::Error.encode().as_bytes()).await?;
            io.shutdown().await?;
            let drained = drain(&mut io, &mut chunk).await;
            debug!(service = service.name(), drained, "discarded input after oversized line");
            return Err(err.into());
        }
    }

    if let Some(fragment) = framer.finish() {
        debug!(
            service = service.name(),
            bytes = fragment.len(),
            "discarding unterminated fragment at end of stream"
        );
    }
    io.flush().await?;
    Ok(stats)
}

/// Read and discard until end of stream, an error, or [`DRAIN_TIMEOUT`].
/// Returns the number of bytes thrown away.
async fn drain<IO>(io: &mut IO, chunk: &mut [u8]) -> u64
where
    IO: AsyncRead + Unpin,
{
    let mut drained = 0u64;
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
    loop {
        match tokio::time::timeout_at(deadline, io.read(chunk)).await {
            Ok(Ok(n)) if n > 0 => drained += n as u64,
            _ => return drained,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerError;
    use crate::index::IndexService;
    use crate::storage::StorageService;
    use crate::transport::TransportService;
    use async_trait::async_trait;
    use strata_protocol::ProtocolError;
    use strata_store::{BlobStore, InMemoryBlobStore, StoreResult};
    use tokio::io::{duplex, AsyncBufReadExt, BufReader};
    use tokio::sync::Notify;

    /// Holds every write until `release` is notified.
    #[derive(Default)]
    struct GatedStore {
        inner: InMemoryBlobStore,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl BlobStore for GatedStore {
        async fn read(&self, key: &str) -> StoreResult<Vec<u8>> {
            self.inner.read(key).await
        }

        async fn write(&self, key: &str, data: &[u8]) -> StoreResult<()> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.write(key, data).await
        }
    }

    /// Send `chunks` one write at a time, close the write side, and collect
    /// everything the service wrote back.
    async fn exchange<S: LineService>(
        service: S,
        chunks: &[&[u8]],
        max_line_bytes: usize,
    ) -> (String, ServerResult<ConnectionStats>) {
        let (mut client, server) = duplex(64 * 1024);
        let task = tokio::spawn(serve_connection(Arc::new(service), server, max_line_bytes));
        for chunk in chunks {
            client.write_all(chunk).await.unwrap();
            tokio::task::yield_now().await;
        }
        client.shutdown().await.unwrap();
        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        (out, task.await.unwrap())
    }

    #[tokio::test]
    async fn one_response_per_line_in_order() {
        let (out, stats) = exchange(
            IndexService::default(),
            &[b"GET\nPUT\nPOST \"n:1\"\nGET\n"],
            1024,
        )
        .await;
        assert_eq!(
            out,
            "{\"0\":[\"localhost:12002\"]}\nERROR\n\n{\"0\":[\"localhost:12002\",\"n:1\"]}\n"
        );
        let stats = stats.unwrap();
        assert_eq!(stats.commands, 4);
    }

    #[tokio::test]
    async fn command_split_across_chunks() {
        let (out, stats) = exchange(TransportService::default(), &[b"PO", b"ST hello\n"], 1024).await;
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 5);
        assert_eq!(stats.unwrap().commands, 1);
    }

    #[tokio::test]
    async fn trailing_fragment_is_discarded() {
        let (out, stats) = exchange(TransportService::default(), &[b"GET abcde\nGET xy"], 1024).await;
        assert_eq!(out, "abcde\n");
        assert_eq!(stats.unwrap().commands, 1);
    }

    #[tokio::test]
    async fn malformed_lines_get_error() {
        let (out, _) = exchange(TransportService::default(), &[b"\nFOO bar\nGET\n"], 1024).await;
        assert_eq!(out, "ERROR\nERROR\nERROR\n");
    }

    #[tokio::test]
    async fn oversized_line_closes_connection() {
        let (out, result) = exchange(
            TransportService::default(),
            &[b"GET ok\n", b"POST 0123456789abcdef"],
            8,
        )
        .await;
        assert_eq!(out, "ok\nERROR\n");
        assert!(matches!(
            result,
            Err(ServerError::Protocol(ProtocolError::LineTooLong { max: 8, .. }))
        ));
    }

    #[tokio::test]
    async fn responses_arrive_before_next_chunk() {
        let (client, server) = duplex(1024);
        let task = tokio::spawn(serve_connection(
            Arc::new(TransportService::default()),
            server,
            1024,
        ));
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut lines = BufReader::new(read_half).lines();

        write_half.write_all(b"GET a\nGET b\nGET c\n").await.unwrap();
        for expected in ["a", "b", "c"] {
            assert_eq!(lines.next_line().await.unwrap().as_deref(), Some(expected));
        }
        write_half.write_all(b"GET d\n").await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("d"));

        write_half.shutdown().await.unwrap();
        assert_eq!(lines.next_line().await.unwrap(), None);
        assert_eq!(task.await.unwrap().unwrap().commands, 4);
    }

    #[tokio::test]
    async fn peer_gone_mid_command_still_completes_write() {
        let store = Arc::new(GatedStore::default());
        let service = Arc::new(StorageService::new(store.clone()));

        let (mut client, server) = duplex(1024);
        let task = tokio::spawn(serve_connection(Arc::clone(&service), server, 1024));
        client.write_all(b"POST k v\n").await.unwrap();
        store.entered.notified().await;
        drop(client);
        store.release.notify_one();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(ServerError::Io(_))), "{result:?}");
        assert_eq!(store.inner.read("k").await.unwrap(), b"v");

        let (client, server) = duplex(1024);
        let task = tokio::spawn(serve_connection(service, server, 1024));
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut lines = BufReader::new(read_half).lines();
        write_half.write_all(b"GET k\n").await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("OK v"));
        write_half.shutdown().await.unwrap();
        assert_eq!(task.await.unwrap().unwrap().commands, 1);
    }

    #[tokio::test]
    async fn input_after_oversized_line_is_drained() {
        let (mut client, server) = duplex(256);
        let task = tokio::spawn(serve_connection(
            Arc::new(TransportService::default()),
            server,
            8,
        ));
        // Larger than the pipe: only completes if the server keeps reading.
        client.write_all(&vec![b'x'; 4096]).await.unwrap();
        client.shutdown().await.unwrap();
        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "ERROR\n");
        assert!(matches!(
            task.await.unwrap(),
            Err(ServerError::Protocol(ProtocolError::LineTooLong { .. }))
        ));
    }
}
