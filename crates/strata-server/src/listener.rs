use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::connection::serve_connection;
use crate::error::{ServerError, ServerResult};
use crate::service::LineService;

/// Pause after a failed `accept` (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A bound TCP listener serving one [`LineService`].
pub struct ServiceListener<S: LineService> {
    listener: TcpListener,
    service: Arc<S>,
    max_line_bytes: usize,
}

impl<S: LineService> ServiceListener<S> {
    pub async fn bind(addr: SocketAddr, service: S, max_line_bytes: usize) -> ServerResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            service: Arc::new(service),
            max_line_bytes,
        })
    }

    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Accept connections forever, one task per connection.
    ///
    /// Accept failures and connection faults are logged and never stop the
    /// listener.
    pub async fn run(self) -> ServerResult<()> {
        let name = self.service.name();
        let local = self.local_addr()?;
        info!(service = name, %local, "listening");

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(service = name, %err, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            if let Err(err) = stream.set_nodelay(true) {
                debug!(%peer, %err, "could not disable nagle");
            }

            let service = Arc::clone(&self.service);
            let max_line_bytes = self.max_line_bytes;
            let span = info_span!("connection", service = name, %peer);
            tokio::spawn(
                async move {
                    debug!("accepted");
                    match serve_connection(service, stream, max_line_bytes).await {
                        Ok(stats) => debug!(commands = stats.commands, bytes = stats.bytes_read, "closed"),
                        Err(ServerError::Io(err)) => debug!(%err, "connection dropped"),
                        Err(err) => warn!(%err, "connection terminated"),
                    }
                }
                .instrument(span),
            );
        }
    }
}

impl<S: LineService> std::fmt::Debug for ServiceListener<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceListener")
            .field("service", &self.service.name())
            .field("local_addr", &self.listener.local_addr().ok())
            .field("max_line_bytes", &self.max_line_bytes)
            .finish()
    }
}
