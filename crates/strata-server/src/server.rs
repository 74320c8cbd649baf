use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::str::FromStr;

use tokio::task::JoinSet;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::index::IndexService;
use crate::listener::ServiceListener;
use crate::storage::StorageService;
use crate::transport::TransportService;

/// One of the three services a Strata process can host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    Transport,
    Index,
    Storage,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Transport, Tier::Index, Tier::Storage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Index => "index",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ServerError;

    fn from_str(s: &str) -> ServerResult<Self> {
        match s {
            "transport" => Ok(Self::Transport),
            "index" => Ok(Self::Index),
            "storage" => Ok(Self::Storage),
            other => Err(ServerError::Config(format!("unknown tier: {other}"))),
        }
    }
}

/// Hosts any subset of the Strata tiers in one process.
pub struct StrataServer {
    config: ServerConfig,
}

impl StrataServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the listeners for `tiers` and start accepting immediately.
    ///
    /// Fails without serving anything if any bind fails.
    pub async fn bind(self, tiers: &[Tier]) -> ServerResult<BoundServer> {
        let max = self.config.framing.max_line_bytes;
        let mut pending = Vec::new();
        let mut addrs = Vec::new();

        for &tier in tiers {
            let (addr, run) = match tier {
                Tier::Transport => {
                    let service = TransportService::new(self.config.transport.scope);
                    let l = ServiceListener::bind(self.config.transport.bind, service, max).await?;
                    (l.local_addr()?, Box::pin(l.run()) as RunFuture)
                }
                Tier::Index => {
                    let service = IndexService::with_seed_addrs(self.config.index.seed_nodes.clone());
                    let l = ServiceListener::bind(self.config.index.bind, service, max).await?;
                    (l.local_addr()?, Box::pin(l.run()) as RunFuture)
                }
                Tier::Storage => {
                    let service = StorageService::from_config(&self.config.storage)?;
                    let l = ServiceListener::bind(self.config.storage.bind, service, max).await?;
                    (l.local_addr()?, Box::pin(l.run()) as RunFuture)
                }
            };
            addrs.push((tier, addr));
            pending.push(run);
        }

        let mut tasks = JoinSet::new();
        for run in pending {
            tasks.spawn(run);
        }
        Ok(BoundServer { addrs, tasks })
    }

    /// Bind `tiers` and serve until `shutdown` resolves or a listener fails.
    pub async fn serve_until<F>(self, tiers: &[Tier], shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        self.bind(tiers).await?.run_until(shutdown).await
    }
}

type RunFuture = std::pin::Pin<Box<dyn Future<Output = ServerResult<()>> + Send>>;

/// Listeners that are bound and accepting.
pub struct BoundServer {
    addrs: Vec<(Tier, SocketAddr)>,
    tasks: JoinSet<ServerResult<()>>,
}

impl BoundServer {
    pub fn local_addr(&self, tier: Tier) -> Option<SocketAddr> {
        self.addrs.iter().find(|(t, _)| *t == tier).map(|(_, addr)| *addr)
    }

    pub fn tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        self.addrs.iter().map(|(tier, _)| *tier)
    }

    /// Serve until `shutdown` resolves. Returns early if a listener task ends.
    pub async fn run_until<F>(mut self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        for (tier, addr) in &self.addrs {
            info!(%tier, %addr, "serving");
        }
        tokio::select! {
            _ = shutdown => {
                info!("shutting down");
                self.tasks.abort_all();
                Ok(())
            }
            Some(joined) = self.tasks.join_next() => {
                self.tasks.abort_all();
                joined.map_err(|e| ServerError::Internal(e.to_string()))?
            }
        }
    }

    /// Stop every listener. Connections already accepted run to completion.
    pub fn shutdown(mut self) {
        self.tasks.abort_all();
    }
}

impl fmt::Debug for BoundServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundServer").field("addrs", &self.addrs).finish()
    }
}
