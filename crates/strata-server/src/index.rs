use std::sync::Arc;

use async_trait::async_trait;
use strata_index::{NodeDescriptor, PartitionMap};
use strata_protocol::{IndexRequest, Response};
use tracing::{debug, warn};

use crate::service::LineService;

/// Membership tier: serves and extends the partition map.
///
/// The map is shared by every connection.
#[derive(Debug, Default)]
pub struct IndexService {
    partitions: Arc<PartitionMap>,
}

impl IndexService {
    pub fn new(partitions: Arc<PartitionMap>) -> Self {
        Self { partitions }
    }

    /// Index whose partition 0 starts with `seeds`, in order.
    pub fn with_seed_addrs<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Arc::new(PartitionMap::with_seeds(
            seeds.into_iter().map(NodeDescriptor::from_addr),
        )))
    }

    pub fn partitions(&self) -> &Arc<PartitionMap> {
        &self.partitions
    }
}

#[async_trait]
impl LineService for IndexService {
    type Session = ();

    fn name(&self) -> &'static str {
        "index"
    }

    fn open_session(&self) -> Self::Session {}

    async fn handle(&self, _session: &mut Self::Session, line: &str) -> Response {
        match IndexRequest::parse(line) {
            Ok(IndexRequest::Get) => match self.partitions.to_json() {
                Ok(json) => Response::Line(json),
                Err(err) => {
                    warn!(%err, "failed to render partition map");
                    Response::Error
                }
            },
            Ok(IndexRequest::Post { descriptor }) => match NodeDescriptor::parse(&descriptor) {
                Ok(node) => {
                    let count = self.partitions.register(node);
                    debug!(count, "node registered");
                    Response::Empty
                }
                Err(err) => {
                    debug!(%err, "rejecting node descriptor");
                    Response::Error
                }
            },
            Err(err) => {
                debug!(%err, "rejecting index command");
                Response::Error
            }
        }
    }
}
