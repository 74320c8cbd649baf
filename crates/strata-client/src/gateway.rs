//! Object gateway: the path a client takes through all three tiers.

use strata_index::{NodeDescriptor, PartitionSnapshot, DEFAULT_PARTITION};
use strata_protocol::validate_token;
use strata_store::ObjectId;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::tiers::{IndexClient, StorageClient, TransportClient};

/// Storage nodes to try for `id`, in order.
///
/// Descriptors without a usable address are skipped. The list starts at the
/// slot `blake3(id) mod n` and wraps around the membership list, so the
/// order is stable for a given id and membership.
pub fn node_order<'a>(nodes: &'a [NodeDescriptor], id: &ObjectId) -> Vec<&'a str> {
    let mut addrs: Vec<&str> = nodes.iter().filter_map(NodeDescriptor::address).collect();
    if addrs.is_empty() {
        return addrs;
    }
    let digest = blake3::hash(id.as_str().as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    let slot = u64::from_le_bytes(head) % addrs.len() as u64;
    addrs.rotate_left(slot as usize);
    addrs
}

/// The preferred storage node for `id`: the head of [`node_order`].
pub fn select_node<'a>(nodes: &'a [NodeDescriptor], id: &ObjectId) -> Option<&'a str> {
    node_order(nodes, id).first().copied()
}

/// Stores payloads by registering them with Transport, locating a node
/// through Index, and writing to that Storage node.
#[derive(Debug)]
pub struct ObjectGateway {
    transport: TransportClient,
    index: IndexClient,
    key_prefix: String,
}

impl ObjectGateway {
    pub fn new(transport: TransportClient, index: IndexClient) -> Self {
        Self { transport, index, key_prefix: String::new() }
    }

    pub async fn connect(transport_addr: &str, index_addr: &str) -> ClientResult<Self> {
        Ok(Self::new(
            TransportClient::connect(transport_addr).await?,
            IndexClient::connect(index_addr).await?,
        ))
    }

    /// Prefix prepended to every storage key, e.g. `"objects/"`.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn storage_key(&self, id: &ObjectId) -> String {
        format!("{}{}", self.key_prefix, id)
    }

    /// Store `payload` and return the identifier it was filed under.
    ///
    /// Nodes are tried in [`node_order`]; the first one that accepts the
    /// write wins.
    pub async fn put(&mut self, payload: &str) -> ClientResult<ObjectId> {
        validate_token(payload)?;
        let id = self.transport.post(payload).await?;
        let key = self.storage_key(&id);
        let mut last_err = None;
        for addr in self.candidates(&id).await? {
            match put_on(&addr, &key, payload).await {
                Ok(()) => {
                    debug!(%id, node = %addr, %key, "stored object");
                    return Ok(id);
                }
                Err(err) => {
                    warn!(%id, node = %addr, %err, "storage node refused write, trying next");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or(ClientError::NoStorageNodes(DEFAULT_PARTITION)))
    }

    /// Fetch the payload stored for `id` from the first node that has it.
    pub async fn get(&mut self, id: &ObjectId) -> ClientResult<String> {
        let key = self.storage_key(id);
        let mut last_err = None;
        for addr in self.candidates(id).await? {
            match get_from(&addr, &key).await {
                Ok(payload) => {
                    debug!(%id, node = %addr, %key, "fetched object");
                    return Ok(payload);
                }
                Err(err) => {
                    debug!(%id, node = %addr, %err, "storage node miss, trying next");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or(ClientError::NoStorageNodes(DEFAULT_PARTITION)))
    }

    async fn candidates(&mut self, id: &ObjectId) -> ClientResult<Vec<String>> {
        let snapshot: PartitionSnapshot = self.index.partitions().await?;
        let nodes = snapshot.get(&DEFAULT_PARTITION).map(Vec::as_slice).unwrap_or_default();
        let order: Vec<String> = node_order(nodes, id).into_iter().map(str::to_owned).collect();
        if order.is_empty() {
            return Err(ClientError::NoStorageNodes(DEFAULT_PARTITION));
        }
        Ok(order)
    }
}

async fn put_on(addr: &str, key: &str, payload: &str) -> ClientResult<()> {
    StorageClient::connect(addr).await?.put(key, payload).await
}

async fn get_from(addr: &str, key: &str) -> ClientResult<String> {
    StorageClient::connect(addr).await?.get(key).await
}
