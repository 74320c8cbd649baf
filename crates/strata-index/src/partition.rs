//! The partition map: which storage nodes serve which partition.
//!
//! Only [`DEFAULT_PARTITION`] is populated today. Registration appends; there
//! is no deduplication, removal, or health tracking, and nothing survives a
//! restart.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;

use crate::descriptor::NodeDescriptor;
use crate::error::{IndexError, IndexResult};

pub type PartitionId = u32;

/// The partition every registration lands in.
pub const DEFAULT_PARTITION: PartitionId = 0;

/// Point-in-time copy of the map, as rendered on the wire:
/// `{"0":["localhost:12002", ...]}`.
pub type PartitionSnapshot = BTreeMap<PartitionId, Vec<NodeDescriptor>>;

/// Process-wide partition → nodes map, shared by every index connection.
pub struct PartitionMap {
    partitions: RwLock<PartitionSnapshot>,
}

impl PartitionMap {
    /// Create a map whose default partition holds `seeds`, in order.
    pub fn with_seeds(seeds: impl IntoIterator<Item = NodeDescriptor>) -> Self {
        let mut partitions = BTreeMap::new();
        partitions.insert(DEFAULT_PARTITION, seeds.into_iter().collect());
        Self {
            partitions: RwLock::new(partitions),
        }
    }

    /// Append `descriptor` to the default partition. Returns the new node count.
    pub fn register(&self, descriptor: NodeDescriptor) -> usize {
        self.register_in(DEFAULT_PARTITION, descriptor)
    }

    /// Append `descriptor` to `partition`, creating the partition if needed.
    pub fn register_in(&self, partition: PartitionId, descriptor: NodeDescriptor) -> usize {
        let mut partitions = self.partitions.write().expect("lock poisoned");
        let nodes = partitions.entry(partition).or_default();
        debug!(partition, node = %descriptor, "registering storage node");
        nodes.push(descriptor);
        nodes.len()
    }

    /// Nodes in `partition`, in registration order.
    pub fn nodes(&self, partition: PartitionId) -> Vec<NodeDescriptor> {
        self.partitions
            .read()
            .expect("lock poisoned")
            .get(&partition)
            .cloned()
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> PartitionSnapshot {
        self.partitions.read().expect("lock poisoned").clone()
    }

    /// Render the whole map as single-line JSON.
    pub fn to_json(&self) -> IndexResult<String> {
        let partitions = self.partitions.read().expect("lock poisoned");
        serde_json::to_string(&*partitions).map_err(|e| IndexError::Serialization(e.to_string()))
    }

    /// Decode a map previously rendered by [`PartitionMap::to_json`].
    pub fn parse_snapshot(text: &str) -> IndexResult<PartitionSnapshot> {
        serde_json::from_str(text).map_err(|e| IndexError::Serialization(e.to_string()))
    }
}

impl Default for PartitionMap {
    /// A map seeded with [`crate::SEED_NODE`].
    fn default() -> Self {
        Self::with_seeds([NodeDescriptor::from_addr(crate::SEED_NODE)])
    }
}

impl std::fmt::Debug for PartitionMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let partitions = self.partitions.read().expect("lock poisoned");
        f.debug_struct("PartitionMap")
            .field("partitions", &partitions.len())
            .field("nodes", &partitions.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}
