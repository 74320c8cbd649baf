//! Storage-node membership for Strata.
//!
//! The Index tier keeps a [`PartitionMap`] from partition id to the ordered
//! list of [`NodeDescriptor`]s registered for it. Clients read the whole map
//! and pick a node themselves; the index never contacts the nodes.

pub mod descriptor;
pub mod error;
pub mod partition;

pub use descriptor::{NodeDescriptor, SEED_NODE};
pub use error::{IndexError, IndexResult};
pub use partition::{PartitionId, PartitionMap, PartitionSnapshot, DEFAULT_PARTITION};
