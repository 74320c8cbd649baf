//! Clients for the Strata tiers.
//!
//! [`LineClient`] speaks the raw line protocol with a per-request timeout.
//! [`TransportClient`], [`IndexClient`] and [`StorageClient`] wrap it with
//! typed requests, and [`ObjectGateway`] composes them into `put`/`get` of
//! whole objects.

pub mod error;
pub mod gateway;
pub mod line;
pub mod tiers;

pub use error::{ClientError, ClientResult};
pub use gateway::{node_order, select_node, ObjectGateway};
pub use line::{LineClient, DEFAULT_TIMEOUT};
pub use tiers::{IndexClient, StorageClient, TransportClient};
