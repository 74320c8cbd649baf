//! TCP services for Strata.
//!
//! Three independent listeners share one line protocol:
//!
//! - [`TransportService`] (port 12000) hands out short object identifiers.
//! - [`IndexService`] (port 12001) tracks the storage nodes per partition.
//! - [`StorageService`] (port 12002) persists blobs on the local filesystem.
//!
//! Each accepted connection runs on its own task. Commands on a connection
//! are answered strictly in order; nothing is ordered across connections.

pub mod config;
pub mod connection;
pub mod error;
pub mod index;
pub mod listener;
pub mod server;
pub mod service;
pub mod storage;
pub mod transport;

pub use config::{
    FramingConfig, IndexConfig, ObjectScope, ServerConfig, StorageConfig, StorageLayout,
    TransportConfig, DEFAULT_SHARD_DEPTH,
};
pub use connection::{serve_connection, ConnectionStats};
pub use error::{ServerError, ServerResult};
pub use index::IndexService;
pub use listener::ServiceListener;
pub use server::{BoundServer, StrataServer, Tier};
pub use service::LineService;
pub use storage::StorageService;
pub use transport::TransportService;
