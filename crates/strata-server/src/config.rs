use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_protocol::{DEFAULT_MAX_LINE_BYTES, INDEX_PORT, STORAGE_PORT, TRANSPORT_PORT};

use crate::error::{ServerError, ServerResult};

/// Configuration for all three tiers. Every field has a default, so an empty
/// TOML document is a valid configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: TransportConfig,
    pub index: IndexConfig,
    pub storage: StorageConfig,
    pub framing: FramingConfig,
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Bind every tier to an ephemeral loopback port.
    pub fn ephemeral() -> Self {
        let loopback = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
        let mut config = Self::default();
        config.transport.bind = loopback;
        config.index.bind = loopback;
        config.storage.bind = loopback;
        config
    }
}

/// Lifetime of the Transport tier's object records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectScope {
    /// A fresh table per accepted connection; ids are invisible elsewhere.
    #[default]
    Connection,
    /// One table shared by every connection for the life of the process.
    Process,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub bind: SocketAddr,
    pub scope: ObjectScope,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, TRANSPORT_PORT)),
            scope: ObjectScope::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub bind: SocketAddr,
    /// Addresses placed in partition 0 at startup, in order.
    pub seed_nodes: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, INDEX_PORT)),
            seed_nodes: vec![strata_index::SEED_NODE.to_owned()],
        }
    }
}

/// How the Storage tier maps keys onto files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLayout {
    /// One file per key, named by the key.
    #[default]
    Flat,
    /// Keys hashed into a directory tree under `root`.
    Sharded,
}

/// Directory levels used by [`StorageLayout::Sharded`] unless configured.
pub const DEFAULT_SHARD_DEPTH: usize = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bind: SocketAddr,
    /// When set, keys are confined beneath this directory. When unset, keys
    /// are used as filesystem paths verbatim.
    pub root: Option<PathBuf>,
    pub layout: StorageLayout,
    /// Directory levels for the sharded layout.
    pub shard_depth: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, STORAGE_PORT)),
            root: None,
            layout: StorageLayout::default(),
            shard_depth: DEFAULT_SHARD_DEPTH,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Largest unterminated line a connection may buffer before it is closed.
    pub max_line_bytes: usize,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}
