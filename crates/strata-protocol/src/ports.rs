/// Default listening ports for the three tiers.
pub const TRANSPORT_PORT: u16 = 12000;
pub const INDEX_PORT: u16 = 12001;
pub const STORAGE_PORT: u16 = 12002;

/// Cap on an unterminated line held by a connection (1 MiB).
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Read chunk size used by connection loops.
pub const READ_CHUNK_SIZE: usize = 8 * 1024;
