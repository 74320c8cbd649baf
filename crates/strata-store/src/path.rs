use std::path::{Component, Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// Maps a caller-supplied blob key onto a filesystem path.
///
/// Every filesystem operation of [`crate::FsBlobStore`] goes through the
/// policy first; a rejected key never reaches the filesystem.
pub trait PathPolicy: Send + Sync {
    fn resolve(&self, key: &str) -> StoreResult<PathBuf>;

    /// Whether writes should create missing parent directories first.
    fn creates_parents(&self) -> bool {
        false
    }
}

/// Uses the key as a path unchanged: absolute paths and `..` are honoured.
///
/// This is the wire-compatible behaviour and offers no confinement.
#[derive(Clone, Debug, Default)]
pub struct VerbatimPaths;

impl PathPolicy for VerbatimPaths {
    fn resolve(&self, key: &str) -> StoreResult<PathBuf> {
        Ok(PathBuf::from(key))
    }
}

/// Confines keys to a root directory.
///
/// Keys must be relative and made only of normal components (`.` is
/// tolerated). Symlinks already present under the root are not inspected.
#[derive(Clone, Debug)]
pub struct ConfinedRoot {
    root: PathBuf,
}

impl ConfinedRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PathPolicy for ConfinedRoot {
    fn resolve(&self, key: &str) -> StoreResult<PathBuf> {
        let reject = |reason: &str| StoreError::PathRejected {
            key: key.to_owned(),
            reason: reason.to_owned(),
        };
        if key.is_empty() {
            return Err(reject("empty key"));
        }
        let relative = Path::new(key);
        let mut has_normal = false;
        for component in relative.components() {
            match component {
                Component::Normal(_) => has_normal = true,
                Component::CurDir => {}
                Component::ParentDir => return Err(reject("parent directory component")),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(reject("absolute path outside storage root"))
                }
            }
        }
        if !has_normal {
            return Err(reject("key names no file"));
        }
        Ok(self.root.join(relative))
    }
}

/// Characters of the key hash used per directory level.
const SHARD_NAME_LEN: usize = 2;

/// Spreads keys over a fixed-depth directory tree under a root.
///
/// A key is hashed with BLAKE3 and the hex digest is cut into `depth`
/// two-character directory names followed by the remaining characters as
/// the file name, so `root/ab/cd/ef01...` for depth 2. Any non-empty key is
/// accepted: the digest never contains a separator.
#[derive(Clone, Debug)]
pub struct ShardedRoot {
    root: PathBuf,
    depth: usize,
}

impl ShardedRoot {
    /// Deepest tree that still leaves a file name of two characters.
    pub const MAX_DEPTH: usize = 31;

    pub fn new(root: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            root: root.into(),
            depth: depth.min(Self::MAX_DEPTH),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl PathPolicy for ShardedRoot {
    fn resolve(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() {
            return Err(StoreError::PathRejected {
                key: String::new(),
                reason: "empty key".to_owned(),
            });
        }
        let digest = blake3::hash(key.as_bytes()).to_hex();
        let (dirs, file) = digest.as_str().split_at(self.depth * SHARD_NAME_LEN);
        let mut path = self.root.clone();
        for level in 0..self.depth {
            path.push(&dirs[level * SHARD_NAME_LEN..(level + 1) * SHARD_NAME_LEN]);
        }
        path.push(file);
        Ok(path)
    }

    fn creates_parents(&self) -> bool {
        true
    }
}
