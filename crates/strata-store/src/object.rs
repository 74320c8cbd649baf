use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Length of a generated object identifier.
pub const OBJECT_ID_LEN: usize = 5;

/// How many fresh identifiers to try before accepting a collision.
const MAX_ID_ATTEMPTS: usize = 8;

/// Short identifier handed out by the Transport tier.
///
/// The first five characters of a random v4 UUID, so twenty bits of
/// entropy. Identifiers are not derived from content.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Draw a fresh random identifier.
    pub fn generate() -> Self {
        let token = uuid::Uuid::new_v4().to_string();
        Self(token[..OBJECT_ID_LEN].to_owned())
    }

    /// Wrap an identifier received from a peer. No validation is applied.
    pub fn from_wire(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier → payload records held by a Transport tier.
///
/// Records are never evicted; the table lives as long as its owner, which is
/// either one connection or the whole process depending on configuration.
pub struct ObjectTable {
    records: RwLock<HashMap<ObjectId, String>>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Store `payload` under a freshly generated identifier.
    ///
    /// A handful of draws are made to dodge an occupied identifier; if all of
    /// them collide the last one overwrites the older record.
    pub fn insert(&self, payload: impl Into<String>) -> ObjectId {
        let mut records = self.records.write().expect("lock poisoned");
        let mut id = ObjectId::generate();
        for _ in 1..MAX_ID_ATTEMPTS {
            if !records.contains_key(&id) {
                break;
            }
            id = ObjectId::generate();
        }
        records.insert(id.clone(), payload.into());
        id
    }

    pub fn get(&self, id: &ObjectId) -> Option<String> {
        self.records.read().expect("lock poisoned").get(id).cloned()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.records.read().expect("lock poisoned").contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().expect("lock poisoned").is_empty()
    }
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectTable")
            .field("record_count", &self.len())
            .finish()
    }
}
