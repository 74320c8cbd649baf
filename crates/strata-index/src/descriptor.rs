use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IndexResult;

/// Address of the storage node every index starts with.
pub const SEED_NODE: &str = "localhost:12002";

/// A registered storage endpoint.
///
/// Descriptors are arbitrary JSON. The seed is a bare `"host:port"` string;
/// registrations may also send objects such as `{"addr":"host:port", ...}`.
/// The index stores them untouched and re-emits them verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeDescriptor(Value);

impl NodeDescriptor {
    /// Descriptor for a plain `host:port` address.
    pub fn from_addr(addr: impl Into<String>) -> Self {
        Self(Value::String(addr.into()))
    }

    /// Decode a descriptor from its JSON text.
    pub fn parse(text: &str) -> IndexResult<Self> {
        Ok(Self(serde_json::from_str(text)?))
    }

    /// The `host:port` this descriptor points at, if it names one.
    ///
    /// Accepts a bare string, or an object with a string `addr` or `address`
    /// field.
    pub fn address(&self) -> Option<&str> {
        match &self.0 {
            Value::String(addr) => Some(addr.as_str()),
            Value::Object(fields) => fields
                .get("addr")
                .or_else(|| fields.get("address"))
                .and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Value> for NodeDescriptor {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
