//! Session payload container.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value payload attached to a session.
///
/// Keys are unique strings, values are arbitrary JSON, and ordering carries
/// no meaning. The container serializes to a JSON object for storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionData {
    entries: Map<String, Value>,
}

impl SessionData {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Store a value under a key, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a key, returning the value it held.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Check whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the payload holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Serialize to the handler payload format.
    pub fn to_payload(&self) -> String {
        serde_json::to_string(&self.entries).unwrap_or_default()
    }

    /// Deserialize from the handler payload format.
    ///
    /// Fails on anything that is not a JSON object, including the empty
    /// string a handler returns for an absent session. The session treats
    /// such payloads as an empty session rather than propagating the error.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Map<String, Value>>(payload).map(|entries| Self { entries })
    }
}
