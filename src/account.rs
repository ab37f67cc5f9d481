//! Account record types shared by the stores and the IPC surface.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A persisted keyring account: an address plus free-form metadata.
///
/// Extra top-level fields (`encoded`, `encoding`, ...) are carried through
/// untouched so clients can store full keyring exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyringJson {
    pub address: String,
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KeyringJson {
    /// An account with empty metadata.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            meta: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }
}

/// One `{ key, value }` pair as returned by `all()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub key: String,
    pub value: KeyringJson,
}
