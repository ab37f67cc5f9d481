//! In-memory store with the same key rules and ordering as [`FileStore`](super::FileStore).

use std::collections::HashMap;

use crate::account::{KeyringJson, StoreEntry};
use crate::error::Result;
use crate::store::index::KeyIndex;
use crate::store::{validate_key, KeyringStore};

#[derive(Default)]
pub struct MemoryStore {
    index: KeyIndex,
    records: HashMap<String, KeyringJson>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyringStore for MemoryStore {
    fn all(&self) -> Result<Vec<StoreEntry>> {
        Ok(self
            .index
            .keys()
            .filter_map(|key| {
                self.records.get(key).map(|value| StoreEntry {
                    key: key.to_string(),
                    value: value.clone(),
                })
            })
            .collect())
    }

    fn get(&self, key: &str) -> Result<Option<KeyringJson>> {
        validate_key(key)?;
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &KeyringJson) -> Result<()> {
        validate_key(key)?;
        self.index.insert(key);
        self.records.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.index.remove(key);
        self.records.remove(key);
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overwrite_keeps_position() {
        let mut store = MemoryStore::new();
        store.set("1", &KeyringJson::new("a")).unwrap();
        store.set("2", &KeyringJson::new("b")).unwrap();
        store
            .set("1", &KeyringJson::new("a").with_meta("name", json!("renamed")))
            .unwrap();

        let all = store.all().unwrap();
        assert_eq!(all.iter().map(|e| e.key.as_str()).collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(all[0].value.meta.get("name"), Some(&json!("renamed")));
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut store = MemoryStore::new();
        store.remove("nope").unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }
}
