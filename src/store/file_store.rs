//! Directory-backed account store.
//!
//! One file per key under `base_path/`, named after the key and holding the
//! record's JSON:
//!
//! ```text
//! base_path/
//!   account:0xd435…   {"address":"5Grw…","meta":{"name":"alice"}}
//!   account:0x8eaf…   {"address":"5FHn…","meta":{}}
//!   .account:0x8eaf….tmp   (in-flight write, ignored)
//! ```
//!
//! Writes go to a dot-prefixed temp file, are fsynced and then renamed over
//! the destination, so a reader sees either the old or the new record.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::account::{KeyringJson, StoreEntry};
use crate::error::{Result, StoreError};
use crate::store::index::{KeyIndex, ScannedKey};
use crate::store::{validate_key, KeyringStore};

pub struct FileStore {
    base_path: PathBuf,
    /// Listing order. Reconciled with the directory on every `all()`, since
    /// other handles (the CLI next to a running server) write here too.
    index: Mutex<KeyIndex>,
}

impl FileStore {
    /// Open (or create) the store directory and rebuild the key index.
    pub fn open(base_path: &Path) -> Result<Self> {
        fs::create_dir_all(base_path)
            .map_err(|e| StoreError::Config(format!("Cannot create store dir {base_path:?}: {e}")))?;

        let mut store = FileStore {
            base_path: base_path.to_path_buf(),
            index: Mutex::new(KeyIndex::new()),
        };
        let scanned = store.scan_dir()?;
        let count = scanned.len();
        store.index.get_mut().rebuild_from_scanned(scanned);
        info!(path = ?base_path, files = count, "Account store opened");
        Ok(store)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// List candidate record files. Hidden files and non-UTF-8 names are
    /// skipped; they can never have been written through `set`.
    fn scan_dir(&self) -> Result<Vec<ScannedKey>> {
        let mut scanned = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let meta = match entry.metadata() {
                Ok(m) => m,
                // Removed between listing and stat.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !meta.is_file() {
                continue;
            }
            let Ok(key) = entry.file_name().into_string() else {
                warn!(name = ?entry.file_name(), "Skipping non UTF-8 file in account store");
                continue;
            };
            if validate_key(&key).is_err() {
                continue;
            }
            scanned.push(ScannedKey {
                key,
                modified: meta.modified()?,
            });
        }
        Ok(scanned)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(format!(".{key}.tmp"))
    }

    fn read_key(&self, key: &str) -> Result<Option<KeyringJson>> {
        let bytes = match fs::read(self.path_for(key)) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn existing_modified(&self, key: &str) -> Result<Option<SystemTime>> {
        match fs::metadata(self.path_for(key)) {
            Ok(meta) => Ok(Some(meta.modified()?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyringStore for FileStore {
    fn all(&self) -> Result<Vec<StoreEntry>> {
        let scanned = self.scan_dir()?;
        let keys: Vec<String> = {
            let mut index = self.index.lock();
            index.merge_scanned(scanned);
            index.keys().map(String::from).collect()
        };

        let mut entries = Vec::with_capacity(keys.len());
        for key in &keys {
            let key = key.as_str();
            match self.read_key(key) {
                Ok(Some(value)) => entries.push(StoreEntry {
                    key: key.to_string(),
                    value,
                }),
                Ok(None) => {
                    debug!(key, "Record file vanished, skipping");
                }
                Err(StoreError::Serde(e)) => {
                    warn!(key, error = %e, "Skipping file that is not an account record");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(entries)
    }

    fn get(&self, key: &str) -> Result<Option<KeyringJson>> {
        validate_key(key)?;
        self.read_key(key)
    }

    fn set(&mut self, key: &str, value: &KeyringJson) -> Result<()> {
        validate_key(key)?;
        let bytes = serde_json::to_vec(value)?;

        // Listing order is derived from mtimes on reopen: an overwrite keeps
        // the old one, a new key gets one newer than anything seen so far.
        let modified = match self.existing_modified(key)? {
            Some(t) => t,
            None => self.index.get_mut().next_modified(),
        };

        let temp_path = self.temp_path_for(key);
        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.set_modified(modified)?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, self.path_for(key)) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        let created = self.index.get_mut().insert(key);
        debug!(key, bytes = bytes.len(), created, "Record written");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => debug!(key, "Record removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => debug!(key, "Remove of missing key ignored"),
            Err(e) => return Err(e.into()),
        }
        self.index.get_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_one_json_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set("1", &KeyringJson::new("a")).unwrap();

        let raw = fs::read_to_string(dir.path().join("1")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, json!({ "address": "a", "meta": {} }));
        assert!(!dir.path().join(".1.tmp").exists());
    }

    #[test]
    fn foreign_files_are_ignored_or_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".DS_Store"), b"junk").unwrap();
        fs::write(dir.path().join("notes"), b"not json").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let mut store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        store.set("2", &KeyringJson::new("b")).unwrap();

        let all = store.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].key, "2");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn all_sees_records_written_by_another_handle() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = FileStore::open(dir.path()).unwrap();
        let mut cli = FileStore::open(dir.path()).unwrap();

        server.set("0", &KeyringJson::new("first")).unwrap();
        cli.set("1", &KeyringJson::new("a")).unwrap();

        assert_eq!(server.get("1").unwrap(), Some(KeyringJson::new("a")));
        let keys: Vec<_> = server.all().unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["0", "1"]);

        cli.remove("0").unwrap();
        let keys: Vec<_> = server.all().unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["1"]);
        assert_eq!(server.count().unwrap(), 1);
    }

    #[test]
    fn overwrite_keeps_position_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FileStore::open(dir.path()).unwrap();
            store.set("b", &KeyringJson::new("b")).unwrap();
            store.set("a", &KeyringJson::new("a")).unwrap();
            store
                .set("b", &KeyringJson::new("b").with_meta("name", json!("bob")))
                .unwrap();
        }
        let store = FileStore::open(dir.path()).unwrap();
        let all = store.all().unwrap();
        let keys: Vec<_> = all.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(all[0].value.meta.get("name"), Some(&json!("bob")));
    }

    #[test]
    fn longest_allowed_key_can_be_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        let key = "k".repeat(crate::store::MAX_KEY_LEN);
        store.set(&key, &KeyringJson::new("a")).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(KeyringJson::new("a")));

        let too_long = "k".repeat(crate::store::MAX_KEY_LEN + 1);
        let err = store.set(&too_long, &KeyringJson::new("a")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }

    #[test]
    fn get_of_corrupt_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad"), b"{").unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(store.get("bad"), Err(StoreError::Serde(_))));
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.base_path(), nested.as_path());
    }
}
