// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Storage subsystem: store backends + insertion-order index + writer.

pub mod file_store;
pub mod index;
pub mod memory_store;
pub mod writer;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

use crate::account::{KeyringJson, StoreEntry};
use crate::error::{Result, StoreError};

/// Persistence backend behind the account store handler.
///
/// Implementations own the records; the handler never caches them.
pub trait KeyringStore: Send + Sync {
    /// Every stored record in insertion order.
    fn all(&self) -> Result<Vec<StoreEntry>>;

    /// The record under `key`, or `None` when absent.
    fn get(&self, key: &str) -> Result<Option<KeyringJson>>;

    /// Insert or overwrite. Overwriting keeps the key's listing position.
    fn set(&mut self, key: &str, value: &KeyringJson) -> Result<()>;

    /// Delete `key`. Missing keys are not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Number of records `all()` would return.
    fn count(&self) -> Result<usize> {
        Ok(self.all()?.len())
    }
}

/// Longest accepted key in bytes. Leaves room for the `.{key}.tmp` temp
/// name inside a 255-byte file name limit.
pub const MAX_KEY_LEN: usize = 250;

/// Reject keys that cannot be used as a single file name inside the store
/// directory. Applied by every backend so they agree on what is valid.
pub fn validate_key(key: &str) -> Result<()> {
    let reason = if key.is_empty() {
        "key is empty"
    } else if key.len() > MAX_KEY_LEN {
        "key is longer than 250 bytes"
    } else if key.starts_with('.') {
        "key must not start with '.'"
    } else if key.contains(['/', '\\', '\0']) {
        "key must not contain path separators or NUL"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{validate_key, MAX_KEY_LEN};

    #[test]
    fn accepts_keyring_style_keys() {
        assert!(validate_key("1").is_ok());
        assert!(validate_key("account:0xd43593c715fdd31c61141abd04a99fd6822c8558").is_ok());
    }

    #[test]
    fn rejects_path_like_keys() {
        for key in ["", ".", "..", ".DS_Store", "a/b", "..\\x", "nul\0"] {
            assert!(validate_key(key).is_err(), "{key:?} should be rejected");
        }
    }

    #[test]
    fn bounds_key_length() {
        assert!(validate_key(&"x".repeat(MAX_KEY_LEN)).is_ok());
        assert!(validate_key(&"x".repeat(MAX_KEY_LEN + 1)).is_err());
        assert!(validate_key(&"é".repeat(126)).is_err());
    }
}
