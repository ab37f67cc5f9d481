// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Key index: remembers the order in which keys were first stored.
//!
//! Directory listings come back in whatever order the filesystem likes, so
//! the index lives in memory and is rebuilt on open from the modification
//! times of the record files already on disk. No separate index file is
//! written; the record files stay the only state.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, SystemTime};

const MODIFIED_STEP: Duration = Duration::from_millis(1);

/// A record file discovered while scanning the store directory.
#[derive(Debug, Clone)]
pub struct ScannedKey {
    pub key: String,
    pub modified: SystemTime,
}

/// Insertion-ordered set of keys.
#[derive(Debug, Default)]
pub struct KeyIndex {
    order: BTreeMap<u64, String>,
    positions: HashMap<String, u64>,
    counter: u64,
    /// Newest modification time seen or handed out.
    latest: Option<SystemTime>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `key`. Returns `false` if it was already present, in which case
    /// its position is unchanged.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.positions.contains_key(key) {
            return false;
        }
        let seq = self.counter;
        self.counter += 1;
        self.order.insert(seq, key.to_string());
        self.positions.insert(key.to_string(), seq);
        true
    }

    /// Stop tracking `key`. Returns `true` if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.positions.remove(key) {
            Some(seq) => {
                self.order.remove(&seq);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Rebuild from a directory scan: oldest file first, ties broken by key.
    pub fn rebuild_from_scanned(&mut self, scanned: Vec<ScannedKey>) {
        self.order.clear();
        self.positions.clear();
        self.counter = 0;
        self.latest = None;
        self.merge_scanned(scanned);
    }

    /// Reconcile with a fresh directory scan. Known keys keep their position,
    /// keys whose file is gone are dropped, and keys written by someone else
    /// are appended oldest first, ties broken by key.
    pub fn merge_scanned(&mut self, mut scanned: Vec<ScannedKey>) {
        let on_disk: HashSet<&str> = scanned.iter().map(|s| s.key.as_str()).collect();
        let gone: Vec<String> = self
            .positions
            .keys()
            .filter(|k| !on_disk.contains(k.as_str()))
            .cloned()
            .collect();
        for key in gone {
            self.remove(&key);
        }

        scanned.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.key.cmp(&b.key)));
        for s in scanned {
            self.observe(s.modified);
            self.insert(&s.key);
        }
    }

    /// Modification time to stamp on a newly created record file: now, or
    /// just after the newest time already seen so creation order survives a
    /// rescan even on coarse-grained clocks.
    pub fn next_modified(&mut self) -> SystemTime {
        let now = SystemTime::now();
        let stamp = match self.latest {
            Some(latest) if latest >= now => latest + MODIFIED_STEP,
            _ => now,
        };
        self.latest = Some(stamp);
        stamp
    }

    fn observe(&mut self, modified: SystemTime) {
        if self.latest.map_or(true, |latest| modified > latest) {
            self.latest = Some(modified);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_insertion_position() {
        let mut index = KeyIndex::new();
        assert!(index.insert("b"));
        assert!(index.insert("a"));
        assert!(!index.insert("b"));
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn remove_then_reinsert_moves_to_end() {
        let mut index = KeyIndex::new();
        index.insert("x");
        index.insert("y");
        assert!(index.remove("x"));
        assert!(!index.remove("x"));
        index.insert("x");
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["y", "x"]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn rebuild_orders_by_mtime_then_name() {
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let t1 = t0 + Duration::from_secs(5);
        let mut index = KeyIndex::new();
        index.insert("stale");
        index.rebuild_from_scanned(vec![
            ScannedKey { key: "late".into(), modified: t1 },
            ScannedKey { key: "b".into(), modified: t0 },
            ScannedKey { key: "a".into(), modified: t0 },
        ]);
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["a", "b", "late"]);
        assert!(!index.contains("stale"));
    }

    #[test]
    fn merge_keeps_known_order_and_appends_new() {
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let mut index = KeyIndex::new();
        index.insert("b");
        index.insert("a");
        index.insert("gone");
        index.merge_scanned(vec![
            ScannedKey { key: "a".into(), modified: t0 },
            ScannedKey { key: "b".into(), modified: t0 + Duration::from_secs(9) },
            ScannedKey { key: "z".into(), modified: t0 + Duration::from_secs(1) },
            ScannedKey { key: "y".into(), modified: t0 + Duration::from_secs(2) },
        ]);
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["b", "a", "z", "y"]);
        assert!(!index.contains("gone"));
    }

    #[test]
    fn next_modified_is_strictly_increasing() {
        let future = SystemTime::now() + Duration::from_secs(3600);
        let mut index = KeyIndex::new();
        index.rebuild_from_scanned(vec![ScannedKey { key: "a".into(), modified: future }]);
        let first = index.next_modified();
        let second = index.next_modified();
        assert!(first > future);
        assert!(second > first);
    }
}
