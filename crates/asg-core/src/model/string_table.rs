//! String interning.
//!
//! Keys are stable for the life of the table. Interning hands out keys in
//! increasing order; a table read from a stream may hold sparse keys. Each
//! entry carries a persist mark that the save pass sets for every key still
//! referenced by a node attribute; only marked strings reach the wire.

use rustc_hash::FxHashMap;

use crate::error::AsgError;
use crate::model::id::Key;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    persist: bool,
}

/// Append-only string to key mapping.
#[derive(Debug, Clone)]
pub struct StringTable {
    entries: FxHashMap<Key, Entry>,
    index: FxHashMap<String, Key>,
    next_key: u32,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    /// Creates a table holding only the empty string under [`Key::EMPTY`].
    pub fn new() -> Self {
        let mut entries = FxHashMap::default();
        entries.insert(
            Key::EMPTY,
            Entry {
                value: String::new(),
                persist: false,
            },
        );
        let mut index = FxHashMap::default();
        index.insert(String::new(), Key::EMPTY);
        StringTable {
            entries,
            index,
            next_key: Key::EMPTY.0 + 1,
        }
    }

    /// Returns the key of `s`, adding it if absent.
    pub fn intern(&mut self, s: &str) -> Key {
        if let Some(&key) = self.index.get(s) {
            return key;
        }
        let key = Key(self.next_key);
        self.next_key += 1;
        self.entries.insert(
            key,
            Entry {
                value: s.to_owned(),
                persist: false,
            },
        );
        self.index.insert(s.to_owned(), key);
        key
    }

    /// Resolves a key.
    pub fn lookup(&self, key: Key) -> Result<&str, AsgError> {
        self.get(key).ok_or(AsgError::InvalidKey { key })
    }

    pub fn get(&self, key: Key) -> Option<&str> {
        self.entries.get(&key).map(|e| e.value.as_str())
    }

    /// Returns the key of `s` without interning it.
    pub fn find(&self, s: &str) -> Option<Key> {
        self.index.get(s).copied()
    }

    pub fn contains_key(&self, key: Key) -> bool {
        self.entries.contains_key(&key)
    }

    /// Marks `key` for the next save.
    pub fn mark_for_save(&mut self, key: Key) -> Result<(), AsgError> {
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.persist = true;
                Ok(())
            }
            None => Err(AsgError::InvalidKey { key }),
        }
    }

    pub fn is_marked(&self, key: Key) -> bool {
        self.entries.get(&key).is_some_and(|e| e.persist)
    }

    /// Clears every persist mark.
    pub fn clear_marks(&mut self) {
        for entry in self.entries.values_mut() {
            entry.persist = false;
        }
    }

    /// Marked entries in key order. The empty string is implicit and never
    /// listed.
    pub fn marked(&self) -> impl Iterator<Item = (Key, &str)> {
        let mut out: Vec<(Key, &str)> = self
            .entries
            .iter()
            .filter(|(key, e)| e.persist && **key != Key::EMPTY)
            .map(|(key, e)| (*key, e.value.as_str()))
            .collect();
        out.sort_unstable_by_key(|(key, _)| *key);
        out.into_iter()
    }

    /// Number of keys, the empty string included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the empty string is always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Places `value` under a key read from a stream. Keys may arrive sparse;
    /// gaps stay unresolvable. Returns false if the key or the string is
    /// already present.
    pub(crate) fn insert_with_key(&mut self, key: Key, value: String) -> bool {
        if self.entries.contains_key(&key) || self.index.contains_key(&value) {
            return false;
        }
        self.next_key = self.next_key.max(key.0.saturating_add(1));
        self.index.insert(value.clone(), key);
        self.entries.insert(
            key,
            Entry {
                value,
                persist: false,
            },
        );
        true
    }
}
