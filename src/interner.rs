//! String interner + inverted index.
//!
//! Dense integer ids let filter/group equality on `country`/`city` become
//! an integer compare instead of a string compare, and let postings be
//! indexed arrays instead of hash maps. Id `0` is reserved for the empty
//! string / "absent" and is pre-inserted at construction.

use std::collections::{HashMap, HashSet};

/// Maps strings to dense ids and back, with no deletion.
#[derive(Debug, Default)]
pub struct Interner {
    ids: HashMap<String, u32>,
    strings: Vec<String>,
}

impl Interner {
    /// Builds an interner with id `0` pre-reserved for the empty string.
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Interner {
            ids: HashMap::new(),
            strings: Vec::new(),
        };
        let zero = interner.intern("");
        debug_assert_eq!(zero, 0);
        interner
    }

    /// Returns the id for `value`, assigning a fresh one if unseen.
    pub fn intern(&mut self, value: &str) -> u32 {
        if let Some(&id) = self.ids.get(value) {
            return id;
        }
        let id = self.strings.len() as u32;
        self.strings.push(value.to_string());
        self.ids.insert(value.to_string(), id);
        id
    }

    /// Looks up an already-interned value without assigning a new id.
    #[must_use]
    pub fn lookup(&self, value: &str) -> Option<u32> {
        self.ids.get(value).copied()
    }

    /// Resolves an id back to its string, if it was ever assigned.
    #[must_use]
    pub fn resolve(&self, id: u32) -> Option<&str> {
        self.strings.get(id as usize).map(String::as_str)
    }
}

/// An inverted index over an interned column: value id → posting of
/// account ids, and account id → set of value ids (for membership checks
/// and for removing stale mappings before a remap).
///
/// Columns with exactly one value per account (`city`, `country`) only
/// ever have a single-element `values_of` set; `interests` reuses the same
/// structure with a multi-valued set per account.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    interner: Interner,
    accounts_of: Vec<HashSet<u32>>,
    values_of: HashMap<u32, HashSet<u32>>,
}

impl InvertedIndex {
    /// Builds an empty index.
    #[must_use]
    pub fn new() -> Self {
        let interner = Interner::new();
        InvertedIndex {
            interner,
            accounts_of: vec![HashSet::new()],
            values_of: HashMap::new(),
        }
    }

    /// Looks up the id of an already-seen value.
    #[must_use]
    pub fn lookup(&self, value: &str) -> Option<u32> {
        self.interner.lookup(value)
    }

    /// Resolves a value id back to its string.
    #[must_use]
    pub fn resolve(&self, id: u32) -> Option<&str> {
        self.interner.resolve(id)
    }

    /// The posting (account ids) for an already-interned value id.
    #[must_use]
    pub fn posting(&self, value_id: u32) -> Option<&HashSet<u32>> {
        self.accounts_of.get(value_id as usize)
    }

    /// The posting for a value given by string; empty if the value was
    /// never seen.
    #[must_use]
    pub fn posting_for(&self, value: &str) -> Option<&HashSet<u32>> {
        self.lookup(value).and_then(|id| self.posting(id))
    }

    /// The set of value ids currently set for `account_id`.
    #[must_use]
    pub fn values_of(&self, account_id: u32) -> Option<&HashSet<u32>> {
        self.values_of.get(&account_id)
    }

    /// Adds `value` to `account_id`'s mapping, interning it if new.
    pub fn set(&mut self, account_id: u32, value: &str) -> u32 {
        let value_id = self.interner.intern(value);
        while self.accounts_of.len() <= value_id as usize {
            self.accounts_of.push(HashSet::new());
        }
        self.accounts_of[value_id as usize].insert(account_id);
        self.values_of.entry(account_id).or_default().insert(value_id);
        value_id
    }

    /// Drops every mapping for `account_id` in both directions (used
    /// before replacing an account's interests, or before remapping its
    /// city/country).
    pub fn clear_for(&mut self, account_id: u32) {
        if let Some(value_ids) = self.values_of.remove(&account_id) {
            for value_id in value_ids {
                if let Some(posting) = self.accounts_of.get_mut(value_id as usize) {
                    posting.remove(&account_id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interner_reserves_zero_for_empty_string() {
        let interner = Interner::new();
        assert_eq!(interner.lookup(""), Some(0));
    }

    #[test]
    fn interner_is_stable_and_monotonic() {
        let mut interner = Interner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");
        assert_eq!(interner.intern("a"), a);
        assert_ne!(a, b);
    }

    #[test]
    fn inverted_index_round_trips_postings() {
        let mut index = InvertedIndex::new();
        index.set(1, "moscow");
        index.set(2, "moscow");
        index.set(3, "kazan");

        let moscow_id = index.lookup("moscow").unwrap();
        let posting = index.posting(moscow_id).unwrap();
        assert!(posting.contains(&1));
        assert!(posting.contains(&2));
        assert!(!posting.contains(&3));
    }

    #[test]
    fn unseen_value_has_no_posting() {
        let index = InvertedIndex::new();
        assert!(index.posting_for("nowhere").is_none());
    }

    #[test]
    fn clear_for_drops_both_directions() {
        let mut index = InvertedIndex::new();
        index.set(1, "k");
        index.set(1, "p");
        index.clear_for(1);
        assert!(index.values_of(1).is_none());
        let k_id = index.lookup("k").unwrap();
        assert!(!index.posting(k_id).unwrap().contains(&1));
    }
}
