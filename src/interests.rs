//! Interest store: an [`InvertedIndex`] over interest strings, with the
//! similarity walk used by Recommend.

use std::collections::HashMap;

use crate::interner::InvertedIndex;

/// Inverted index from interest string to the set of accounts holding it,
/// plus the reverse per-account set.
#[derive(Debug, Default)]
pub struct InterestStore {
    index: InvertedIndex,
}

impl InterestStore {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self {
        InterestStore {
            index: InvertedIndex::new(),
        }
    }

    /// Adds `interest` to `account_id`'s set.
    pub fn add(&mut self, account_id: u32, interest: &str) {
        self.index.set(account_id, interest);
    }

    /// Drops every interest currently held by `account_id`.
    pub fn clear_for(&mut self, account_id: u32) {
        self.index.clear_for(account_id);
    }

    /// Replaces `account_id`'s interests wholesale.
    pub fn replace(&mut self, account_id: u32, interests: &[String]) {
        self.clear_for(account_id);
        for interest in interests {
            self.add(account_id, interest);
        }
    }

    /// True iff `account_id` holds every interest in `values`.
    #[must_use]
    pub fn contains_all(&self, account_id: u32, values: &[String]) -> bool {
        let Some(held) = self.index.values_of(account_id) else {
            return values.is_empty();
        };
        values.iter().all(|value| {
            self.index
                .lookup(value)
                .is_some_and(|id| held.contains(&id))
        })
    }

    /// True iff `account_id` holds any interest in `values`.
    #[must_use]
    pub fn contains_any(&self, account_id: u32, values: &[String]) -> bool {
        let Some(held) = self.index.values_of(account_id) else {
            return false;
        };
        values.iter().any(|value| {
            self.index
                .lookup(value)
                .is_some_and(|id| held.contains(&id))
        })
    }

    /// The interest strings currently held by `account_id`, for Group's
    /// interest fan-out.
    #[must_use]
    pub fn interests_of(&self, account_id: u32) -> Vec<&str> {
        let Some(held) = self.index.values_of(account_id) else {
            return Vec::new();
        };
        held.iter()
            .filter_map(|&value_id| self.index.resolve(value_id))
            .collect()
    }

    /// Intersection of the postings of `values`, smallest first to keep
    /// the intersection cheap.
    #[must_use]
    pub fn posting_for_all(&self, values: &[String]) -> Vec<u32> {
        let mut postings: Vec<&std::collections::HashSet<u32>> = Vec::with_capacity(values.len());
        for value in values {
            match self.index.posting_for(value) {
                Some(posting) => postings.push(posting),
                None => return Vec::new(),
            }
        }
        postings.sort_by_key(|p| p.len());
        let Some((smallest, rest)) = postings.split_first() else {
            return Vec::new();
        };
        smallest
            .iter()
            .copied()
            .filter(|id| rest.iter().all(|posting| posting.contains(id)))
            .collect()
    }

    /// Union of the postings of `values`.
    #[must_use]
    pub fn posting_for_any(&self, values: &[String]) -> Vec<u32> {
        let mut seen = std::collections::HashSet::new();
        for value in values {
            if let Some(posting) = self.index.posting_for(value) {
                seen.extend(posting.iter().copied());
            }
        }
        seen.into_iter().collect()
    }

    /// For every interest `account_id` holds, walks that interest's
    /// posting and increments each peer's shared-interest counter. Used
    /// by Recommend to rank candidates by shared-interest count.
    #[must_use]
    pub fn similarity_posting(&self, account_id: u32) -> HashMap<u32, u32> {
        let mut counts = HashMap::new();
        let Some(held) = self.index.values_of(account_id) else {
            return counts;
        };
        for &value_id in held {
            let Some(posting) = self.index.posting(value_id) else {
                continue;
            };
            for &peer in posting {
                if peer != account_id {
                    *counts.entry(peer).or_insert(0u32) += 1;
                }
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(entries: &[(u32, &[&str])]) -> InterestStore {
        let mut store = InterestStore::new();
        for (id, interests) in entries {
            for interest in *interests {
                store.add(*id, interest);
            }
        }
        store
    }

    #[test]
    fn contains_all_requires_every_interest() {
        let store = store_with(&[(1, &["k", "p"]), (2, &["k"])]);
        assert!(store.contains_all(1, &["k".into(), "p".into()]));
        assert!(!store.contains_all(2, &["k".into(), "p".into()]));
    }

    #[test]
    fn posting_for_all_is_intersection() {
        let store = store_with(&[(1, &["k", "p"]), (2, &["k"]), (3, &["p"])]);
        let mut ids = store.posting_for_all(&["k".into(), "p".into()]);
        ids.sort_unstable();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn posting_for_any_is_union() {
        let store = store_with(&[(1, &["k"]), (2, &["p"]), (3, &["q"])]);
        let mut ids = store.posting_for_any(&["k".into(), "p".into()]);
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn unseen_interest_yields_empty_postings() {
        let store = store_with(&[(1, &["k"])]);
        assert!(store.posting_for_all(&["ghost".into()]).is_empty());
        assert!(store.posting_for_any(&["ghost".into()]).is_empty());
    }

    #[test]
    fn interests_of_lists_held_interests() {
        let store = store_with(&[(1, &["k", "p"])]);
        let mut held = store.interests_of(1);
        held.sort_unstable();
        assert_eq!(held, vec!["k", "p"]);
        assert!(store.interests_of(2).is_empty());
    }

    #[test]
    fn replace_drops_previous_interests() {
        let mut store = store_with(&[(1, &["k", "p"])]);
        store.replace(1, &["q".into()]);
        assert!(!store.contains_any(1, &["k".into(), "p".into()]));
        assert!(store.contains_all(1, &["q".into()]));
    }

    #[test]
    fn similarity_posting_counts_shared_interests() {
        let store = store_with(&[(1, &["k", "p"]), (2, &["k"]), (3, &["k", "p"])]);
        let sim = store.similarity_posting(1);
        assert_eq!(sim.get(&2), Some(&1));
        assert_eq!(sim.get(&3), Some(&2));
        assert!(!sim.contains_key(&1));
    }
}
