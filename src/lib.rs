//! In-memory account store and query engine for a dating-site style
//! record set: a column-oriented account table, a string interner with
//! inverted indices, an interest store, a bipartite like graph, and the
//! filter/group/recommend/suggest executors built on top of them.
//!
//! The engine is transport-agnostic: it owns no sockets, no JSON framing,
//! and no logging. A caller wraps a [`Store`] in a lock, drives it from
//! whatever transport it likes, and renders [`filter::FilterOutcome`] /
//! [`group::GroupOutcome`] / etc. into wire responses itself.

pub mod account;
pub mod error;
pub mod filter;
pub mod group;
pub mod interests;
pub mod interner;
pub mod likes;
pub mod loader;
pub mod recommend;
pub mod source;
pub mod store;
pub mod suggest;
pub mod wire;

pub use error::{Error, Result};

use crate::account::{LikeEdge, PartialAccount};
use crate::interests::InterestStore;
use crate::likes::LikeStore;
use crate::store::{AccountStore, NewAccount};

/// The complete in-memory dataset: accounts, interests, and likes, built
/// around a single fixed `NOW`. Readers and the single writer share a
/// `Store` behind an external lock; nothing in here is internally
/// synchronized.
#[derive(Debug)]
pub struct Store {
    /// Column-oriented account table.
    pub accounts: AccountStore,
    /// Interest inverted index.
    pub interests: InterestStore,
    /// Bipartite like graph.
    pub likes: LikeStore,
}

impl Store {
    /// Builds an empty store pinned to `now` (seconds since epoch).
    #[must_use]
    pub fn new(now: i64) -> Self {
        Store {
            accounts: AccountStore::new(now),
            interests: InterestStore::new(),
            likes: LikeStore::new(),
        }
    }

    /// Inserts a brand-new account together with its interests and its own
    /// outgoing likes (likes appended at account-creation time are
    /// trusted, not run through [`Store::validate_like`]).
    ///
    /// Atomic: if the account insert itself fails (duplicate id/email), no
    /// interests or likes are recorded for it.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] if the account's id or email is already taken.
    pub fn insert_account(
        &mut self,
        new: NewAccount,
        interests: &[String],
        likes: &[LikeEdge],
    ) -> Result<()> {
        let id = new.id;
        self.accounts.insert(new)?;
        for interest in interests {
            self.interests.add(id, interest);
        }
        for like in likes {
            self.likes.append(like.from, like.to, like.ts);
        }
        Ok(())
    }

    /// Applies `patch` to `id`: the fixed-width fields through
    /// [`AccountStore::update`], and a wholesale interests replacement
    /// through [`InterestStore::replace`] when `patch.interests` is
    /// present.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `id` is absent. [`Error::BadRequest`] if the
    /// patch would violate email uniqueness.
    pub fn update_account(&mut self, id: u32, patch: &PartialAccount) -> Result<()> {
        self.accounts.update(id, patch)?;
        if let Some(ref interests) = patch.interests {
            self.interests.replace(id, interests);
        }
        Ok(())
    }

    /// Checks a like edge against `validate`: both endpoints must refer to
    /// existing accounts, and the two accounts' sexes must differ. Used
    /// only by the bulk like-append entry point; likes appended as part of
    /// an account's own creation skip this check.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] if either endpoint is missing or the sexes
    /// match.
    pub fn validate_like(&self, edge: &LikeEdge) -> Result<()> {
        let from = self.accounts.get(edge.from).map_err(|_| {
            Error::bad_request(format!("like references unknown liker {}", edge.from))
        })?;
        let to = self.accounts.get(edge.to).map_err(|_| {
            Error::bad_request(format!("like references unknown likee {}", edge.to))
        })?;
        if from.sex == to.sex {
            return Err(Error::bad_request("like endpoints must have differing sex"));
        }
        Ok(())
    }

    /// Bulk-appends `edges`: every edge is validated first, and only if
    /// all of them pass is any of them appended — an invalid edge
    /// anywhere in the batch leaves the like graph completely unchanged
    /// (mirrors the reference's validate-then-insert two-pass loop).
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] if any edge fails [`Store::validate_like`].
    pub fn append_likes_bulk(&mut self, edges: &[LikeEdge]) -> Result<()> {
        for edge in edges {
            self.validate_like(edge)?;
        }
        for edge in edges {
            self.likes.append(edge.from, edge.to, edge.ts);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Sex, Status};

    fn sample(id: u32, email: &str, sex: Sex) -> NewAccount {
        NewAccount {
            id,
            email: email.to_string(),
            fname: None,
            sname: None,
            phone: None,
            sex,
            birth: 0,
            joined: 0,
            status: Status::Single,
            premium: (0, 0),
            country: None,
            city: None,
        }
    }

    #[test]
    fn insert_account_wires_interests_and_likes() {
        let mut store = Store::new(0);
        store
            .insert_account(sample(2, "b@x.ru", Sex::Female), &[], &[])
            .unwrap();
        store
            .insert_account(
                sample(1, "a@x.ru", Sex::Male),
                &["k".to_string()],
                &[LikeEdge { from: 1, to: 2, ts: 100 }],
            )
            .unwrap();
        assert!(store.interests.contains_all(1, &["k".to_string()]));
        assert!(store.likes.likes(1, 2));
    }

    #[test]
    fn update_account_replaces_interests_when_present() {
        let mut store = Store::new(0);
        store
            .insert_account(sample(1, "a@x.ru", Sex::Male), &["k".to_string()], &[])
            .unwrap();
        let patch = PartialAccount {
            interests: Some(vec!["p".to_string()]),
            ..Default::default()
        };
        store.update_account(1, &patch).unwrap();
        assert!(!store.interests.contains_any(1, &["k".to_string()]));
        assert!(store.interests.contains_all(1, &["p".to_string()]));
    }

    #[test]
    fn validate_like_rejects_same_sex() {
        let mut store = Store::new(0);
        store.insert_account(sample(1, "a@x.ru", Sex::Male), &[], &[]).unwrap();
        store.insert_account(sample(2, "b@x.ru", Sex::Male), &[], &[]).unwrap();
        let edge = LikeEdge { from: 1, to: 2, ts: 0 };
        assert!(store.validate_like(&edge).is_err());
    }

    #[test]
    fn append_likes_bulk_is_all_or_nothing() {
        let mut store = Store::new(0);
        store.insert_account(sample(1, "a@x.ru", Sex::Male), &[], &[]).unwrap();
        store.insert_account(sample(2, "b@x.ru", Sex::Female), &[], &[]).unwrap();
        let edges = vec![
            LikeEdge { from: 1, to: 2, ts: 100 },
            LikeEdge { from: 99, to: 2, ts: 200 },
        ];
        assert!(store.append_likes_bulk(&edges).is_err());
        assert!(!store.likes.likes(1, 2));
    }
}
