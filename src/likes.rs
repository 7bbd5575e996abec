//! Like store: a bipartite directed graph with timestamps, plus the
//! similarity walk used by Suggest.

use std::collections::{HashMap, HashSet};

/// One `(peer, timestamp)` edge, stored in both the forward and backward
/// adjacency vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    peer: u32,
    ts: i64,
}

/// Bipartite directed like graph: `out[i]` is `i`'s outgoing likes, `in[i]`
/// is `i`'s incoming likes. The same `(from, to)` pair may appear multiple
/// times with different timestamps; `out_set` dedups for O(1) containment
/// checks.
#[derive(Debug, Default)]
pub struct LikeStore {
    out: Vec<Vec<Edge>>,
    out_set: Vec<HashSet<u32>>,
    r#in: Vec<Vec<Edge>>,
}

impl LikeStore {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self {
        LikeStore::default()
    }

    fn ensure_capacity(&mut self, id: u32) {
        let needed = id as usize + 1;
        if self.out.len() < needed {
            self.out.resize_with(needed, Vec::new);
            self.out_set.resize_with(needed, HashSet::new);
            self.r#in.resize_with(needed, Vec::new);
        }
    }

    /// Appends a `from → to` like at `ts`. Duplicates are allowed; the
    /// pair is recorded once in `out_set` regardless of how many times it
    /// is appended.
    pub fn append(&mut self, from: u32, to: u32, ts: i64) {
        self.ensure_capacity(from.max(to));
        self.out[from as usize].push(Edge { peer: to, ts });
        self.out_set[from as usize].insert(to);
        self.r#in[to as usize].push(Edge { peer: from, ts });
    }

    /// O(1) membership: does `from` like `to` (at least once)?
    #[must_use]
    pub fn likes(&self, from: u32, to: u32) -> bool {
        self.out_set
            .get(from as usize)
            .is_some_and(|set| set.contains(&to))
    }

    fn out_set_of(&self, id: u32) -> Option<&HashSet<u32>> {
        self.out_set.get(id as usize)
    }

    fn in_len(&self, id: u32) -> usize {
        self.r#in.get(id as usize).map_or(0, Vec::len)
    }

    /// Ids whose outgoing set contains every id in `likees`: intersection,
    /// starting from the likee with the smallest incoming posting.
    #[must_use]
    pub fn likers_of_all(&self, likees: &[u32]) -> HashSet<u32> {
        let Some(&smallest) = likees
            .iter()
            .min_by_key(|&&likee| self.in_len(likee))
        else {
            return HashSet::new();
        };
        let Some(incoming) = self.r#in.get(smallest as usize) else {
            return HashSet::new();
        };
        incoming
            .iter()
            .map(|edge| edge.peer)
            .filter(|&liker| {
                likees
                    .iter()
                    .all(|&likee| self.out_set_of(liker).is_some_and(|s| s.contains(&likee)))
            })
            .collect()
    }

    /// Ids whose outgoing set contains any id in `likees`: union.
    #[must_use]
    pub fn likers_of_any(&self, likees: &[u32]) -> HashSet<u32> {
        let mut result = HashSet::new();
        for &likee in likees {
            if let Some(incoming) = self.r#in.get(likee as usize) {
                result.extend(incoming.iter().map(|edge| edge.peer));
            }
        }
        result
    }

    /// Averages the timestamps of `edges` grouped by peer id.
    fn averaged_by_peer(edges: &[Edge]) -> HashMap<u32, f64> {
        let mut sums: HashMap<u32, (i64, u32)> = HashMap::new();
        for edge in edges {
            let entry = sums.entry(edge.peer).or_insert((0, 0));
            entry.0 += edge.ts;
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(peer, (sum, count))| (peer, sum as f64 / f64::from(count)))
            .collect()
    }

    /// Affinity ordering: for every likee `x` of `id`, and every other
    /// liker `p` of `x`, accumulate
    /// `score[p] += 1 / max(1, |t_id(x) - t_p(x)|)` where `t` is each
    /// liker's average timestamp toward `x`. Returns peer ids sorted by
    /// descending score.
    #[must_use]
    pub fn similarity_order(&self, id: u32) -> Vec<u32> {
        let mut scores: HashMap<u32, f64> = HashMap::new();
        let Some(outgoing) = self.out.get(id as usize) else {
            return Vec::new();
        };
        for (&likee, &self_avg) in &Self::averaged_by_peer(outgoing) {
            let Some(incoming) = self.r#in.get(likee as usize) else {
                continue;
            };
            for (&peer, &peer_avg) in &Self::averaged_by_peer(incoming) {
                if peer == id {
                    continue;
                }
                let delta = (self_avg - peer_avg).abs().max(1.0);
                *scores.entry(peer).or_insert(0.0) += 1.0 / delta;
            }
        }
        let mut ranked: Vec<(u32, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).expect("scores are never NaN"));
        ranked.into_iter().map(|(peer, _)| peer).collect()
    }

    /// Appends every id `peer_id` likes that `id` does not already like,
    /// in descending likee-id order, deduplicating against `seen` and
    /// stopping once `out_list` reaches `limit` entries.
    pub fn suggest_not_liked(
        &self,
        id: u32,
        peer_id: u32,
        seen: &mut HashSet<u32>,
        out_list: &mut Vec<u32>,
        limit: usize,
    ) {
        let Some(peer_outgoing) = self.out.get(peer_id as usize) else {
            return;
        };
        let mut candidates: Vec<u32> = peer_outgoing
            .iter()
            .map(|edge| edge.peer)
            .filter(|&likee| !self.likes(id, likee))
            .collect();
        candidates.sort_unstable_by(|a, b| b.cmp(a));
        for candidate in candidates {
            if seen.contains(&candidate) {
                continue;
            }
            seen.insert(candidate);
            out_list.push(candidate);
            if out_list.len() == limit {
                return;
            }
        }
    }
}
