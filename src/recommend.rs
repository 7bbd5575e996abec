//! Recommend executor: ranks candidates who share interests with the
//! subject, strictly cross-sex, by a composite key.

use std::collections::HashMap;

use crate::account::Account;
use crate::error::{Error, Result};
use crate::Store;

/// A compiled recommend query for a fixed subject account.
pub struct RecommendPlan {
    subject_id: u32,
    limit: usize,
    country_eq: Option<String>,
    city_eq: Option<String>,
}

/// Parses `limit` and the optional `country`/`city` location filters for
/// `subject_id`.
///
/// # Errors
///
/// [`Error::BadRequest`] on an unknown option or a missing/invalid `limit`.
pub fn parse(
    subject_id: u32,
    params: &HashMap<String, String>,
) -> Result<RecommendPlan> {
    let mut limit = None;
    let mut country_eq = None;
    let mut city_eq = None;

    for (key, value) in params {
        if value.is_empty() {
            return Err(Error::bad_request(format!("empty value for {key}")));
        }
        match key.as_str() {
            "limit" => {
                let parsed: i64 = value
                    .parse()
                    .map_err(|_| Error::bad_request(format!("invalid limit: {value}")))?;
                if parsed <= 0 {
                    return Err(Error::bad_request("limit must be positive"));
                }
                limit = Some(parsed as usize);
            }
            "country" => country_eq = Some(value.clone()),
            "city" => city_eq = Some(value.clone()),
            "query_id" => {}
            other => return Err(Error::bad_request(format!("unknown recommend option: {other}"))),
        }
    }

    Ok(RecommendPlan {
        subject_id,
        limit: limit.ok_or_else(|| Error::bad_request("limit is required"))?,
        country_eq,
        city_eq,
    })
}

/// One recommend output row's projection.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendedAccount {
    /// Candidate's id.
    pub id: u32,
    /// Candidate's email.
    pub email: String,
    /// Candidate's status.
    pub status: crate::account::Status,
    /// Candidate's first name.
    pub fname: Option<String>,
    /// Candidate's surname.
    pub sname: Option<String>,
    /// Candidate's birth timestamp.
    pub birth: i64,
    /// Candidate's premium window start.
    pub premium_start: i64,
    /// Candidate's premium window end.
    pub premium_end: i64,
}

fn rank_key(account: &Account, subject: &Account, shared: u32) -> (bool, u8, u32, i64) {
    let birth_delta = (account.birth - subject.birth).abs();
    (
        account.premium_now,
        account.status.recommend_rank(),
        shared,
        -birth_delta,
    )
}

/// Runs `plan` against `store`: gathers every candidate sharing at least
/// one interest with the subject via `similarity_posting`, keeps only the
/// opposite sex and the optional location match, and sorts descending by
/// `(premium_now, status rank, shared interest count, |birth delta|)`
/// (closest birth first), returning at most `plan.limit` rows.
///
/// # Errors
///
/// [`Error::NotFound`] if `plan.subject_id` does not exist.
pub fn execute(store: &Store, plan: &RecommendPlan) -> Result<Vec<RecommendedAccount>> {
    let subject = store.accounts.get(plan.subject_id)?;
    let target_sex = subject.sex.opposite();

    let shared = store.interests.similarity_posting(plan.subject_id);
    let mut candidates: Vec<(u32, Account, u32)> = Vec::with_capacity(shared.len());
    for (&peer_id, &count) in &shared {
        let Ok(peer) = store.accounts.get(peer_id) else {
            continue;
        };
        if peer.sex != target_sex {
            continue;
        }
        if let Some(ref country) = plan.country_eq {
            if store.accounts.resolve_country(peer.country) != Some(country.as_str()) {
                continue;
            }
        }
        if let Some(ref city) = plan.city_eq {
            if store.accounts.resolve_city(peer.city) != Some(city.as_str()) {
                continue;
            }
        }
        candidates.push((peer_id, peer.clone(), count));
    }

    candidates.sort_by(|a, b| {
        let key_a = rank_key(&a.1, subject, a.2);
        let key_b = rank_key(&b.1, subject, b.2);
        key_b.cmp(&key_a).then_with(|| b.0.cmp(&a.0))
    });
    candidates.truncate(plan.limit);

    Ok(candidates
        .into_iter()
        .map(|(id, account, _)| RecommendedAccount {
            id,
            email: account.email,
            status: account.status,
            fname: account.fname,
            sname: account.sname,
            birth: account.birth,
            premium_start: account.premium_start,
            premium_end: account.premium_end,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Sex, Status};
    use crate::store::NewAccount;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn populated() -> Store {
        let mut store = Store::new(1_000);
        store
            .accounts
            .insert(NewAccount {
                id: 1,
                email: "subject@x.ru".into(),
                fname: None,
                sname: None,
                phone: None,
                sex: Sex::Male,
                birth: 0,
                joined: 0,
                status: Status::Single,
                premium: (0, 0),
                country: None,
                city: None,
            })
            .unwrap();
        for (id, birth, shared) in [(2u32, 100i64, &["k", "p"][..]), (3, 5_000, &["k"][..])] {
            store
                .accounts
                .insert(NewAccount {
                    id,
                    email: format!("{id}@x.ru"),
                    fname: None,
                    sname: None,
                    phone: None,
                    sex: Sex::Female,
                    birth,
                    joined: 0,
                    status: Status::Single,
                    premium: (0, 0),
                    country: None,
                    city: None,
                })
                .unwrap();
            for interest in shared {
                store.interests.add(id, interest);
            }
        }
        store.interests.add(1, "k");
        store.interests.add(1, "p");
        store
    }

    #[test]
    fn ranks_by_shared_interest_count_then_birth_proximity() {
        let store = populated();
        let plan = parse(1, &params(&[("limit", "10")])).unwrap();
        let results = execute(&store, &plan).unwrap();
        assert_eq!(results[0].id, 2);
    }

    #[test]
    fn excludes_same_sex_candidates() {
        let mut store = populated();
        store
            .accounts
            .insert(NewAccount {
                id: 4,
                email: "male2@x.ru".into(),
                fname: None,
                sname: None,
                phone: None,
                sex: Sex::Male,
                birth: 0,
                joined: 0,
                status: Status::Single,
                premium: (0, 0),
                country: None,
                city: None,
            })
            .unwrap();
        store.interests.add(4, "k");
        let plan = parse(1, &params(&[("limit", "10")])).unwrap();
        let results = execute(&store, &plan).unwrap();
        assert!(!results.iter().any(|r| r.id == 4));
    }

    #[test]
    fn missing_subject_is_not_found() {
        let store = Store::new(0);
        let plan = parse(99, &params(&[("limit", "10")])).unwrap();
        assert_eq!(execute(&store, &plan).unwrap_err(), Error::NotFound);
    }

    #[test]
    fn missing_limit_is_bad_request() {
        assert!(parse(1, &params(&[])).is_err());
    }
}
