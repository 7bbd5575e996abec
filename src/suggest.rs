//! Suggest executor: walks same-sex peers by like affinity and proposes
//! likees the subject hasn't liked yet.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::Store;

/// A compiled suggest query for a fixed subject account.
pub struct SuggestPlan {
    subject_id: u32,
    limit: usize,
    country_eq: Option<String>,
    city_eq: Option<String>,
}

/// Parses `limit` and the optional `country`/`city` location filters,
/// applied to the peer whose likes are walked, not to the suggested
/// likee.
///
/// # Errors
///
/// [`Error::BadRequest`] on an unknown option or a missing/invalid `limit`.
pub fn parse(subject_id: u32, params: &HashMap<String, String>) -> Result<SuggestPlan> {
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
            other => return Err(Error::bad_request(format!("unknown suggest option: {other}"))),
        }
    }

    Ok(SuggestPlan {
        subject_id,
        limit: limit.ok_or_else(|| Error::bad_request("limit is required"))?,
        country_eq,
        city_eq,
    })
}

/// One suggest output row's projection.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedAccount {
    /// Suggested likee's id.
    pub id: u32,
    /// Suggested likee's email.
    pub email: String,
    /// Suggested likee's status.
    pub status: crate::account::Status,
    /// Suggested likee's first name.
    pub fname: Option<String>,
    /// Suggested likee's surname.
    pub sname: Option<String>,
}

/// Runs `plan` against `store`: orders the subject's same-sex peers by
/// [`crate::likes::LikeStore::similarity_order`], filters peers by the
/// optional location match, and walks each peer's likes (skipping ones
/// the subject already likes) until `plan.limit` suggestions accumulate.
///
/// # Errors
///
/// [`Error::NotFound`] if `plan.subject_id` does not exist.
pub fn execute(store: &Store, plan: &SuggestPlan) -> Result<Vec<SuggestedAccount>> {
    let subject = store.accounts.get(plan.subject_id)?;
    let subject_sex = subject.sex;

    let peers = store.likes.similarity_order(plan.subject_id);
    let mut seen = HashSet::new();
    let mut likee_ids = Vec::new();

    for peer_id in peers {
        if likee_ids.len() >= plan.limit {
            break;
        }
        let Ok(peer) = store.accounts.get(peer_id) else {
            continue;
        };
        if peer.sex != subject_sex {
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
        store.likes.suggest_not_liked(
            plan.subject_id,
            peer_id,
            &mut seen,
            &mut likee_ids,
            plan.limit,
        );
    }

    Ok(likee_ids
        .into_iter()
        .filter_map(|id| {
            let account = store.accounts.get(id).ok()?;
            Some(SuggestedAccount {
                id,
                email: account.email.clone(),
                status: account.status,
                fname: account.fname.clone(),
                sname: account.sname.clone(),
            })
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

    fn account(id: u32, sex: Sex) -> NewAccount {
        NewAccount {
            id,
            email: format!("{id}@x.ru"),
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

    fn populated() -> Store {
        let mut store = Store::new(0);
        // 1 and 2 are same-sex and both like 100; 2 also likes 200 which 1
        // doesn't like yet.
        store.accounts.insert(account(1, Sex::Male)).unwrap();
        store.accounts.insert(account(2, Sex::Male)).unwrap();
        store.accounts.insert(account(100, Sex::Female)).unwrap();
        store.accounts.insert(account(200, Sex::Female)).unwrap();
        store.likes.append(1, 100, 1_000);
        store.likes.append(2, 100, 1_000);
        store.likes.append(2, 200, 1_000);
        store
    }

    #[test]
    fn suggests_peer_likes_not_already_liked() {
        let store = populated();
        let plan = parse(1, &params(&[("limit", "10")])).unwrap();
        let results = execute(&store, &plan).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 200);
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
