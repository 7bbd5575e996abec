//! Filter executor: compiles a parameter map into a
//! `(source, residual predicate, limit)` plan and streams the source until
//! `limit` matches are found.

use std::collections::HashMap;

use crate::account::{Account, Phone, Sex, Status};
use crate::error::{Error, Result};
use crate::source::RecordSource;
use crate::store::AccountStore;
use crate::Store;

/// Tri-state for the `*_null` options: unset, required absent, required
/// present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NullFilter {
    RequireAbsent,
    RequirePresent,
}

fn parse_null(value: &str) -> Result<NullFilter> {
    match value {
        "1" => Ok(NullFilter::RequireAbsent),
        "0" => Ok(NullFilter::RequirePresent),
        other => Err(Error::bad_request(format!("invalid null flag: {other}"))),
    }
}

/// Which row columns the response projection carries. `id` and `email`
/// are implicit and not tracked here.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    /// First name.
    pub fname: bool,
    /// Surname.
    pub sname: bool,
    /// Phone.
    pub phone: bool,
    /// Sex.
    pub sex: bool,
    /// Birth timestamp.
    pub birth: bool,
    /// Country.
    pub country: bool,
    /// City.
    pub city: bool,
    /// Relationship status.
    pub status: bool,
    /// Premium window / `premium_now`.
    pub premium: bool,
}

/// A single residual predicate, evaluated per candidate after the source
/// has produced it.
enum Predicate {
    SexEq(Sex),
    StatusEq(Status),
    StatusNeq(Status),
    EmailDomain(String),
    EmailLt(String),
    EmailGt(String),
    FnameEq(String),
    FnameAny(Vec<String>),
    FnameNull(NullFilter),
    SnameEq(String),
    SnameStarts(String),
    SnameNull(NullFilter),
    PhoneCode(u16),
    PhoneNull(NullFilter),
    CountryEq(Option<u32>),
    CountryNull(NullFilter),
    CityEq(Option<u32>),
    CityAny(Vec<u32>),
    CityNull(NullFilter),
    BirthLt(i64),
    BirthGt(i64),
    BirthYear { start: i64, end: i64 },
    PremiumNow,
    PremiumNull(NullFilter),
}

impl Predicate {
    fn matches(&self, account: &Account) -> bool {
        match self {
            Predicate::SexEq(sex) => account.sex == *sex,
            Predicate::StatusEq(status) => account.status == *status,
            Predicate::StatusNeq(status) => account.status != *status,
            Predicate::EmailDomain(domain) => account
                .email
                .split_once('@')
                .is_some_and(|(_, d)| d == domain),
            Predicate::EmailLt(bound) => &account.email <= bound,
            Predicate::EmailGt(bound) => &account.email >= bound,
            Predicate::FnameEq(name) => account.fname.as_deref() == Some(name.as_str()),
            Predicate::FnameAny(names) => account
                .fname
                .as_deref()
                .is_some_and(|fname| names.iter().any(|n| n == fname)),
            Predicate::FnameNull(null) => match null {
                NullFilter::RequireAbsent => account.fname.is_none(),
                NullFilter::RequirePresent => account.fname.is_some(),
            },
            Predicate::SnameEq(name) => account.sname.as_deref() == Some(name.as_str()),
            Predicate::SnameStarts(prefix) => account
                .sname
                .as_deref()
                .is_some_and(|sname| sname.starts_with(prefix.as_str())),
            Predicate::SnameNull(null) => match null {
                NullFilter::RequireAbsent => account.sname.is_none(),
                NullFilter::RequirePresent => account.sname.is_some(),
            },
            Predicate::PhoneCode(code) => account.phone.is_some_and(|phone| phone.code == *code),
            Predicate::PhoneNull(null) => match null {
                NullFilter::RequireAbsent => account.phone.is_none(),
                NullFilter::RequirePresent => account.phone.is_some(),
            },
            Predicate::CountryEq(id) => *id == Some(account.country) && account.country != 0,
            Predicate::CountryNull(null) => match null {
                NullFilter::RequireAbsent => account.country == 0,
                NullFilter::RequirePresent => account.country != 0,
            },
            Predicate::CityEq(id) => *id == Some(account.city) && account.city != 0,
            Predicate::CityAny(ids) => ids.contains(&account.city) && account.city != 0,
            Predicate::CityNull(null) => match null {
                NullFilter::RequireAbsent => account.city == 0,
                NullFilter::RequirePresent => account.city != 0,
            },
            Predicate::BirthLt(bound) => account.birth < *bound,
            Predicate::BirthGt(bound) => account.birth > *bound,
            Predicate::BirthYear { start, end } => account.birth >= *start && account.birth < *end,
            Predicate::PremiumNow => account.premium_now,
            Predicate::PremiumNull(null) => match null {
                NullFilter::RequireAbsent => account.premium_start == 0,
                NullFilter::RequirePresent => account.premium_start != 0,
            },
        }
    }
}

/// Which candidate source to drive, chosen by priority order.
enum SourcePlan {
    LikesContains(Vec<u32>),
    InterestsContains(Vec<String>),
    InterestsAny(Vec<String>),
    Default,
}

/// A compiled filter query, ready to execute against a [`Store`].
pub struct FilterPlan {
    source_plan: SourcePlan,
    predicates: Vec<Predicate>,
    projection: Projection,
    limit: usize,
}

/// Parses the recognized filter options into a [`FilterPlan`]. `store` is
/// needed to resolve `country_eq`/`city_eq`/`city_any` strings to interned
/// ids up front.
///
/// # Errors
///
/// [`Error::BadRequest`] on an unknown option, a duplicate/empty value, an
/// invalid enum literal, a malformed `phone_code`, or a missing/invalid
/// `limit`.
pub fn parse(store: &AccountStore, params: &HashMap<String, String>) -> Result<FilterPlan> {
    let mut predicates = Vec::new();
    let mut projection = Projection::default();
    let mut limit: Option<usize> = None;
    let mut likes_contains: Option<Vec<u32>> = None;
    let mut interests_contains: Option<Vec<String>> = None;
    let mut interests_any: Option<Vec<String>> = None;

    for (key, value) in params {
        if value.is_empty() {
            return Err(Error::bad_request(format!("empty value for {key}")));
        }
        match key.as_str() {
            "sex_eq" => {
                let sex = Sex::parse(value)
                    .ok_or_else(|| Error::bad_request(format!("invalid sex: {value}")))?;
                projection.sex = true;
                predicates.push(Predicate::SexEq(sex));
            }
            "status_eq" => {
                let status = Status::parse(value)
                    .ok_or_else(|| Error::bad_request(format!("invalid status: {value}")))?;
                projection.status = true;
                predicates.push(Predicate::StatusEq(status));
            }
            "status_neq" => {
                let status = Status::parse(value)
                    .ok_or_else(|| Error::bad_request(format!("invalid status: {value}")))?;
                projection.status = true;
                predicates.push(Predicate::StatusNeq(status));
            }
            "email_domain" => {
                if value.contains('%') {
                    return Err(Error::bad_request("email_domain cannot contain '%'"));
                }
                predicates.push(Predicate::EmailDomain(value.clone()));
            }
            "email_lt" => predicates.push(Predicate::EmailLt(value.clone())),
            "email_gt" => predicates.push(Predicate::EmailGt(value.clone())),
            "fname_eq" => {
                projection.fname = true;
                predicates.push(Predicate::FnameEq(value.clone()));
            }
            "fname_any" => {
                projection.fname = true;
                predicates.push(Predicate::FnameAny(
                    value.split(',').map(str::to_string).collect(),
                ));
            }
            "fname_null" => {
                projection.fname = true;
                predicates.push(Predicate::FnameNull(parse_null(value)?));
            }
            "sname_eq" => {
                projection.sname = true;
                predicates.push(Predicate::SnameEq(value.clone()));
            }
            "sname_starts" => {
                projection.sname = true;
                predicates.push(Predicate::SnameStarts(value.clone()));
            }
            "sname_null" => {
                projection.sname = true;
                predicates.push(Predicate::SnameNull(parse_null(value)?));
            }
            "phone_code" => {
                if value.len() != 3 || !value.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(Error::bad_request("phone_code must be 3 digits"));
                }
                projection.phone = true;
                predicates.push(Predicate::PhoneCode(value.parse().expect("validated")));
            }
            "phone_null" => {
                projection.phone = true;
                predicates.push(Predicate::PhoneNull(parse_null(value)?));
            }
            "country_eq" => {
                projection.country = true;
                predicates.push(Predicate::CountryEq(store.lookup_country(value)));
            }
            "country_null" => {
                projection.country = true;
                predicates.push(Predicate::CountryNull(parse_null(value)?));
            }
            "city_eq" => {
                projection.city = true;
                predicates.push(Predicate::CityEq(store.lookup_city(value)));
            }
            "city_any" => {
                projection.city = true;
                let ids = value
                    .split(',')
                    .filter_map(|city| store.lookup_city(city))
                    .collect();
                predicates.push(Predicate::CityAny(ids));
            }
            "city_null" => {
                projection.city = true;
                predicates.push(Predicate::CityNull(parse_null(value)?));
            }
            "birth_lt" => {
                projection.birth = true;
                predicates.push(Predicate::BirthLt(parse_i64(key, value)?));
            }
            "birth_gt" => {
                projection.birth = true;
                predicates.push(Predicate::BirthGt(parse_i64(key, value)?));
            }
            "birth_year" => {
                projection.birth = true;
                let year: i32 = value
                    .parse()
                    .map_err(|_| Error::bad_request(format!("invalid birth_year: {value}")))?;
                let start = crate::account::unix_seconds_for_jan_1(year);
                let end = crate::account::unix_seconds_for_jan_1(year + 1);
                predicates.push(Predicate::BirthYear { start, end });
            }
            "premium_now" => {
                projection.premium = true;
                predicates.push(Predicate::PremiumNow);
            }
            "premium_null" => {
                projection.premium = true;
                predicates.push(Predicate::PremiumNull(parse_null(value)?));
            }
            "interests_any" => {
                interests_any = Some(value.split(',').map(str::to_string).collect());
            }
            "interests_contains" => {
                interests_contains = Some(value.split(',').map(str::to_string).collect());
            }
            "likes_contains" => {
                let ids = value
                    .split(',')
                    .map(|s| {
                        s.parse::<u32>()
                            .map_err(|_| Error::bad_request(format!("invalid like id: {s}")))
                    })
                    .collect::<Result<Vec<u32>>>()?;
                likes_contains = Some(ids);
            }
            "limit" => {
                let parsed: i64 = value
                    .parse()
                    .map_err(|_| Error::bad_request(format!("invalid limit: {value}")))?;
                if parsed <= 0 {
                    return Err(Error::bad_request("limit must be positive"));
                }
                limit = Some(parsed as usize);
            }
            "query_id" => {}
            other => return Err(Error::bad_request(format!("unknown filter option: {other}"))),
        }
    }

    let limit = limit.ok_or_else(|| Error::bad_request("limit is required"))?;

    let source_plan = if let Some(ids) = likes_contains {
        SourcePlan::LikesContains(ids)
    } else if let Some(values) = interests_contains {
        SourcePlan::InterestsContains(values)
    } else if let Some(values) = interests_any {
        SourcePlan::InterestsAny(values)
    } else {
        SourcePlan::Default
    };

    Ok(FilterPlan {
        source_plan,
        predicates,
        projection,
        limit,
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64> {
    value
        .parse()
        .map_err(|_| Error::bad_request(format!("invalid {key}: {value}")))
}

/// Result of running a [`FilterPlan`]: matching ids in source order, plus
/// the projection the caller should render.
pub struct FilterOutcome {
    /// Matching ids, in the order the source produced them.
    pub ids: Vec<u32>,
    /// Columns to include in the response, beyond `id`/`email`.
    pub projection: Projection,
}

/// Runs `plan` against `store`, streaming the selected source and
/// accumulating matches until `plan.limit` is reached.
#[must_use]
pub fn execute(store: &Store, plan: &FilterPlan) -> FilterOutcome {
    let mut source = match &plan.source_plan {
        SourcePlan::LikesContains(likees) => {
            let ids: Vec<u32> = store.likes.likers_of_all(likees).into_iter().collect();
            RecordSource::array(ids)
        }
        SourcePlan::InterestsContains(values) => {
            RecordSource::array(store.interests.posting_for_all(values))
        }
        SourcePlan::InterestsAny(values) => {
            RecordSource::array(store.interests.posting_for_any(values))
        }
        SourcePlan::Default => store.accounts.range_cursor(),
    };

    let mut ids = Vec::new();
    while let Some(id) = source.next() {
        if ids.len() >= plan.limit {
            break;
        }
        let Ok(account) = store.accounts.get(id) else {
            continue;
        };
        if plan.predicates.iter().all(|p| p.matches(account)) {
            ids.push(id);
        }
    }

    FilterOutcome {
        ids,
        projection: plan.projection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewAccount;

    fn store_with_two() -> Store {
        let mut store = Store::new(1_000_000_000);
        store
            .accounts
            .insert(NewAccount {
                id: 1,
                email: "a@x.ru".into(),
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
        store
            .accounts
            .insert(NewAccount {
                id: 2,
                email: "b@x.ru".into(),
                fname: None,
                sname: None,
                phone: None,
                sex: Sex::Female,
                birth: 10,
                joined: 0,
                status: Status::Single,
                premium: (0, 0),
                country: None,
                city: None,
            })
            .unwrap();
        store.interests.add(1, "k");
        store.interests.add(1, "p");
        store.interests.add(2, "k");
        store
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn sex_eq_filters_to_matching_accounts() {
        let store = store_with_two();
        let plan = parse(&store.accounts, &params(&[("sex_eq", "f"), ("limit", "10")])).unwrap();
        let outcome = execute(&store, &plan);
        assert_eq!(outcome.ids, vec![2]);
        assert!(outcome.projection.sex);
    }

    #[test]
    fn no_predicates_returns_largest_ids_descending() {
        let store = store_with_two();
        let plan = parse(&store.accounts, &params(&[("limit", "10")])).unwrap();
        let outcome = execute(&store, &plan);
        assert_eq!(outcome.ids, vec![2, 1]);
    }

    #[test]
    fn interests_contains_selects_intersection_source() {
        let store = store_with_two();
        let plan = parse(
            &store.accounts,
            &params(&[("interests_contains", "k,p"), ("limit", "10")]),
        )
        .unwrap();
        let outcome = execute(&store, &plan);
        assert_eq!(outcome.ids, vec![1]);
    }

    #[test]
    fn unknown_option_is_bad_request() {
        let store = store_with_two();
        assert!(parse(&store.accounts, &params(&[("nonsense", "1"), ("limit", "1")])).is_err());
    }

    #[test]
    fn missing_limit_is_bad_request() {
        let store = store_with_two();
        assert!(parse(&store.accounts, &params(&[("sex_eq", "m")])).is_err());
    }

    #[test]
    fn empty_value_is_bad_request() {
        let store = store_with_two();
        assert!(parse(&store.accounts, &params(&[("sex_eq", ""), ("limit", "1")])).is_err());
    }

    #[test]
    fn limit_larger_than_matches_returns_all_without_padding() {
        let store = store_with_two();
        let plan = parse(&store.accounts, &params(&[("limit", "100")])).unwrap();
        let outcome = execute(&store, &plan);
        assert_eq!(outcome.ids.len(), 2);
    }

    #[test]
    fn unseen_interest_yields_empty_result_not_error() {
        let store = store_with_two();
        let plan = parse(
            &store.accounts,
            &params(&[("interests_any", "ghost"), ("limit", "10")]),
        )
        .unwrap();
        let outcome = execute(&store, &plan);
        assert!(outcome.ids.is_empty());
    }
}
