//! Group executor: buckets a full account scan by a chosen key subset,
//! counts each bucket, and orders the result.

use std::collections::HashMap;

use crate::account::{unix_seconds_for_jan_1, Sex, Status};
use crate::error::{Error, Result};
use crate::source::RecordSource;
use crate::Store;

/// One grouping dimension, in the fixed secondary sort order
/// (`country, city, interests, sex, status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Key {
    Country,
    City,
    Interests,
    Sex,
    Status,
}

impl Key {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "country" => Some(Key::Country),
            "city" => Some(Key::City),
            "interests" => Some(Key::Interests),
            "sex" => Some(Key::Sex),
            "status" => Some(Key::Status),
            _ => None,
        }
    }
}

/// One value bound to a [`Key`] in a single output bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Value {
    Country(Option<String>),
    City(Option<String>),
    Interests(String),
    Sex(Sex),
    Status(Status),
}

/// A compiled group-by query: which keys to bucket by, in what order, with
/// which equality filters applied before bucketing.
pub struct GroupPlan {
    keys: Vec<Key>,
    order: Order,
    limit: usize,
    sex_eq: Option<Sex>,
    status_eq: Option<Status>,
    country_eq: Option<String>,
    city_eq: Option<String>,
    joined_year: Option<i32>,
    birth_year: Option<i32>,
    interests_eq: Option<String>,
    likes_eq: Option<u32>,
}

/// Sort direction for the count column, applied before the fixed
/// secondary key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    Ascending,
    Descending,
}

/// Parses the recognized group options: `keys` (comma-separated subset of
/// `sex,status,interests,country,city`), `order` (`1` or `-1`), `limit`,
/// and the optional equality filters `sex`, `status`, `country`, `city`,
/// `joined` (year), `birth` (year), `interests` (single value), and `likes`
/// (single likee id).
///
/// # Errors
///
/// [`Error::BadRequest`] on an unknown option, an empty `keys` list, an
/// unrecognized key name, a missing/invalid `order`, or a missing/invalid
/// `limit`.
pub fn parse(params: &HashMap<String, String>) -> Result<GroupPlan> {
    let mut keys: Option<Vec<Key>> = None;
    let mut order: Option<Order> = None;
    let mut limit: Option<usize> = None;
    let mut sex_eq = None;
    let mut status_eq = None;
    let mut country_eq = None;
    let mut city_eq = None;
    let mut joined_year = None;
    let mut birth_year = None;
    let mut interests_eq = None;
    let mut likes_eq = None;

    for (key, value) in params {
        if value.is_empty() {
            return Err(Error::bad_request(format!("empty value for {key}")));
        }
        match key.as_str() {
            "keys" => {
                let parsed = value
                    .split(',')
                    .map(|k| Key::parse(k).ok_or_else(|| Error::bad_request(format!("unknown key: {k}"))))
                    .collect::<Result<Vec<Key>>>()?;
                if parsed.is_empty() {
                    return Err(Error::bad_request("keys must be non-empty"));
                }
                keys = Some(parsed);
            }
            "order" => {
                order = Some(match value.as_str() {
                    "1" => Order::Ascending,
                    "-1" => Order::Descending,
                    other => return Err(Error::bad_request(format!("invalid order: {other}"))),
                });
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
            "sex" => {
                sex_eq = Some(
                    Sex::parse(value).ok_or_else(|| Error::bad_request(format!("invalid sex: {value}")))?,
                );
            }
            "status" => {
                status_eq = Some(
                    Status::parse(value)
                        .ok_or_else(|| Error::bad_request(format!("invalid status: {value}")))?,
                );
            }
            "country" => country_eq = Some(value.clone()),
            "city" => city_eq = Some(value.clone()),
            "joined" => {
                let year: i32 = value
                    .parse()
                    .map_err(|_| Error::bad_request(format!("invalid joined: {value}")))?;
                joined_year = Some(year);
            }
            "birth" => {
                let year: i32 = value
                    .parse()
                    .map_err(|_| Error::bad_request(format!("invalid birth: {value}")))?;
                birth_year = Some(year);
            }
            "interests" => interests_eq = Some(value.clone()),
            "likes" => {
                let likee: u32 = value
                    .parse()
                    .map_err(|_| Error::bad_request(format!("invalid likes: {value}")))?;
                likes_eq = Some(likee);
            }
            "query_id" => {}
            other => return Err(Error::bad_request(format!("unknown group option: {other}"))),
        }
    }

    let keys = keys.ok_or_else(|| Error::bad_request("keys is required"))?;
    let order = order.ok_or_else(|| Error::bad_request("order is required"))?;
    let limit = limit.ok_or_else(|| Error::bad_request("limit is required"))?;

    Ok(GroupPlan {
        keys,
        order,
        limit,
        sex_eq,
        status_eq,
        country_eq,
        city_eq,
        joined_year,
        birth_year,
        interests_eq,
        likes_eq,
    })
}

/// One output row: the bucket's key/value pairs plus its count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    /// `(key name, rendered value)` pairs, in the fixed key order.
    pub fields: Vec<(&'static str, String)>,
    /// Number of matching accounts in this bucket.
    pub count: u32,
}

fn key_name(key: Key) -> &'static str {
    match key {
        Key::Country => "country",
        Key::City => "city",
        Key::Interests => "interests",
        Key::Sex => "sex",
        Key::Status => "status",
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Country(v) | Value::City(v) => v.clone().unwrap_or_default(),
        Value::Interests(v) => v.clone(),
        Value::Sex(sex) => sex.as_str().to_string(),
        Value::Status(status) => status.as_str().to_string(),
    }
}

/// Runs `plan` against `store`: picks a source exactly like `filter`'s
/// priority order, with `likes` / `interests` single-value equality taking
/// precedence over the default full scan, applies the remaining equality
/// filters as residual predicates, fans a row out once per held interest
/// when `interests` is a key, and accumulates counts per distinct bucket.
#[must_use]
pub fn execute(store: &Store, plan: &GroupPlan) -> Vec<GroupRow> {
    let mut buckets: HashMap<Vec<(Key, Value)>, u32> = HashMap::new();

    let mut source: RecordSource = if let Some(likee) = plan.likes_eq {
        RecordSource::array(store.likes.likers_of_all(&[likee]).into_iter().collect())
    } else if let Some(ref interest) = plan.interests_eq {
        RecordSource::array(store.interests.posting_for_all(std::slice::from_ref(interest)))
    } else {
        store.accounts.range_cursor()
    };

    while let Some(id) = source.next() {
        let Ok(account) = store.accounts.get(id) else {
            continue;
        };
        if let Some(sex) = plan.sex_eq {
            if account.sex != sex {
                continue;
            }
        }
        if let Some(status) = plan.status_eq {
            if account.status != status {
                continue;
            }
        }
        if let Some(ref country) = plan.country_eq {
            if store.accounts.resolve_country(account.country) != Some(country.as_str()) {
                continue;
            }
        }
        if let Some(ref city) = plan.city_eq {
            if store.accounts.resolve_city(account.city) != Some(city.as_str()) {
                continue;
            }
        }
        if let Some(year) = plan.joined_year {
            let start = unix_seconds_for_jan_1(year);
            let end = unix_seconds_for_jan_1(year + 1);
            if account.joined < start || account.joined >= end {
                continue;
            }
        }
        if let Some(year) = plan.birth_year {
            let start = unix_seconds_for_jan_1(year);
            let end = unix_seconds_for_jan_1(year + 1);
            if account.birth < start || account.birth >= end {
                continue;
            }
        }
        if let Some(ref interest) = plan.interests_eq {
            if !store.interests.contains_any(id, std::slice::from_ref(interest)) {
                continue;
            }
        }
        if let Some(likee) = plan.likes_eq {
            if !store.likes.likes(id, likee) {
                continue;
            }
        }

        // Keyed by `Key` rather than position so the bucket identity and the
        // secondary sort are independent of the order `keys` was given in:
        // the secondary sort always follows the fixed column order
        // `country, city, interests, sex, status`, not the request's.
        let base: Vec<(Key, Value)> = plan
            .keys
            .iter()
            .filter(|&&k| k != Key::Interests)
            .map(|&k| {
                let value = match k {
                    Key::Country => Value::Country(
                        store
                            .accounts
                            .resolve_country(account.country)
                            .map(str::to_string),
                    ),
                    Key::City => Value::City(
                        store.accounts.resolve_city(account.city).map(str::to_string),
                    ),
                    Key::Sex => Value::Sex(account.sex),
                    Key::Status => Value::Status(account.status),
                    Key::Interests => unreachable!("filtered out above"),
                };
                (k, value)
            })
            .collect();

        if plan.keys.contains(&Key::Interests) {
            let held = store.interests.interests_of(id);
            if held.is_empty() {
                continue;
            }
            for interest in held {
                let mut row = base.clone();
                row.push((Key::Interests, Value::Interests(interest.to_string())));
                row.sort_by_key(|(k, _)| *k);
                *buckets.entry(row).or_insert(0) += 1;
            }
        } else {
            let mut row = base;
            row.sort_by_key(|(k, _)| *k);
            *buckets.entry(row).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<(Vec<(Key, Value)>, GroupRow)> = buckets
        .into_iter()
        .map(|(pairs, count)| {
            let rendered: HashMap<Key, String> =
                pairs.iter().map(|(k, v)| (*k, render(v))).collect();
            let fields = plan
                .keys
                .iter()
                .map(|&k| (key_name(k), rendered[&k].clone()))
                .collect();
            (pairs, GroupRow { fields, count })
        })
        .collect();

    rows.sort_by(|(pairs_a, row_a), (pairs_b, row_b)| {
        // `pairs` is already in the fixed `Key` order (sorted above), so a
        // plain lexicographic comparison of the rendered values is the
        // fixed-order secondary key. Both primary and secondary flip
        // together with the requested direction.
        let secondary_values = |pairs: &[(Key, Value)]| -> Vec<String> {
            pairs.iter().map(|(_, v)| render(v)).collect()
        };
        let primary = row_a.count.cmp(&row_b.count);
        let secondary = secondary_values(pairs_a).cmp(&secondary_values(pairs_b));
        let combined = primary.then(secondary);
        match plan.order {
            Order::Ascending => combined,
            Order::Descending => combined.reverse(),
        }
    });
    let mut rows: Vec<GroupRow> = rows.into_iter().map(|(_, row)| row).collect();
    rows.truncate(plan.limit);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Sex;
    use crate::store::NewAccount;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn populated() -> Store {
        let mut store = Store::new(0);
        for (id, sex, city) in [(1, Sex::Male, "Moscow"), (2, Sex::Male, "Moscow"), (3, Sex::Female, "Kazan")] {
            store
                .accounts
                .insert(NewAccount {
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
                    city: Some(city.to_string()),
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn groups_by_city_and_counts() {
        let store = populated();
        let plan = parse(&params(&[("keys", "city"), ("order", "-1"), ("limit", "10")])).unwrap();
        let rows = execute(&store, &plan);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].fields, vec![("city", "Moscow".to_string())]);
    }

    #[test]
    fn sex_eq_filters_before_bucketing() {
        let store = populated();
        let plan = parse(&params(&[
            ("keys", "city"),
            ("sex", "f"),
            ("order", "-1"),
            ("limit", "10"),
        ]))
        .unwrap();
        let rows = execute(&store, &plan);
        assert_eq!(rows, vec![GroupRow { fields: vec![("city", "Kazan".into())], count: 1 }]);
    }

    #[test]
    fn likes_single_value_selects_liker_source() {
        let mut store = populated();
        store.likes.append(1, 3, 0);
        store.likes.append(2, 3, 0);
        let plan = parse(&params(&[
            ("keys", "sex"),
            ("likes", "3"),
            ("order", "-1"),
            ("limit", "10"),
        ]))
        .unwrap();
        let rows = execute(&store, &plan);
        assert_eq!(rows, vec![GroupRow { fields: vec![("sex", "m".into())], count: 2 }]);
    }

    #[test]
    fn interests_single_value_filters_and_selects_source() {
        let mut store = populated();
        store.interests.add(1, "k");
        store.interests.add(3, "k");
        let plan = parse(&params(&[
            ("keys", "city"),
            ("interests", "k"),
            ("order", "-1"),
            ("limit", "10"),
        ]))
        .unwrap();
        let rows = execute(&store, &plan);
        assert_eq!(rows.len(), 2);
        let total: u32 = rows.iter().map(|r| r.count).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn unknown_key_is_bad_request() {
        assert!(parse(&params(&[("keys", "ghost"), ("limit", "1")])).is_err());
    }

    #[test]
    fn empty_keys_is_bad_request() {
        assert!(parse(&params(&[("keys", ""), ("limit", "1")])).is_err());
    }

    #[test]
    fn missing_order_is_bad_request() {
        assert!(parse(&params(&[("keys", "city"), ("limit", "1")])).is_err());
    }

    #[test]
    fn missing_limit_is_bad_request() {
        assert!(parse(&params(&[("keys", "city"), ("order", "-1")])).is_err());
    }

    #[test]
    fn ascending_order_flips_count_sort() {
        let store = populated();
        let plan = parse(&params(&[("keys", "city"), ("order", "1"), ("limit", "10")])).unwrap();
        let rows = execute(&store, &plan);
        assert_eq!(rows[0].count, 1);
    }
}
