//! Account store: a vector-indexed table keyed by dense account id,
//! owning the `country`/`city` interners and the email uniqueness index.

use crate::account::{Account, PartialAccount, Phone, Sex, Status};
use crate::error::{Error, Result};
use crate::interner::InvertedIndex;
use crate::source::RecordSource;

/// The fixed-width fields needed to insert a brand new account. `city`
/// and `country` are plain strings here; the store interns them.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Primary key, client-assigned.
    pub id: u32,
    /// Globally unique.
    pub email: String,
    /// First name.
    pub fname: Option<String>,
    /// Surname.
    pub sname: Option<String>,
    /// Compressed phone.
    pub phone: Option<Phone>,
    /// Sex.
    pub sex: Sex,
    /// Seconds since epoch.
    pub birth: i64,
    /// Seconds since epoch.
    pub joined: i64,
    /// Relationship status.
    pub status: Status,
    /// `(start, end)`, both `0` for "no premium".
    pub premium: (i64, i64),
    /// Country name, if present.
    pub country: Option<String>,
    /// City name, if present.
    pub city: Option<String>,
}

/// Column-oriented account table: a `Vec<Option<Account>>` indexed by id,
/// an email→id map enforcing uniqueness, and the `city`/`country`
/// interners.
#[derive(Debug)]
pub struct AccountStore {
    rows: Vec<Option<Account>>,
    max_id: Option<u32>,
    email_index: std::collections::HashMap<String, u32>,
    city_index: InvertedIndex,
    country_index: InvertedIndex,
    now: i64,
}

impl AccountStore {
    /// Builds an empty store. `now` is the process-wide fixed timestamp
    /// used to compute `premium_now`.
    #[must_use]
    pub fn new(now: i64) -> Self {
        AccountStore {
            rows: Vec::new(),
            max_id: None,
            email_index: std::collections::HashMap::new(),
            city_index: InvertedIndex::new(),
            country_index: InvertedIndex::new(),
            now,
        }
    }

    /// The fixed boot-time `NOW` constant.
    #[must_use]
    pub fn now(&self) -> i64 {
        self.now
    }

    fn ensure_capacity(&mut self, id: u32) {
        let needed = id as usize + 1;
        if self.rows.len() < needed {
            self.rows.resize_with(needed, || None);
        }
    }

    fn slot(&self, id: u32) -> Option<&Account> {
        self.rows.get(id as usize).and_then(Option::as_ref)
    }

    /// Fetches an account by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `id` is absent.
    pub fn get(&self, id: u32) -> Result<&Account> {
        self.slot(id).ok_or(Error::NotFound)
    }

    /// Resolves `city`'s interned id, if it's been seen before.
    #[must_use]
    pub fn lookup_city(&self, city: &str) -> Option<u32> {
        self.city_index.lookup(city)
    }

    /// Resolves `country`'s interned id, if it's been seen before.
    #[must_use]
    pub fn lookup_country(&self, country: &str) -> Option<u32> {
        self.country_index.lookup(country)
    }

    /// The posting of account ids whose `city` equals `city`.
    #[must_use]
    pub fn city_posting(&self, city: &str) -> Vec<u32> {
        self.city_index
            .posting_for(city)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The posting of account ids whose `city` is any of `cities`.
    #[must_use]
    pub fn city_posting_any(&self, cities: &[String]) -> Vec<u32> {
        let mut seen = std::collections::HashSet::new();
        for city in cities {
            if let Some(posting) = self.city_index.posting_for(city) {
                seen.extend(posting.iter().copied());
            }
        }
        seen.into_iter().collect()
    }

    /// Resolves a city id back to its string.
    #[must_use]
    pub fn resolve_city(&self, id: u32) -> Option<&str> {
        self.city_index.resolve(id)
    }

    /// Resolves a country id back to its string.
    #[must_use]
    pub fn resolve_country(&self, id: u32) -> Option<&str> {
        self.country_index.resolve(id)
    }

    /// A cursor over every present id, highest to lowest.
    #[must_use]
    pub fn range_cursor(&self) -> RecordSource {
        RecordSource::range(self.max_id.unwrap_or(0))
    }

    /// The highest id ever inserted, if any.
    #[must_use]
    pub fn max_id(&self) -> Option<u32> {
        self.max_id
    }

    /// Inserts a brand-new account.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] if `id` or `email` is already taken.
    pub fn insert(&mut self, new: NewAccount) -> Result<()> {
        self.ensure_capacity(new.id);
        if self.slot(new.id).is_some() {
            return Err(Error::bad_request(format!("id {} already exists", new.id)));
        }
        if self.email_index.contains_key(&new.email) {
            return Err(Error::bad_request(format!(
                "email {} already taken",
                new.email
            )));
        }

        let city = new
            .city
            .as_deref()
            .map_or(0, |city| self.city_index.set(new.id, city));
        let country = new
            .country
            .as_deref()
            .map_or(0, |country| self.country_index.set(new.id, country));

        let mut account = Account {
            id: new.id,
            email: new.email.clone(),
            fname: new.fname,
            sname: new.sname,
            phone: new.phone,
            sex: new.sex,
            birth: new.birth,
            joined: new.joined,
            status: new.status,
            premium_start: new.premium.0,
            premium_end: new.premium.1,
            premium_now: false,
            city,
            country,
        };
        account.recompute_premium_now(self.now);

        self.email_index.insert(new.email, new.id);
        self.max_id = Some(self.max_id.map_or(new.id, |max| max.max(new.id)));
        self.rows[new.id as usize] = Some(account);
        Ok(())
    }

    /// Applies `patch` to `id`. Every absent field in `patch` leaves the
    /// stored field unchanged. Interests are handled by the interest
    /// store; callers pass `patch.interests` on to it themselves (the
    /// account row holds no interest data).
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `id` is absent. [`Error::BadRequest`] if the
    /// patch's email collides with a different account.
    pub fn update(&mut self, id: u32, patch: &PartialAccount) -> Result<()> {
        if self.slot(id).is_none() {
            return Err(Error::NotFound);
        }

        if let Some(ref email) = patch.email {
            if let Some(&owner) = self.email_index.get(email) {
                if owner != id {
                    return Err(Error::bad_request(format!("email {email} already taken")));
                }
            }
        }
        let account = self.rows[id as usize].as_mut().expect("checked above");

        if let Some(ref email) = patch.email {
            if email != &account.email {
                self.email_index.remove(&account.email);
                self.email_index.insert(email.clone(), id);
                account.email = email.clone();
            }
        }
        if let Some(ref fname) = patch.fname {
            account.fname = Some(fname.clone());
        }
        if let Some(ref sname) = patch.sname {
            account.sname = Some(sname.clone());
        }
        if let Some(phone) = patch.phone {
            account.phone = Some(phone);
        }
        if let Some(sex) = patch.sex {
            account.sex = sex;
        }
        if let Some(birth) = patch.birth {
            account.birth = birth;
        }
        if let Some(joined) = patch.joined {
            account.joined = joined;
        }
        if let Some(status) = patch.status {
            account.status = status;
        }
        if let Some((start, end)) = patch.premium {
            account.premium_start = start;
            account.premium_end = end;
        }
        if let Some(ref country) = patch.country {
            self.country_index.clear_for(id);
            account.country = self.country_index.set(id, country);
        }
        if let Some(ref city) = patch.city {
            self.city_index.clear_for(id);
            account.city = self.city_index.set(id, city);
        }
        account.recompute_premium_now(self.now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: u32, email: &str) -> NewAccount {
        NewAccount {
            id,
            email: email.to_string(),
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
        }
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut store = AccountStore::new(1_000);
        store.insert(sample(1, "a@x.ru")).unwrap();
        let account = store.get(1).unwrap();
        assert_eq!(account.email, "a@x.ru");
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut store = AccountStore::new(0);
        store.insert(sample(1, "a@x.ru")).unwrap();
        assert!(store.insert(sample(1, "b@x.ru")).is_err());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let mut store = AccountStore::new(0);
        store.insert(sample(1, "a@x.ru")).unwrap();
        assert!(store.insert(sample(2, "a@x.ru")).is_err());
    }

    #[test]
    fn update_missing_id_is_not_found() {
        let mut store = AccountStore::new(0);
        let patch = PartialAccount::default();
        assert_eq!(store.update(1, &patch), Err(Error::NotFound));
    }

    #[test]
    fn update_leaves_unset_fields_untouched() {
        let mut store = AccountStore::new(0);
        store.insert(sample(1, "a@x.ru")).unwrap();
        let patch = PartialAccount {
            sname: Some("Doe".into()),
            ..Default::default()
        };
        store.update(1, &patch).unwrap();
        let account = store.get(1).unwrap();
        assert_eq!(account.email, "a@x.ru");
        assert_eq!(account.sname.as_deref(), Some("Doe"));
    }

    #[test]
    fn premium_now_tracks_the_fixed_clock() {
        let mut store = AccountStore::new(500);
        let mut account = sample(1, "a@x.ru");
        account.premium = (100, 1000);
        store.insert(account).unwrap();
        assert!(store.get(1).unwrap().premium_now);
    }

    #[test]
    fn range_cursor_covers_every_present_id_descending() {
        let mut store = AccountStore::new(0);
        store.insert(sample(3, "a@x.ru")).unwrap();
        store.insert(sample(1, "b@x.ru")).unwrap();
        let ids: Vec<u32> = store.range_cursor().collect();
        assert_eq!(ids, vec![3, 2, 1, 0]);
    }
}
