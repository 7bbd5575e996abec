//! Account row shape: the fixed-width part of a record.
//!
//! Interests and likes are *not* part of this struct — they live in the
//! interest store and like store respectively, keyed by account id, to
//! keep this row cheap to copy and scan during a filter pass.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// `8(9XX)YYYYYYY` — area code in parens, 7-digit subscriber number.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^8\((\d{3})\)(\d{7})$").expect("static pattern is valid"));

/// Sex, encoded as in the wire protocol (`1` = male, `2` = female).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    /// Wire literal `m`.
    Male = 1,
    /// Wire literal `f`.
    Female = 2,
}

impl Sex {
    /// Parses the single-character wire literal.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "m" => Some(Sex::Male),
            "f" => Some(Sex::Female),
            _ => None,
        }
    }

    /// Renders back to the wire literal.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "m",
            Sex::Female => "f",
        }
    }

    /// The opposite sex, used by Recommend's strictly cross-sex ranking.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }
}

/// Relationship status, encoded `1` (single) / `2` (taken) / `3` (complicated).
///
/// The wire literals are the three literal Cyrillic tokens used by the
/// original contest protocol; they are not translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// `свободны`
    Single = 1,
    /// `заняты`
    Taken = 2,
    /// `всё сложно`
    Complicated = 3,
}

impl Status {
    /// Parses one of the three literal Cyrillic wire tokens.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "свободны" => Some(Status::Single),
            "заняты" => Some(Status::Taken),
            "всё сложно" => Some(Status::Complicated),
            _ => None,
        }
    }

    /// Renders back to the wire literal.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Single => "свободны",
            Status::Taken => "заняты",
            Status::Complicated => "всё сложно",
        }
    }

    /// Recommend's composite sort places single first, then complicated,
    /// then taken — preserved verbatim from the reference's precomputed
    /// `status_for_recommend` column. Expressed as a descending rank so a
    /// single tuple comparison handles the whole ordering.
    #[must_use]
    pub fn recommend_rank(self) -> u8 {
        match self {
            Status::Single => 2,
            Status::Complicated => 1,
            Status::Taken => 0,
        }
    }
}

/// A compressed `8(9XX)YYYYYYY` phone number: a 3-digit area code plus a
/// 7-digit subscriber number. `None` represents "absent" (wire value `0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Phone {
    /// The 3-digit area code (always in `[0, 999]`).
    pub code: u16,
    /// The 7-digit subscriber number.
    pub subscriber: u32,
}

impl Phone {
    /// Parses a phone string in `8(9XX)YYYYYYY` form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadRequest`] if the string doesn't match the shape.
    pub fn parse(s: &str) -> Result<Self> {
        let caps = PHONE_PATTERN
            .captures(s)
            .ok_or_else(|| Error::bad_request(format!("invalid phone format: {s}")))?;
        let code: u16 = caps[1].parse().expect("3 ascii digits");
        let subscriber: u32 = caps[2].parse().expect("7 ascii digits");
        Ok(Phone { code, subscriber })
    }
}

/// A single id → timestamp like edge, as it appears on the wire and in
/// bulk-append requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeEdge {
    /// The liker's account id.
    pub from: u32,
    /// The likee's account id.
    pub to: u32,
    /// Seconds-since-epoch timestamp of this like.
    pub ts: i64,
}

/// The fixed-width row of an account, minus interests and likes.
#[derive(Debug, Clone)]
pub struct Account {
    /// Primary key.
    pub id: u32,
    /// Globally unique.
    pub email: String,
    /// First name.
    pub fname: Option<String>,
    /// Surname.
    pub sname: Option<String>,
    /// Compressed phone number.
    pub phone: Option<Phone>,
    /// Sex.
    pub sex: Sex,
    /// Seconds since epoch.
    pub birth: i64,
    /// Seconds since epoch.
    pub joined: i64,
    /// Relationship status.
    pub status: Status,
    /// `0` ≡ no premium.
    pub premium_start: i64,
    /// `0` ≡ no premium.
    pub premium_end: i64,
    /// `premium_start <= NOW <= premium_end`, cached at insert/update time.
    pub premium_now: bool,
    /// Interned city id; `0` ≡ absent.
    pub city: u32,
    /// Interned country id; `0` ≡ absent.
    pub country: u32,
}

impl Account {
    /// Recomputes [`Account::premium_now`] against a fixed `now`.
    ///
    /// `premium_start == 0` always means "no premium" regardless of `now`.
    pub fn recompute_premium_now(&mut self, now: i64) {
        self.premium_now =
            self.premium_start != 0 && self.premium_start <= now && now <= self.premium_end;
    }

    /// Year of [`Account::birth`], UTC, for `birth_year` filtering and
    /// group-by bucketing.
    #[must_use]
    pub fn birth_year(&self) -> i32 {
        civil_year_from_unix_seconds(self.birth)
    }
}

/// A patch applied by `update`: every field is optional, and an
/// absent field leaves the stored value unchanged. `likes` has no place
/// here — reassigning likes through `update` is rejected, so the
/// wire decoder rejects a patch payload that contains a `likes` key before
/// this type is ever constructed.
#[derive(Debug, Clone, Default)]
pub struct PartialAccount {
    /// New email, if present.
    pub email: Option<String>,
    /// New first name. A JSON `null` here is the wire shape's only way to
    /// clear an optional field; the decoder distinguishes "absent from the
    /// patch" (`None`) from "explicitly set to empty" at the JSON layer,
    /// so by the time it reaches this struct `Some("".into())` and `None`
    /// are already the two distinguishable states.
    pub fname: Option<String>,
    /// New surname.
    pub sname: Option<String>,
    /// New phone.
    pub phone: Option<Phone>,
    /// New sex.
    pub sex: Option<Sex>,
    /// New birth timestamp.
    pub birth: Option<i64>,
    /// New joined timestamp.
    pub joined: Option<i64>,
    /// New status.
    pub status: Option<Status>,
    /// New premium window (start, end); both are replaced together.
    pub premium: Option<(i64, i64)>,
    /// New city string (re-interned on apply).
    pub city: Option<String>,
    /// New country string (re-interned on apply).
    pub country: Option<String>,
    /// New interests set, wholesale replacement.
    pub interests: Option<Vec<String>>,
}

/// Days-from-civil / civil-from-days conversion (Howard Hinnant's
/// algorithm), used to turn a unix timestamp into a UTC calendar year
/// without pulling in a date/time crate for a single field access.
fn civil_year_from_unix_seconds(seconds: i64) -> i32 {
    let days = seconds.div_euclid(86_400);
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let is_jan_or_feb = mp >= 10;
    (y + i64::from(is_jan_or_feb)) as i32
}

/// Seconds-since-epoch of Jan 1 UTC of `year`, used by `birth_year`
/// filtering to build the half-open `[start, end)` range.
#[must_use]
pub fn unix_seconds_for_jan_1(year: i32) -> i64 {
    // Hinnant's days_from_civil specialized to month=1, day=1: since the
    // algorithm's internal year counts from March, Jan 1 of `year` falls
    // 306 days into the internal year `year - 1`.
    let y = i64::from(year) - 1;
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let doe = 365 * yoe + yoe / 4 - yoe / 100 + 306;
    let days = era * 146_097 + doe as i64 - 719_468;
    days * 86_400
}
