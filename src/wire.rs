//! JSON wire shapes shared by the bulk loader and the insert/update entry
//! points: one `serde`-derived struct per payload shape, plus the
//! enum/phone (de)serialization the raw JSON doesn't map to directly.

use serde::{Deserialize, Serialize};

use crate::account::{LikeEdge, Phone, Sex, Status};
use crate::error::{Error, Result};
use crate::store::NewAccount;

/// One account as it appears in a bulk-load ZIP entry or an insert body.
/// `likes` is only ever present in a bulk-load entry, never in an
/// `update` body (the loader and [`AccountPatchJson`] are kept as
/// separate types for exactly this reason).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountJson {
    pub id: u32,
    pub email: String,
    #[serde(default)]
    pub fname: Option<String>,
    #[serde(default)]
    pub sname: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub sex: String,
    pub birth: i64,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    pub joined: i64,
    pub status: String,
    #[serde(default)]
    pub premium: Option<PremiumJson>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub likes: Vec<LikeJson>,
}

/// `premium: {start, finish}` on the wire; `finish` is renamed to
/// `premium_end` internally to read as a half-open-ish pair rather than a
/// verb.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PremiumJson {
    pub start: i64,
    pub finish: i64,
}

/// One outgoing like edge as it appears nested in an [`AccountJson`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LikeJson {
    pub id: u32,
    pub ts: i64,
}

/// Request body of `POST /accounts/likes/`: a flat batch of
/// `(liker, likee, ts)` triples, independent of any single account.
#[derive(Debug, Clone, Deserialize)]
pub struct LikesBatchJson {
    pub likes: Vec<RawLikeJson>,
}

/// One edge within a [`LikesBatchJson`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawLikeJson {
    pub liker: u32,
    pub likee: u32,
    pub ts: i64,
}

/// Decodes a bulk like-append body into the [`LikeEdge`]s
/// [`crate::Store::append_likes_bulk`] expects.
#[must_use]
pub fn decode_likes_batch(json: LikesBatchJson) -> Vec<LikeEdge> {
    json.likes
        .into_iter()
        .map(|like| LikeEdge {
            from: like.liker,
            to: like.likee,
            ts: like.ts,
        })
        .collect()
}

/// The `update` request body: every field optional, `likes` rejected
/// outright if present.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountPatchJson {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub fname: Option<String>,
    #[serde(default)]
    pub sname: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub birth: Option<i64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub joined: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub premium: Option<PremiumJson>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    /// Present only to be rejected: `update` payloads must not carry a
    /// `likes` key at all.
    #[serde(default)]
    pub likes: Option<serde_json::Value>,
}

/// Converts a decoded `AccountJson` into a [`NewAccount`] plus its raw
/// like edges, resolving every enum/phone field and erroring on a
/// malformed one.
///
/// # Errors
///
/// [`Error::BadRequest`] if `sex`, `status`, or `phone` fail to parse.
pub fn decode_account(json: AccountJson) -> Result<(NewAccount, Vec<String>, Vec<LikeEdge>)> {
    let sex = Sex::parse(&json.sex)
        .ok_or_else(|| Error::bad_request(format!("invalid sex: {}", json.sex)))?;
    let status = Status::parse(&json.status)
        .ok_or_else(|| Error::bad_request(format!("invalid status: {}", json.status)))?;
    let phone = json
        .phone
        .as_deref()
        .map(Phone::parse)
        .transpose()?;
    let premium = json.premium.map_or((0, 0), |p| (p.start, p.finish));
    let likes = json
        .likes
        .iter()
        .map(|like| LikeEdge {
            from: json.id,
            to: like.id,
            ts: like.ts,
        })
        .collect();

    let new_account = NewAccount {
        id: json.id,
        email: json.email,
        fname: json.fname,
        sname: json.sname,
        phone,
        sex,
        birth: json.birth,
        joined: json.joined,
        status,
        premium,
        country: json.country,
        city: json.city,
    };
    Ok((new_account, json.interests, likes))
}

/// Decodes an `update` body. `likes` is not a recognized field of
/// [`AccountPatchJson`] at all, so a payload containing it is rejected
/// before this function ever runs.
///
/// # Errors
///
/// [`Error::BadRequest`] if `sex`, `status`, or `phone` fail to parse, or
/// if `likes` is present.
pub fn decode_patch(json: AccountPatchJson) -> Result<crate::account::PartialAccount> {
    if json.likes.is_some() {
        return Err(Error::bad_request("update payload cannot contain likes"));
    }
    let sex = json
        .sex
        .as_deref()
        .map(|s| Sex::parse(s).ok_or_else(|| Error::bad_request(format!("invalid sex: {s}"))))
        .transpose()?;
    let status = json
        .status
        .as_deref()
        .map(|s| Status::parse(s).ok_or_else(|| Error::bad_request(format!("invalid status: {s}"))))
        .transpose()?;
    let phone = json.phone.as_deref().map(Phone::parse).transpose()?;
    let premium = json.premium.map(|p| (p.start, p.finish));

    Ok(crate::account::PartialAccount {
        email: json.email,
        fname: json.fname,
        sname: json.sname,
        phone,
        sex,
        birth: json.birth,
        joined: json.joined,
        status,
        premium,
        country: json.country,
        city: json.city,
        interests: json.interests,
    })
}
