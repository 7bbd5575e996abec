//! Bulk loader: seeds a [`Store`] from a ZIP of JSON documents, each
//! shaped `{accounts:[…]}`.
//!
//! Processing order within and across entries doesn't matter, because
//! [`Store::insert_account`] appends an account's own outgoing likes
//! without checking that the likee already exists — the like graph is a
//! plain adjacency vector indexed by id, not a referential index.

use std::io::Read;

use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::wire::{decode_account, AccountJson};
use crate::Store;

/// Top-level shape of one ZIP entry: `{"accounts": [...]}`.
#[derive(Debug, serde::Deserialize)]
struct AccountsContainer {
    accounts: Vec<AccountJson>,
}

/// Outcome of a bulk load: how many accounts were seeded, for boot logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    /// Number of accounts inserted across every ZIP entry.
    pub accounts: usize,
}

/// Reads every entry of the ZIP backing `reader`, decodes each as an
/// [`AccountsContainer`], and inserts every account into `store` (account
/// row, then interests, then outgoing likes).
///
/// # Errors
///
/// [`Error::BadRequest`] if the archive can't be opened, an entry isn't
/// valid JSON in the expected shape, or an account within it fails
/// validation (duplicate id/email, invalid enum literal, malformed phone).
/// A failure partway through leaves every account processed so far in
/// place — the seed data is trusted to be internally consistent, so this
/// is treated as a fatal load error rather than something to roll back.
pub fn load<R: Read + std::io::Seek>(store: &mut Store, reader: R) -> Result<LoadSummary> {
    let mut archive =
        ZipArchive::new(reader).map_err(|e| Error::bad_request(format!("bad seed archive: {e}")))?;

    let mut accounts = 0usize;
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|e| Error::bad_request(format!("bad zip entry: {e}")))?;
        let entry_name = entry.name().to_string();
        let container: AccountsContainer = serde_json::from_reader(entry).map_err(|e| {
            Error::bad_request(format!("malformed seed entry {entry_name}: {e}"))
        })?;

        for account_json in container.accounts {
            let (new_account, interests, likes) = decode_account(account_json)?;
            store.insert_account(new_account, &interests, &likes)?;
            accounts += 1;
        }
    }

    Ok(LoadSummary { accounts })
}

/// Reads the fixed process-wide `NOW` constant: the first line of a
/// plain-text file, parsed as a decimal unix timestamp.
///
/// # Errors
///
/// [`Error::BadRequest`] if the file can't be read or its first line isn't
/// a valid integer.
pub fn read_now(contents: &str) -> Result<i64> {
    contents
        .lines()
        .next()
        .ok_or_else(|| Error::bad_request("options file is empty"))?
        .trim()
        .parse()
        .map_err(|_| Error::bad_request("options file's first line is not an integer"))
}
