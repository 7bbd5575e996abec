//! Query-string decoding: turns a raw query string into the
//! `HashMap<String, String>` the engine's executors accept.
//!
//! Uses `form_urlencoded` (already a transitive dependency of axum/url)
//! rather than hand-rolled percent-decoding.

use std::collections::HashMap;

use crate::error::ApiError;

/// Decodes `raw` (the part of the URL after `?`, or an empty string if
/// there was none) into a parameter map.
///
/// # Errors
///
/// [`ApiError`] (400) if the same key appears more than once.
pub fn decode(raw: &str) -> Result<HashMap<String, String>, ApiError> {
    let mut params = HashMap::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        if params
            .insert(key.clone().into_owned(), value.into_owned())
            .is_some()
        {
            return Err(ApiError::bad_request(format!("duplicate query key: {key}")));
        }
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_pairs() {
        let params = decode("sex_eq=f&limit=10").unwrap();
        assert_eq!(params.get("sex_eq").map(String::as_str), Some("f"));
        assert_eq!(params.get("limit").map(String::as_str), Some("10"));
    }

    #[test]
    fn decodes_percent_and_plus_encoding() {
        let params = decode("fname_eq=Jane+Doe&email_domain=x%2Ey.ru").unwrap();
        assert_eq!(params.get("fname_eq").map(String::as_str), Some("Jane Doe"));
        assert_eq!(params.get("email_domain").map(String::as_str), Some("x.y.ru"));
    }

    #[test]
    fn rejects_duplicate_keys() {
        assert!(decode("limit=1&limit=2").is_err());
    }

    #[test]
    fn empty_query_string_yields_empty_map() {
        assert!(decode("").unwrap().is_empty());
    }
}
