//! Query string helpers
//!
//! Adds or replaces a single query parameter on an already-built URL string,
//! leaving the rest of the URL untouched.

use regex::{Captures, Regex};

/// Add `key=value` to `url`, replacing the value in place if `key` is present.
///
/// Matching is case-insensitive and anchored on `?` or `&`, so `limit` never
/// matches inside `sublimit`. Applying the same pair twice yields the same URL.
///
/// ```
/// use pokedex_bridge::query::append_query_param;
///
/// let url = append_query_param("https://pokeapi.co/api/v2/pokemon", "limit", "60");
/// assert_eq!(url, "https://pokeapi.co/api/v2/pokemon?limit=60");
///
/// let url = append_query_param(&url, "LIMIT", "20");
/// assert_eq!(url, "https://pokeapi.co/api/v2/pokemon?LIMIT=20");
/// ```
pub fn append_query_param(url: &str, key: &str, value: impl ToString) -> String {
    let value = value.to_string();

    let Ok(existing) = Regex::new(&format!(r"(?i)([?&]){}=.*?(&|$)", regex::escape(key))) else {
        return append(url, key, &value);
    };

    if existing.is_match(url) {
        return existing
            .replace(url, |caps: &Captures| {
                format!("{}{key}={value}{}", &caps[1], &caps[2])
            })
            .into_owned();
    }

    append(url, key, &value)
}

fn append(url: &str, key: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{key}={value}")
}
