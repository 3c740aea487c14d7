//! Collision-free filenames inside a directory.
//!
//! When `desired` is taken, candidates are tried in a fixed order:
//! a trailing number is incremented first (`snippet11.sol` -> `snippet12.sol`,
//! up to `9999`), then a fresh counter is appended (`snippet.sol` ->
//! `snippet1.sol`, up to `999`). If every candidate is taken the name gets a
//! millisecond timestamp suffix, which is not checked.

use chrono::Utc;

use crate::error::StoreError;
use crate::store::{join_path, path_exists, VirtualFileStore};

/// Exclusive upper bound when incrementing an existing trailing number.
pub const TRAILING_COUNTER_LIMIT: u64 = 10_000;
/// Exclusive upper bound for a freshly appended counter.
pub const APPENDED_COUNTER_LIMIT: u64 = 1_000;

/// A filename split at its last dot; the extension keeps the dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameParts<'a> {
    pub base: &'a str,
    pub extension: &'a str,
}

impl<'a> NameParts<'a> {
    /// Names without a dot, or whose only dot is the first character, have no
    /// extension.
    pub fn split(name: &'a str) -> Self {
        match name.rfind('.') {
            Some(dot) if dot > 0 => Self {
                base: &name[..dot],
                extension: &name[dot..],
            },
            _ => Self {
                base: name,
                extension: "",
            },
        }
    }

    /// Split `base` into the text up to its last non-digit and the trailing
    /// digits. `None` if there are no trailing digits or nothing precedes them.
    pub fn trailing_number(&self) -> Option<(&'a str, &'a str)> {
        let digits_start = self
            .base
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(index, _)| index)?;
        if digits_start == 0 {
            return None;
        }
        Some((&self.base[..digits_start], &self.base[digits_start..]))
    }
}

/// Lazy sequence of replacement names in the order they are tried (not
/// including the desired name itself).
pub fn candidates(desired: &str) -> impl Iterator<Item = String> + '_ {
    let parts = NameParts::split(desired);

    // An overlong number cannot be incremented within the limit.
    let incremented = parts
        .trailing_number()
        .and_then(|(prefix, digits)| {
            let next = digits.parse::<u64>().ok()?.checked_add(1)?;
            Some((prefix, next))
        })
        .into_iter()
        .flat_map(move |(prefix, next)| {
            (next..TRAILING_COUNTER_LIMIT)
                .map(move |counter| format!("{prefix}{counter}{}", parts.extension))
        });

    let appended = (1..APPENDED_COUNTER_LIMIT)
        .map(move |counter| format!("{}{counter}{}", parts.base, parts.extension));

    incremented.chain(appended)
}

/// Name used once every candidate is taken.
pub fn timestamp_fallback(desired: &str) -> String {
    let parts = NameParts::split(desired);
    format!(
        "{}-{}{}",
        parts.base,
        Utc::now().timestamp_millis(),
        parts.extension
    )
}

/// Resolve `desired` against a synchronous existence predicate.
pub fn resolve_unique_name<F>(mut exists: F, desired: &str) -> String
where
    F: FnMut(&str) -> bool,
{
    if !exists(desired) {
        return desired.to_string();
    }
    candidates(desired)
        .find(|candidate| !exists(candidate))
        .unwrap_or_else(|| timestamp_fallback(desired))
}

/// Resolve `desired` against the entries of `dir` in a store.
///
/// `NotFound` marks a name as free; any other store error is returned.
pub async fn resolve_in_store<S>(store: &S, dir: &str, desired: &str) -> Result<String, StoreError>
where
    S: VirtualFileStore + ?Sized,
{
    if !path_exists(store, &join_path(dir, desired)).await? {
        return Ok(desired.to_string());
    }
    for candidate in candidates(desired) {
        if !path_exists(store, &join_path(dir, &candidate)).await? {
            return Ok(candidate);
        }
    }
    Ok(timestamp_fallback(desired))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn taken(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn resolve(existing: &HashSet<String>, desired: &str) -> String {
        resolve_unique_name(|name| existing.contains(name), desired)
    }

    #[test]
    fn free_name_is_returned_unchanged() {
        assert_eq!(resolve(&taken(&[]), "snippet.sol"), "snippet.sol");
    }

    #[test]
    fn appends_counter_when_no_trailing_number() {
        let existing = taken(&["snippet.sol"]);
        assert_eq!(resolve(&existing, "snippet.sol"), "snippet1.sol");

        let existing = taken(&["snippet.sol", "snippet1.sol"]);
        assert_eq!(resolve(&existing, "snippet.sol"), "snippet2.sol");
    }

    #[test]
    fn increments_trailing_number() {
        let existing = taken(&["snippet11.sol"]);
        assert_eq!(resolve(&existing, "snippet11.sol"), "snippet12.sol");

        let existing = taken(&["v2.tar", "v3.tar"]);
        assert_eq!(resolve(&existing, "v2.tar"), "v4.tar");
    }

    #[test]
    fn leading_zeros_are_dropped_on_increment() {
        let existing = taken(&["log007.txt"]);
        assert_eq!(resolve(&existing, "log007.txt"), "log8.txt");
    }

    #[test]
    fn all_digit_base_appends_a_counter() {
        let existing = taken(&["2024.txt"]);
        assert_eq!(resolve(&existing, "2024.txt"), "20241.txt");
    }

    #[test]
    fn dotfiles_and_extensionless_names() {
        assert_eq!(resolve(&taken(&[".env"]), ".env"), ".env1");
        assert_eq!(resolve(&taken(&["Makefile"]), "Makefile"), "Makefile1");
        assert_eq!(
            resolve(&taken(&["archive.tar.gz"]), "archive.tar.gz"),
            "archive.tar1.gz"
        );
    }

    #[test]
    fn exhausted_trailing_range_falls_back_to_appending() {
        let existing = taken(&["file9999.txt"]);
        assert_eq!(resolve(&existing, "file9999.txt"), "file99991.txt");
    }

    #[test]
    fn oversized_trailing_number_is_skipped() {
        let desired = "n99999999999999999999999.txt";
        let existing = taken(&[desired]);
        assert_eq!(
            resolve(&existing, desired),
            "n999999999999999999999991.txt"
        );
    }

    #[test]
    fn timestamp_fallback_when_everything_is_taken() {
        let resolved = resolve_unique_name(|name| !name.contains('-'), "a.txt");
        assert!(resolved.starts_with("a-"));
        assert!(resolved.ends_with(".txt"));
    }

    #[test]
    fn candidate_order_prefers_increment() {
        let first: Vec<String> = candidates("snippet11.sol").take(2).collect();
        assert_eq!(first, vec!["snippet12.sol", "snippet13.sol"]);

        // 9998 and 9999 from the increment, then the appended counter.
        let tail: Vec<String> = candidates("a9997").skip(2).take(1).collect();
        assert_eq!(tail, vec!["a99971"]);
    }

    #[test]
    fn name_parts_split() {
        assert_eq!(
            NameParts::split("a.b.c"),
            NameParts {
                base: "a.b",
                extension: ".c"
            }
        );
        assert_eq!(NameParts::split("abc12").trailing_number(), Some(("abc", "12")));
        assert_eq!(NameParts::split("12").trailing_number(), None);
        assert_eq!(NameParts::split("abc").trailing_number(), None);
    }
}
