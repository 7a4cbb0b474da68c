//! Fuzzy player-name reconciliation
//!
//! Players retype their in-game names by hand, so the ledger sees
//! near-identical variants of the same identity. Two names are the same
//! identity when they match exactly after whitespace/case normalization,
//! or when both are plain ASCII, long enough, agree on their first and
//! last alphanumeric character, and differ by at most one edit. Names
//! with any non-ASCII character never fuzzy-match; a single accented
//! letter is treated as a deliberate distinction.
//!
//! The thresholds are heuristics, kept here as named constants so they
//! can be tuned without touching ledger logic.

/// Minimum normalized length before fuzzy matching is considered.
pub const MIN_FUZZY_LEN: usize = 5;

/// Maximum Levenshtein distance treated as a typo.
pub const MAX_EDIT_DISTANCE: usize = 1;

/// Normalized comparison form: trimmed, inner whitespace collapsed to a
/// single space, lowercased.
pub fn canonical(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whether two display names refer to the same player identity.
pub fn same_identity(a: &str, b: &str) -> bool {
    let ca = canonical(a);
    let cb = canonical(b);
    if ca == cb {
        return true;
    }
    if !ca.is_ascii() || !cb.is_ascii() {
        return false;
    }
    if ca.len() < MIN_FUZZY_LEN || cb.len() < MIN_FUZZY_LEN {
        return false;
    }
    let ends_a = endpoints(&ca);
    let ends_b = endpoints(&cb);
    if ends_a.is_none() || ends_a != ends_b {
        return false;
    }
    edit_distance(ca.as_bytes(), cb.as_bytes()) <= MAX_EDIT_DISTANCE
}

/// The better display variant of two names for the same identity: more
/// alphabetic characters wins, ties go to the longer string, then to the
/// first argument.
pub fn better_display<'a>(a: &'a str, b: &'a str) -> &'a str {
    let alpha = |s: &str| s.chars().filter(|c| c.is_alphabetic()).count();
    let (aa, ab) = (alpha(a), alpha(b));
    if ab > aa || (ab == aa && b.len() > a.len()) {
        b
    } else {
        a
    }
}

/// First and last alphanumeric character of a normalized name.
fn endpoints(s: &str) -> Option<(char, char)> {
    let mut alnum = s.chars().filter(|c| c.is_ascii_alphanumeric());
    let first = alnum.next()?;
    let last = alnum.last().unwrap_or(first);
    Some((first, last))
}

/// Classic two-row Levenshtein distance over bytes.
fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, &ac) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, &bc) in b.iter().enumerate() {
            let sub = prev[j] + usize::from(ac != bc);
            cur[j + 1] = sub.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
