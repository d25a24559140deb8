//! Query normalization.
//!
//! Free-text queries arrive in any format ("Bohemian Rhapsody  Queen",
//! "queen BOHEMIAN rhapsody"); everything downstream works on one canonical
//! lookup key.

/// Canonicalize a free-text query: trim, collapse whitespace runs to a single
/// space, lowercase. Pure and idempotent; whitespace-only input normalizes to
/// the empty string, which callers must reject before resolving.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
