//! Small string helpers shared by the engine.

use crate::constants::TRUTHY_TOKENS;

/// Check whether a rendered value is one of the truthy tokens.
///
/// Surrounding whitespace is ignored and the comparison is case-insensitive,
/// so `" True "`, `"YES"` and `"on"` are all truthy. An empty string is not.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    TRUTHY_TOKENS.iter().any(|token| token.eq_ignore_ascii_case(value))
}

/// Parse an optional integer, treating an empty string as absent.
///
/// Returns `Ok(None)` for empty input, `Ok(Some(n))` for a valid integer and
/// `Err(())` otherwise, leaving the error message to the caller.
pub fn parse_optional_int(value: &str) -> Result<Option<i64>, ()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value.parse::<i64>().map(Some).map_err(|_| ())
}

/// Closest candidate to a misspelled name, if any is close enough.
///
/// Uses Levenshtein distance, accepting at most a third of the name's length
/// (and at least 2) edits. Comparison ignores ASCII case.
#[must_use]
pub fn did_you_mean<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let name = name.to_ascii_lowercase();
    let max_distance = (name.chars().count() / 3).max(2);
    candidates
        .into_iter()
        .map(|candidate| (candidate, strsim::levenshtein(&name, &candidate.to_ascii_lowercase())))
        .filter(|(_, distance)| *distance <= max_distance)
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}
