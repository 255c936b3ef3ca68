use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static ZIP_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{5})\b").unwrap());
static ZIP_EXACT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{5}$").unwrap());

/// Find the first standalone 5-digit run in free text, e.g. the ZIP
/// embedded in "123 Main St, Kenner, LA 70062".
#[inline]
pub fn extract_zip(text: &str) -> Option<String> {
    ZIP_IN_TEXT.find(text).map(|m| m.as_str().to_string())
}

/// Normalize a raw ZIP value for comparison: strip whitespace and dashes,
/// truncate ZIP+4 to the first 5 characters, then validate.
pub fn normalize_zip(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .take(5)
        .collect();

    if ZIP_EXACT.is_match(&cleaned) {
        Some(cleaned)
    } else {
        None
    }
}

/// Test whether a property falls in the buyer's preferred ZIP set.
///
/// The explicit ZIP field wins over anything parsed from the address; an
/// empty preferred set never matches.
#[inline]
pub fn is_in_preferred_zip(
    property_zip: Option<&str>,
    property_address: Option<&str>,
    preferred: &HashSet<String>,
) -> bool {
    if preferred.is_empty() {
        return false;
    }

    property_effective_zip(property_zip, property_address)
        .map(|zip| preferred.contains(&zip))
        .unwrap_or(false)
}

/// The ZIP the scorer should judge a property by: the explicit field when
/// present and valid, otherwise the first ZIP found in the address.
pub fn property_effective_zip(
    property_zip: Option<&str>,
    property_address: Option<&str>,
) -> Option<String> {
    property_zip
        .filter(|z| !z.trim().is_empty())
        .and_then(normalize_zip)
        .or_else(|| property_address.and_then(extract_zip))
}
