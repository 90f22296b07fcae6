//! Syntactic email address check

use once_cell::sync::Lazy;
use regex::Regex;

const MAX_LOCAL_LEN: usize = 64;
const MAX_ADDRESS_LEN: usize = 254;

// Dot-atom local part, dotted domain of alphanumeric/hyphen labels.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

/// Returns true when `value` is a syntactically valid email address.
///
/// The value is checked as-is, surrounding whitespace makes it invalid.
pub fn is_valid_email(value: &str) -> bool {
    if value.len() > MAX_ADDRESS_LEN {
        return false;
    }

    match value.rsplit_once('@') {
        Some((local, _)) if local.len() <= MAX_LOCAL_LEN => EMAIL_REGEX.is_match(value),
        _ => false,
    }
}
