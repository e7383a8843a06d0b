//! Field format checks used by listing and account validation.

use std::sync::OnceLock;

use regex::Regex;

/// Gabonese phone number: `+241-XX-XX-XX-XX`, `0X-XX-XX-XX`, with dashes or
/// spaces between pairs, or none.
pub fn is_valid_phone(phone: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(\+241[-\s]?)?[0-9]{2}[-\s]?[0-9]{2}[-\s]?[0-9]{2}[-\s]?[0-9]{2}$")
            .expect("static phone regex")
    });
    re.is_match(&phone.trim().replace(' ', "-"))
}

pub fn is_valid_email(email: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static email regex")
    });
    re.is_match(email.trim())
}

/// Canonical form used for account lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `true` when the value is missing or only whitespace.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
