//! Field validation shared by the content and lead services.

use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("slug pattern compiles"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Optional `+`, then digits with spaces, dashes, dots or parentheses.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9(][0-9\s().-]*$").expect("phone pattern compiles"));

const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    if !PHONE_RE.is_match(phone) {
        return false;
    }
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits)
}

/// Trimmed value of an optional field, `None` when blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugs() {
        assert!(is_valid_slug("luxury-villa-2024"));
        assert!(!is_valid_slug("Luxury-Villa"));
        assert!(!is_valid_slug("villa interiors"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_emails() {
        assert!(is_valid_email("client@example.ae"));
        assert!(is_valid_email(" client@example.ae "));
        assert!(!is_valid_email("client@example"));
        assert!(!is_valid_email("client example@x.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_phones() {
        assert!(is_valid_phone("+971 4 323 4567"));
        assert!(is_valid_phone("(050) 123-4567"));
        assert!(is_valid_phone("0501234567"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("call me maybe"));
        assert!(!is_valid_phone("+971 50 123 4567 8901 23"));
        assert!(!is_valid_phone("++971501234567"));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Dubai ")), Some("Dubai"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
