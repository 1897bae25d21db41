//! Individual field checks used by the engine.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Message reported when a password has no upper-case letter.
pub const PASSWORD_UPPERCASE_MESSAGE: &str = "Password must contain one of A-Z characters";

/// E.164: leading `+`, a non-zero country digit, at most 15 digits total.
static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{1,14}$").expect("phone number regex is valid"));

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

pub fn is_phone_number(text: &str) -> bool {
    PHONE_NUMBER.is_match(text)
}

pub fn is_email(text: &str) -> bool {
    EMAIL.is_match(text)
}

/// Whether `text` is a real calendar date in `format`.
pub fn is_date(text: &str, format: &str) -> bool {
    NaiveDate::parse_from_str(text, format).is_ok()
}

pub fn has_uppercase(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_uppercase())
}

/// Inclusive bounds on the number of characters (not bytes).
pub fn length_within(text: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&text.chars().count())
}
