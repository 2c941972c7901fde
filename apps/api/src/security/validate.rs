//! Validation for interview-booking inputs (name, email, duration).

use std::sync::OnceLock;

use regex::Regex;

use super::{MAX_DURATION_HOURS, MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MIN_DURATION_HOURS};

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("invalid email pattern")
    })
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Letters (including international via \w), spaces, hyphens,
    // apostrophes, and dots.
    RE.get_or_init(|| Regex::new(r"^[\w\s\-'.]+$").expect("invalid name pattern"))
}

pub fn validate_email(email: &str) -> bool {
    if email.is_empty() || email.chars().count() > MAX_EMAIL_LENGTH {
        return false;
    }
    email_regex().is_match(email)
}

pub fn validate_name(name: &str) -> bool {
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return false;
    }
    name_regex().is_match(name)
}

/// Parses an interview duration, accepting `.` or `,` as the decimal
/// separator, and enforcing the 0.25..=8 hour bounds. Returns `None` for
/// anything unparseable or out of range.
pub fn parse_duration(duration: &str) -> Option<f64> {
    let trimmed = duration.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|d| duration_in_bounds(*d))
}

pub fn duration_in_bounds(hours: f64) -> bool {
    (MIN_DURATION_HOURS..=MAX_DURATION_HOURS).contains(&hours)
}
