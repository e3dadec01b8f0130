//! Input validation for user-entered data.
//!
//! Every check returns its verdict as data (`bool` or `Result<(), String>`)
//! so callers can show the message inline next to the offending field.

use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Upper-cased plate: letters and digits only, 1-8 chars
    static ref LICENSE_PLATE_REGEX: Regex = Regex::new(r"^[A-Z0-9]{1,8}$").unwrap();

    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ).unwrap();

    /// Optional country code followed by 10-15 digits
    static ref PHONE_REGEX: Regex = Regex::new(r"^(\+\d{1,3})?\d{10,15}$").unwrap();

    static ref PHONE_SEPARATORS_REGEX: Regex = Regex::new(r"[\s\-\(\)]").unwrap();

    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_]{3,32}$").unwrap();
}

pub const MAX_BOOKING_DAYS: i64 = 7;
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

pub fn is_valid_license_plate(plate: &str) -> bool {
    LICENSE_PLATE_REGEX.is_match(&normalize_plate(plate))
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    let cleaned = PHONE_SEPARATORS_REGEX.replace_all(phone, "");
    PHONE_REGEX.is_match(&cleaned)
}

/// Validate booking times against the current instant and the default
/// seven-day limit.
pub fn validate_booking_time(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), String> {
    validate_booking_time_at(start, end, Utc::now(), Duration::days(MAX_BOOKING_DAYS))
}

pub fn validate_booking_time_at(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    max_duration: Duration,
) -> Result<(), String> {
    if start < now {
        return Err("Start time must be in the future".to_string());
    }

    if end <= start {
        return Err("End time must be after start time".to_string());
    }

    if end - start > max_duration {
        return Err(format!(
            "Booking duration cannot exceed {}",
            describe_limit(max_duration)
        ));
    }

    Ok(())
}

fn describe_limit(limit: Duration) -> String {
    if limit.num_hours() % 24 == 0 {
        let days = limit.num_days();
        format!("{} day{}", days, if days == 1 { "" } else { "s" })
    } else {
        let hours = limit.num_hours();
        format!("{} hour{}", hours, if hours == 1 { "" } else { "s" })
    }
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(
            "Username must be 3-32 characters of letters, digits or underscores".to_string(),
        );
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}
