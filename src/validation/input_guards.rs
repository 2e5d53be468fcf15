//! Field-level guards for submitted receipts.
//!
//! Character classes are spelled out as ASCII ranges so matching does not
//! depend on the regex engine's Unicode defaults for `\w`, `\s` or `\d`.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reason a receipt was rejected.
///
/// Only ever logged. Clients receive one uniform message regardless of variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("retailer '{value}' contains characters outside [A-Za-z0-9_ &-] or is empty")]
    InvalidRetailer { value: String },

    #[error("{parameter} '{value}' is not a decimal amount with two fraction digits")]
    InvalidAmount { parameter: String, value: String },

    #[error("purchase date '{value}' is not a calendar date in YYYY-MM-DD form")]
    InvalidPurchaseDate { value: String },

    #[error("purchase time '{value}' is not a 24-hour HH:MM time")]
    InvalidPurchaseTime { value: String },

    #[error("receipt has no items")]
    NoItems,

    #[error("item {index} short description '{value}' contains characters outside [A-Za-z0-9_ -] or is empty")]
    InvalidShortDescription { index: usize, value: String },
}

static RETAILER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\t\n\x0C\r &-]+$").expect("retailer pattern compiles"));

static SHORT_DESCRIPTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_\t\n\x0C\r -]+$").expect("short description pattern compiles")
});

static AMOUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]{2}$").expect("amount pattern compiles"));

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("date pattern compiles")
});

static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})$").expect("time pattern compiles"));

/// Validates a retailer name: letters, digits, underscore, ASCII whitespace,
/// hyphen and ampersand, at least one character.
///
/// # Examples
///
/// ```
/// use receipt_processor::validation::validate_retailer;
///
/// assert!(validate_retailer("M&M Corner Market").is_ok());
/// assert!(validate_retailer("Walgreens!").is_err());
/// ```
pub fn validate_retailer(value: &str) -> ValidationResult<&str> {
    if RETAILER_PATTERN.is_match(value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidRetailer {
            value: value.to_string(),
        })
    }
}

/// Validates a money amount such as `"12.34"`: digits, a point, exactly two
/// digits. No sign and no thousands separators.
///
/// # Examples
///
/// ```
/// use receipt_processor::validation::validate_amount;
///
/// assert!(validate_amount("total", "35.35").is_ok());
/// assert!(validate_amount("total", "35.3").is_err());
/// assert!(validate_amount("total", "-1.00").is_err());
/// ```
pub fn validate_amount<'a>(parameter_name: &str, value: &'a str) -> ValidationResult<&'a str> {
    if AMOUNT_PATTERN.is_match(value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidAmount {
            parameter: parameter_name.to_string(),
            value: value.to_string(),
        })
    }
}

/// Validates an item description: letters, digits, underscore, ASCII
/// whitespace and hyphen, at least one character.
pub fn validate_short_description(index: usize, value: &str) -> ValidationResult<&str> {
    if SHORT_DESCRIPTION_PATTERN.is_match(value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidShortDescription {
            index,
            value: value.to_string(),
        })
    }
}

/// Parses a fixed-width `YYYY-MM-DD` date, rejecting impossible calendar
/// dates such as `2022-02-30` or `2022-13-01`.
pub fn parse_purchase_date(value: &str) -> ValidationResult<NaiveDate> {
    let invalid = || ValidationError::InvalidPurchaseDate {
        value: value.to_string(),
    };

    let caps = DATE_PATTERN.captures(value).ok_or_else(invalid)?;
    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    let day: u32 = caps[3].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Parses a 24-hour `HH:MM` time. The hour may be written with one digit
/// (`9:30`), the minute always takes two.
pub fn parse_purchase_time(value: &str) -> ValidationResult<NaiveTime> {
    let invalid = || ValidationError::InvalidPurchaseTime {
        value: value.to_string(),
    };

    let caps = TIME_PATTERN.captures(value).ok_or_else(invalid)?;
    let hour: u32 = caps[1].parse().map_err(|_| invalid())?;
    let minute: u32 = caps[2].parse().map_err(|_| invalid())?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}
