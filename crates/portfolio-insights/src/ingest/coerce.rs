use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Outcome of coercing one raw cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Coerced<T> {
    Value(T),
    Blank,
    Invalid,
}

impl<T> Coerced<T> {
    pub(crate) fn into_option(self) -> Option<T> {
        match self {
            Coerced::Value(value) => Some(value),
            Coerced::Blank | Coerced::Invalid => None,
        }
    }
}

const CURRENCY_NOISE: [char; 2] = ['$', ','];

const DATE_FORMATS: &[&str] = &["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d", "%m-%d-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
];

/// Strips `$` and `,` before parsing; the decimal point and sign are kept.
pub(crate) fn coerce_currency(raw: &str) -> Coerced<f64> {
    let cleaned: String = raw.chars().filter(|c| !CURRENCY_NOISE.contains(c)).collect();
    coerce_number(&cleaned)
}

pub(crate) fn coerce_number(raw: &str) -> Coerced<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Coerced::Blank;
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Coerced::Value(value),
        _ => Coerced::Invalid,
    }
}

pub(crate) fn coerce_date(raw: &str) -> Coerced<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Coerced::Blank;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Coerced::Value(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Coerced::Value(datetime.date());
        }
    }

    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(datetime) => Coerced::Value(datetime.date_naive()),
        Err(_) => Coerced::Invalid,
    }
}

pub(crate) fn coerce_text(raw: &str) -> Coerced<String> {
    let cleaned = raw.replace(['\u{feff}', '\u{200b}'], "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        Coerced::Blank
    } else {
        Coerced::Value(trimmed.to_string())
    }
}
