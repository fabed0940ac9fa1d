//! Best-effort extraction of amounts and relative time windows from free text.
//!
//! Nothing in this module fails: a phrase that does not match yields `None`
//! and the caller picks its own default.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

/// Months are a flat 30 days everywhere a month count becomes a day count.
pub const DAYS_PER_MONTH: u32 = 30;

/// Upper bound on a parsed window so date arithmetic can never overflow.
pub const MAX_MONTHS: u32 = 12_000;

static AMOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([kmb])?\b").expect("amount pattern is valid")
});
static MONTHS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:last|past)\s*(\d+)\s*months?\b").expect("months pattern is valid")
});
static YEARS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:last|past)\s*(\d+)\s*years?\b").expect("years pattern is valid")
});
static SIX_MONTHS_IDIOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:last|past)\s*6\s*months\b").expect("six months idiom is valid")
});
static ONE_YEAR_IDIOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:last|past)\s*1\s*year\b").expect("one year idiom is valid")
});

/// A relative window ending at parse time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeframe {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Timeframe {
    pub fn last_months(months: u32, end: DateTime<Utc>) -> Self {
        let days = i64::from(months_to_days(months.min(MAX_MONTHS)));
        Self { start: end - Duration::days(days), end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }

    /// Whole 30-day months covered by the window, never less than one.
    pub fn months(&self) -> u32 {
        let months = self.days() / i64::from(DAYS_PER_MONTH);
        u32::try_from(months).unwrap_or(MAX_MONTHS).clamp(1, MAX_MONTHS)
    }
}

pub fn months_to_days(months: u32) -> u32 {
    months.saturating_mul(DAYS_PER_MONTH)
}

/// Parses the first money-looking number in `text`.
///
/// Thousands separators and currency symbols are ignored, and a `k`, `m`, or
/// `b` suffix scales the number by 1e3, 1e6, or 1e9.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|ch| !matches!(ch, ',' | '$')).collect();
    let captures = AMOUNT_PATTERN.captures(&cleaned)?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;

    let factor = match captures.get(2).map(|suffix| suffix.as_str().to_ascii_lowercase()) {
        Some(suffix) if suffix == "k" => 1_000.0,
        Some(suffix) if suffix == "m" => 1_000_000.0,
        Some(suffix) if suffix == "b" => 1_000_000_000.0,
        _ => 1.0,
    };

    let amount = value * factor;
    amount.is_finite().then_some(amount)
}

pub fn parse_timeframe(text: &str) -> Option<Timeframe> {
    parse_timeframe_at(text, Utc::now())
}

/// Checks explicit month counts, then explicit year counts, then the
/// "last 6 months" and "last 1 year" idioms. The first hit wins. Words such
/// as "last year" or "six months" are not counts and yield `None`.
pub fn parse_timeframe_at(text: &str, now: DateTime<Utc>) -> Option<Timeframe> {
    if let Some(months) = capture_count(&MONTHS_PATTERN, text) {
        return Some(Timeframe::last_months(months, now));
    }

    if let Some(years) = capture_count(&YEARS_PATTERN, text) {
        return Some(Timeframe::last_months(years.saturating_mul(12), now));
    }

    if SIX_MONTHS_IDIOM.is_match(text) {
        return Some(Timeframe::last_months(6, now));
    }

    if ONE_YEAR_IDIOM.is_match(text) {
        return Some(Timeframe::last_months(12, now));
    }

    None
}

fn capture_count(pattern: &Regex, text: &str) -> Option<u32> {
    let raw = pattern.captures(text)?.get(1)?.as_str();
    Some(raw.parse::<u32>().unwrap_or(MAX_MONTHS).min(MAX_MONTHS))
}
