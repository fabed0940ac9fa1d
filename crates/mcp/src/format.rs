//! Plain-text rendering shared by the tool handlers.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// Title underlined with dashes, never shorter than six.
pub fn header(title: &str) -> String {
    let width = title.chars().count().max(6);
    format!("{title}\n{}", "-".repeat(width))
}

/// `$1,234.50`; a missing amount renders as `$0.00`.
pub fn fmt_currency(amount: Option<f64>) -> String {
    let Some(amount) = amount.filter(|amount| amount.is_finite()) else {
        return "$0.00".to_string();
    };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("${sign}{}.{cents}", group_digits(whole))
}

/// `YYYY-MM-DD` from a date or Salesforce datetime. Unparseable input is
/// returned as given.
pub fn fmt_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.to_string();
    }
    let parsed = DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"));
    match parsed {
        Ok(datetime) => datetime.with_timezone(&Utc).date_naive().to_string(),
        Err(_) => raw.to_string(),
    }
}

/// First present numeric field among `keys`; numeric strings count.
pub fn number_field(record: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

/// First non-empty string field among `keys`.
pub fn text_field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(Value::as_str).filter(|text| !text.is_empty()))
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{fmt_currency, fmt_date, header, number_field, text_field};

    #[test]
    fn header_underline_has_minimum_width() {
        assert_eq!(header("SOQL"), "SOQL\n------");
        assert_eq!(header("Donor Results"), "Donor Results\n-------------");
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(fmt_currency(Some(1234.5)), "$1,234.50");
        assert_eq!(fmt_currency(Some(1_000_000.0)), "$1,000,000.00");
        assert_eq!(fmt_currency(Some(12.0)), "$12.00");
        assert_eq!(fmt_currency(None), "$0.00");
    }

    #[test]
    fn dates_accept_salesforce_datetimes() {
        assert_eq!(fmt_date("2024-03-09"), "2024-03-09");
        assert_eq!(fmt_date("2024-03-09T15:30:00.000+0000"), "2024-03-09");
        assert_eq!(fmt_date("2024-03-09T23:30:00Z"), "2024-03-09");
        assert_eq!(fmt_date("not a date"), "not a date");
    }

    #[test]
    fn field_lookup_follows_key_order() {
        let record = json!({"total": "2500.5", "LifetimeGiving": null, "Email": ""});

        assert_eq!(number_field(&record, &["LifetimeGiving", "total"]), Some(2500.5));
        assert_eq!(text_field(&record, &["Email"]), None);
    }
}
