//! Loosely-typed value parsing for provider fields.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

/// Unix values above this are taken as milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Outcome of reading a numeric field.
#[derive(Debug, PartialEq)]
pub enum NumberValue {
    Present(Decimal),
    /// Field holds a placeholder such as `""` or `"-"`.
    Blank,
    /// Field holds something that is not a number.
    Invalid(String),
}

/// Read a decimal from a JSON number or numeric string.
///
/// Strings may carry thousands separators or a trailing `%`.
pub fn parse_decimal(value: &Value) -> NumberValue {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            match decimal_from_text(&text).or_else(|| n.as_f64().and_then(Decimal::from_f64)) {
                Some(d) => NumberValue::Present(d),
                None => NumberValue::Invalid(text),
            }
        }
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_end_matches('%')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            if cleaned.is_empty() || cleaned == "-" || cleaned == "--" {
                return NumberValue::Blank;
            }
            match decimal_from_text(&cleaned) {
                Some(d) => NumberValue::Present(d),
                None => NumberValue::Invalid(s.clone()),
            }
        }
        Value::Null => NumberValue::Blank,
        other => NumberValue::Invalid(other.to_string()),
    }
}

fn decimal_from_text(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .map(|d| d.normalize())
}

/// Read a timestamp in any of the shapes providers emit.
///
/// Handles unix seconds or milliseconds (number or digit string), RFC 3339,
/// compact `YYYYMMDDhhmmss`, `YYYY-MM-DD hh:mm:ss` and plain dates. Naive
/// values are interpreted at `offset` (UTC when unset).
pub fn parse_timestamp(value: &Value, offset: Option<FixedOffset>) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_unix),
        Value::String(s) => parse_timestamp_str(s.trim(), offset),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str, offset: Option<FixedOffset>) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    if s.chars().all(|c| c.is_ascii_digit()) {
        return match s.len() {
            14 => NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S")
                .ok()
                .and_then(|naive| localize(naive, offset)),
            8 => NaiveDate::parse_from_str(s, "%Y%m%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .and_then(|naive| localize(naive, offset)),
            _ => s.parse::<i64>().ok().and_then(from_unix),
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return localize(naive, offset);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| localize(naive, offset))
}

fn from_unix(value: i64) -> Option<DateTime<Utc>> {
    if value <= 0 {
        return None;
    }
    if value > MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    }
}

fn localize(naive: NaiveDateTime, offset: Option<FixedOffset>) -> Option<DateTime<Utc>> {
    match offset {
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc)),
        None => Some(Utc.from_utc_datetime(&naive)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_decimal_shapes() {
        assert_eq!(parse_decimal(&json!(150.25)), NumberValue::Present(dec!(150.25)));
        assert_eq!(parse_decimal(&json!("1,234.5")), NumberValue::Present(dec!(1234.5)));
        assert_eq!(parse_decimal(&json!("-0.4512%")), NumberValue::Present(dec!(-0.4512)));
        assert_eq!(parse_decimal(&json!(42)), NumberValue::Present(dec!(42)));
        assert_eq!(parse_decimal(&json!("1.5e3")), NumberValue::Present(dec!(1500)));
    }

    #[test]
    fn test_parse_decimal_blank_and_invalid() {
        assert_eq!(parse_decimal(&json!("")), NumberValue::Blank);
        assert_eq!(parse_decimal(&json!("-")), NumberValue::Blank);
        assert_eq!(parse_decimal(&Value::Null), NumberValue::Blank);
        assert!(matches!(parse_decimal(&json!("abc")), NumberValue::Invalid(_)));
        assert!(matches!(parse_decimal(&json!(true)), NumberValue::Invalid(_)));
    }

    #[test]
    fn test_parse_unix_timestamps() {
        let secs = parse_timestamp(&json!(1_704_412_800), None).unwrap();
        let millis = parse_timestamp(&json!(1_704_412_800_000i64), None).unwrap();
        let text = parse_timestamp(&json!("1704412800000"), None).unwrap();
        assert_eq!(secs, millis);
        assert_eq!(secs, text);
        assert_eq!(secs.to_rfc3339(), "2024-01-05T00:00:00+00:00");
    }

    #[test]
    fn test_parse_local_timestamps() {
        let china = FixedOffset::east_opt(8 * 3600);
        let compact = parse_timestamp(&json!("20240105150003"), china).unwrap();
        assert_eq!(compact.to_rfc3339(), "2024-01-05T07:00:03+00:00");

        let spaced = parse_timestamp(&json!("2024-01-05 15:00:03"), china).unwrap();
        assert_eq!(spaced, compact);

        let date = parse_timestamp(&json!("20240105"), china).unwrap();
        assert_eq!(date.to_rfc3339(), "2024-01-04T16:00:00+00:00");
    }

    #[test]
    fn test_parse_rfc3339_and_plain_date() {
        let rfc = parse_timestamp(&json!("2024-01-05T14:30:00.123Z"), None).unwrap();
        assert_eq!(rfc.timestamp(), 1_704_465_000);

        let date = parse_timestamp(&json!("2024-01-05"), None).unwrap();
        assert_eq!(date.to_rfc3339(), "2024-01-05T00:00:00+00:00");
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp(&json!("yesterday"), None).is_none());
        assert!(parse_timestamp(&json!(0), None).is_none());
        assert!(parse_timestamp(&json!(null), None).is_none());
    }
}
