//! Input coercion shared by the record builders.
//!
//! Clients send amounts as numbers or strings and dates in several
//! formats. Everything is normalized here before it reaches the store.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parses the longest numeric prefix of `input`, ignoring leading
/// whitespace. `"12.5abc"` is 12.5, `"abc"` is `None`.
pub fn parse_float_prefix(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Coerces a JSON value to a finite amount. Anything unparsable is 0.
pub fn coerce_amount(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Serde helper: optional amount accepting numbers or numeric strings.
/// `null` and an absent field are both `None`.
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_null()).map(|v| coerce_amount(&v)))
}

/// Serde helper for amounts that must be sent but may be blank. Any
/// present value, `null` included, coerces with [`coerce_amount`]. Only an
/// absent field (with `#[serde(default)]`) stays `None`.
pub fn present_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Some(coerce_amount(&value)))
}

/// Serde helper: optional date normalized with [`normalize_date`].
pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .filter(|s| !s.trim().is_empty())
        .map(|s| normalize_date(Some(&s))))
}

/// Normalizes a client date, falling back to the current time.
pub fn normalize_date(raw: Option<&str>) -> DateTime<Utc> {
    normalize_date_at(raw, Utc::now())
}

/// Normalizes a client date relative to `now`.
///
/// Accepted forms, in order: RFC 3339 / ISO timestamps, `YYYY-MM-DD`
/// (midnight UTC), and slash dates. For `a/b/yyyy` the day and month are
/// told apart by which side exceeds 12; when both could be either, the
/// input is read as day/month. Anything else yields `now`.
pub fn normalize_date_at(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let raw = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return now,
    };

    if raw.contains('T') || is_iso_date(raw) {
        if let Some(date) = parse_iso(raw) {
            return date;
        }
    }

    if raw.contains('/') {
        if let Some(date) = parse_slash_date(raw) {
            return date;
        }
    }

    DateTime::parse_from_rfc2822(raw)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(now)
}

fn is_iso_date(raw: &str) -> bool {
    let b = raw.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_slash_date(raw: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<i32> = raw
        .split('/')
        .map(|p| p.trim().parse::<i32>())
        .collect::<Result<_, _>>()
        .ok()?;

    let [first, second, year] = parts.as_slice() else {
        return None;
    };

    let (day, month) = if *first > 12 && *second <= 12 {
        (*first, *second)
    } else if *second > 12 && *first <= 12 {
        (*second, *first)
    } else {
        (*first, *second)
    };

    NaiveDate::from_ymd_opt(*year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("42"), Some(42.0));
        assert_eq!(parse_float_prefix("  -3.5"), Some(-3.5));
        assert_eq!(parse_float_prefix("12.5abc"), Some(12.5));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("5."), Some(5.0));
        assert_eq!(parse_float_prefix("1e3"), Some(1000.0));
        assert_eq!(parse_float_prefix("2e"), Some(2.0));
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix("."), None);
    }

    #[test]
    fn test_coerce_amount() {
        assert_eq!(coerce_amount(&json!(100)), 100.0);
        assert_eq!(coerce_amount(&json!(99.9)), 99.9);
        assert_eq!(coerce_amount(&json!("30")), 30.0);
        assert_eq!(coerce_amount(&json!("30,50")), 30.0);
        assert_eq!(coerce_amount(&json!("R$ 10")), 0.0);
        assert_eq!(coerce_amount(&json!(true)), 0.0);
        assert_eq!(coerce_amount(&json!(null)), 0.0);
    }

    #[test]
    fn test_lenient_amount_helper() {
        #[derive(Deserialize)]
        struct Input {
            #[serde(default, deserialize_with = "lenient_amount")]
            amount: Option<f64>,
        }

        let parsed: Input = serde_json::from_value(json!({ "amount": "15.25" })).unwrap();
        assert_eq!(parsed.amount, Some(15.25));

        let parsed: Input = serde_json::from_value(json!({ "amount": null })).unwrap();
        assert_eq!(parsed.amount, None);

        let parsed: Input = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parsed.amount, None);
    }

    #[test]
    fn test_present_amount_helper() {
        #[derive(Deserialize)]
        struct Input {
            #[serde(default, deserialize_with = "present_amount")]
            amount: Option<f64>,
        }

        let parsed: Input = serde_json::from_value(json!({ "amount": "15.25" })).unwrap();
        assert_eq!(parsed.amount, Some(15.25));

        let parsed: Input = serde_json::from_value(json!({ "amount": null })).unwrap();
        assert_eq!(parsed.amount, Some(0.0));

        let parsed: Input = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parsed.amount, None);
    }

    #[test]
    fn test_normalize_missing_or_blank_is_now() {
        assert_eq!(normalize_date_at(None, fixed_now()), fixed_now());
        assert_eq!(normalize_date_at(Some("  "), fixed_now()), fixed_now());
    }

    #[test]
    fn test_normalize_rfc3339() {
        let date = normalize_date_at(Some("2024-03-05T10:30:00-03:00"), fixed_now());
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 3, 5, 13, 30, 0).unwrap());

        let date = normalize_date_at(Some("2024-03-05T10:30:00.000Z"), fixed_now());
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_normalize_naive_datetime_as_utc() {
        let date = normalize_date_at(Some("2024-03-05T10:30"), fixed_now());
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_normalize_iso_date() {
        assert_eq!(normalize_date_at(Some("2024-03-05"), fixed_now()), ymd(2024, 3, 5));
    }

    #[test]
    fn test_normalize_slash_day_first_when_unambiguous() {
        assert_eq!(normalize_date_at(Some("25/03/2024"), fixed_now()), ymd(2024, 3, 25));
    }

    #[test]
    fn test_normalize_slash_month_first_when_unambiguous() {
        assert_eq!(normalize_date_at(Some("03/25/2024"), fixed_now()), ymd(2024, 3, 25));
    }

    #[test]
    fn test_normalize_slash_ambiguous_is_day_month() {
        assert_eq!(normalize_date_at(Some("05/03/2024"), fixed_now()), ymd(2024, 3, 5));
    }

    #[test]
    fn test_normalize_invalid_slash_date_falls_back() {
        assert_eq!(normalize_date_at(Some("31/02/2024"), fixed_now()), fixed_now());
        assert_eq!(normalize_date_at(Some("aa/bb/cc"), fixed_now()), fixed_now());
    }

    #[test]
    fn test_normalize_rfc2822_fallback() {
        let date = normalize_date_at(Some("Tue, 5 Mar 2024 10:30:00 +0000"), fixed_now());
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_normalize_garbage_is_now() {
        assert_eq!(normalize_date_at(Some("yesterday"), fixed_now()), fixed_now());
    }
}
