//! ISO-8601 duration adapter (`PT8H30M`, `PT0S`, `P1DT2H`).
//!
//! Upstream services encode work and overtime hours as duration strings.
//! They are converted to `TimeDelta` while deserializing so that aggregation
//! code only ever sees numeric durations.

use chrono::TimeDelta;

use crate::error::{AppError, Result};

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_WEEK: f64 = 604_800.0;

/// Parse an ISO-8601 duration string into a `TimeDelta`.
///
/// Supports week, day, hour, minute and second designators. Fractional values
/// are accepted on any component and rounded to the millisecond.
pub fn parse_iso8601(input: &str) -> Result<TimeDelta> {
    let text = input.trim();
    let body = text
        .strip_prefix('P')
        .ok_or_else(|| AppError::parse(format!("Duration '{text}' must start with 'P'")))?;

    let mut total_secs = 0.0_f64;
    let mut number = String::new();
    let mut in_time = false;
    let mut components = 0;

    for ch in body.chars() {
        match ch {
            '0'..='9' | '.' | ',' => number.push(if ch == ',' { '.' } else { ch }),
            'T' if !in_time && number.is_empty() => in_time = true,
            unit => {
                let value: f64 = number
                    .parse()
                    .map_err(|_| AppError::parse(format!("Invalid number before '{unit}' in '{text}'")))?;
                let scale = match (in_time, unit) {
                    (false, 'W') => SECONDS_PER_WEEK,
                    (false, 'D') => SECONDS_PER_DAY,
                    (true, 'H') => SECONDS_PER_HOUR,
                    (true, 'M') => SECONDS_PER_MINUTE,
                    (true, 'S') => 1.0,
                    _ => return Err(AppError::parse(format!("Unsupported designator '{unit}' in '{text}'"))),
                };
                total_secs += value * scale;
                components += 1;
                number.clear();
            }
        }
    }

    if !number.is_empty() || components == 0 {
        return Err(AppError::parse(format!("Incomplete duration '{text}'")));
    }

    let millis = (total_secs * 1_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(AppError::parse(format!("Duration '{text}' is out of range")));
    }

    TimeDelta::try_milliseconds(millis as i64)
        .ok_or_else(|| AppError::parse(format!("Duration '{text}' is out of range")))
}

/// Format a `TimeDelta` as an ISO-8601 time duration (`PT7H5M`, `PT0S`).
pub fn format_iso8601(duration: TimeDelta) -> String {
    let millis = duration.num_milliseconds();
    if millis == 0 {
        return "PT0S".to_string();
    }

    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.unsigned_abs();
    let hours = millis / 3_600_000;
    let minutes = (millis % 3_600_000) / 60_000;
    let secs_millis = millis % 60_000;

    let mut out = format!("{sign}PT");
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}M"));
    }
    if secs_millis > 0 {
        if secs_millis % 1_000 == 0 {
            out.push_str(&format!("{}S", secs_millis / 1_000));
        } else {
            out.push_str(&format!("{:.3}S", secs_millis as f64 / 1_000.0));
        }
    }
    out
}

/// Duration expressed in fractional hours.
pub fn as_hours(duration: TimeDelta) -> f64 {
    duration.num_milliseconds() as f64 / (SECONDS_PER_HOUR * 1_000.0)
}

/// Serde helpers for `TimeDelta` fields carried as ISO-8601 strings.
///
/// Missing or null values deserialize to zero.
pub mod iso8601 {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_iso8601(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<TimeDelta, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) if !text.trim().is_empty() => super::parse_iso8601(&text).map_err(serde::de::Error::custom),
            _ => Ok(TimeDelta::zero()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_zero() {
        assert_eq!(parse_iso8601("PT0S").unwrap(), TimeDelta::zero());
    }

    #[test]
    fn test_parse_hours_minutes() {
        let d = parse_iso8601("PT8H30M").unwrap();
        assert_eq!(d, TimeDelta::minutes(8 * 60 + 30));
        assert!((as_hours(d) - 8.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_days_and_time() {
        let d = parse_iso8601("P1DT2H").unwrap();
        assert_eq!(d, TimeDelta::hours(26));
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let d = parse_iso8601("PT1.5S").unwrap();
        assert_eq!(d, TimeDelta::milliseconds(1_500));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_iso8601("8 hours").is_err());
        assert!(parse_iso8601("P").is_err());
        assert!(parse_iso8601("PT5").is_err());
        assert!(parse_iso8601("PT2D").is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(parse_iso8601("PT9999999999999999H").is_err());
        assert!(parse_iso8601("P99999999999999999999W").is_err());
        assert!(parse_iso8601("PT2000000000000H").is_ok());
    }

    #[test]
    fn test_format() {
        assert_eq!(format_iso8601(TimeDelta::zero()), "PT0S");
        assert_eq!(format_iso8601(TimeDelta::minutes(425)), "PT7H5M");
        assert_eq!(format_iso8601(TimeDelta::milliseconds(90_250)), "PT1M30.250S");
    }
}
