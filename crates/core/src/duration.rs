//! Human-readable durations (`"10m"`, `"1h30m"`, `"500ms"`) for configuration files.
//!
//! Use with `#[serde(with = "petstore_core::duration")]`.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer, de};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,
    #[error("missing unit after `{0}`")]
    MissingUnit(String),
    #[error("unknown unit `{0}` (expected ms, s, m or h)")]
    UnknownUnit(String),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("duration `{0}` is too large")]
    Overflow(String),
    #[error("duration must be greater than zero")]
    Zero,
}

/// Parse a sequence of `<number><unit>` pairs, e.g. `"1h30m"`.
pub fn parse(input: &str) -> Result<Duration, DurationParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let mut total = Duration::ZERO;
    let mut rest = input;

    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (number, tail) = rest.split_at(digits);
        if number.is_empty() {
            return Err(DurationParseError::InvalidNumber(rest.to_string()));
        }
        let value: u64 = number
            .parse()
            .map_err(|_| DurationParseError::InvalidNumber(number.to_string()))?;

        let unit_len = tail.find(|c: char| c.is_ascii_digit()).unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        let overflow = || DurationParseError::Overflow(input.to_string());
        let step = match unit {
            "" => return Err(DurationParseError::MissingUnit(number.to_string())),
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.checked_mul(60).ok_or_else(overflow)?),
            "h" => Duration::from_secs(value.checked_mul(3600).ok_or_else(overflow)?),
            other => return Err(DurationParseError::UnknownUnit(other.to_string())),
        };

        total = total.checked_add(step).ok_or_else(overflow)?;
        rest = next;
    }

    Ok(total)
}

/// As [`parse`], rejecting a zero result. For periods that drive timers.
pub fn parse_positive(input: &str) -> Result<Duration, DurationParseError> {
    let duration = parse(input)?;
    if duration.is_zero() {
        return Err(DurationParseError::Zero);
    }
    Ok(duration)
}

/// Render a duration in the same notation `parse` accepts.
pub fn format(duration: &Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 != 0 {
        return format!("{millis}ms");
    }
    let secs = duration.as_secs();
    if secs != 0 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs != 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(duration))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(de::Error::custom)
}

/// `deserialize_with` target for periods that must be non-zero.
pub fn deserialize_positive<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_positive(&raw).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_single_units() {
        assert_eq!(parse("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse("10m"), Ok(Duration::from_secs(600)));
        assert_eq!(parse("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn parses_compound_values() {
        assert_eq!(parse("1h30m"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse("2m5s"), Ok(Duration::from_secs(125)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse(""), Err(DurationParseError::Empty));
        assert_eq!(parse("10"), Err(DurationParseError::MissingUnit("10".into())));
        assert_eq!(parse("3d"), Err(DurationParseError::UnknownUnit("d".into())));
        assert!(matches!(parse("m5"), Err(DurationParseError::InvalidNumber(_))));
    }

    #[test]
    fn huge_values_overflow_instead_of_panicking() {
        assert!(matches!(parse("18446744073709551615h"), Err(DurationParseError::Overflow(_))));
        assert!(matches!(parse("18446744073709551615m"), Err(DurationParseError::Overflow(_))));
        assert!(matches!(
            parse("18446744073709551615s1s"),
            Err(DurationParseError::Overflow(_))
        ));
    }

    #[test]
    fn zero_is_rejected_only_where_positive_is_required() {
        assert_eq!(parse("0s"), Ok(Duration::ZERO));
        assert_eq!(parse_positive("0s"), Err(DurationParseError::Zero));
        assert_eq!(parse_positive("0h0m"), Err(DurationParseError::Zero));
        assert_eq!(parse_positive("1ms"), Ok(Duration::from_millis(1)));
    }

    #[test]
    fn deserializes_from_config_strings() {
        #[derive(serde::Deserialize)]
        struct Cfg {
            #[serde(with = "crate::duration")]
            ttl: Duration,
        }

        let cfg: Cfg = serde_json::from_str(r#"{"ttl":"10m"}"#).unwrap();
        assert_eq!(cfg.ttl, Duration::from_secs(600));
    }

    proptest! {
        #[test]
        fn format_then_parse_is_identity(secs in 0u64..1_000_000, millis in 0u64..1000) {
            let d = Duration::from_secs(secs) + Duration::from_millis(millis);
            prop_assert_eq!(parse(&format(&d)), Ok(d));
        }
    }
}
