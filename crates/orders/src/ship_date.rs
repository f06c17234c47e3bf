//! Wire format for `shipDate`: RFC3339 with optional fractional seconds,
//! e.g. `2019-08-26T11:55:56.457Z`. Offsets are accepted with or without a
//! colon (`+03:00`, `+0300`).

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer, de};

pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn format(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Ship dates are stored as whole unix seconds.
pub fn from_unix(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

pub fn serialize<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(at))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid shipDate `{raw}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_zulu_with_millis() {
        let at = parse("2019-08-26T11:55:56.457Z").unwrap();
        assert_eq!(at.timestamp(), 1_566_820_556);
        assert_eq!(at.timestamp_subsec_millis(), 457);
    }

    #[test]
    fn accepts_offsets_without_colon() {
        let at = parse("2019-08-26T14:55:56+0300").unwrap();
        assert_eq!(at.timestamp(), 1_566_820_556);
    }

    #[test]
    fn rejects_dates_without_time() {
        assert!(parse("2019-08-26").is_none());
    }

    #[test]
    fn whole_seconds_format_without_fraction() {
        assert_eq!(format(&from_unix(1_566_820_556)), "2019-08-26T11:55:56Z");
    }
}
