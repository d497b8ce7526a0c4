//! Lenient timestamp decoding for server documents.
//!
//! Accepts RFC 3339 strings with any offset, naive `YYYY-MM-DD HH:MM:SS`
//! strings (with a `T` or a space, optional fraction, read as UTC), bare
//! dates, and epoch milliseconds as a JSON integer or float (truncated).
//! Serializes as RFC 3339.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn parse(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Epoch milliseconds sent as a JSON float; the fraction is truncated.
pub fn from_fractional_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    from_millis(millis.trunc() as i64)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
}

impl RawTimestamp {
    fn resolve<E: de::Error>(self) -> Result<DateTime<Utc>, E> {
        match self {
            RawTimestamp::Millis(ms) => from_millis(ms)
                .ok_or_else(|| E::custom(format!("timestamp {ms}ms is out of range"))),
            RawTimestamp::FractionalMillis(ms) => from_fractional_millis(ms)
                .ok_or_else(|| E::custom(format!("timestamp {ms}ms is out of range"))),
            RawTimestamp::Text(s) => {
                parse(&s).ok_or_else(|| E::custom(format!("unrecognised timestamp `{s}`")))
            }
        }
    }
}

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    RawTimestamp::deserialize(deserializer)?.resolve()
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => super::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<RawTimestamp>::deserialize(deserializer)?
            .map(RawTimestamp::resolve)
            .transpose()
    }
}
