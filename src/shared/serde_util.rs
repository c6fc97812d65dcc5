//! Custom serde helpers for backend wire formats.

/// Deserializes ISO 8601 timestamps into `DateTime<Utc>`.
///
/// The backend is inconsistent: database-backed rows carry an offset
/// (`2026-08-07T12:00:00+00:00`) while market-data and push-feed payloads
/// send naive UTC strings (`2026-08-07T12:00:00.123456`). Both decode here.
pub mod flexible_utc {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("Invalid timestamp: {}", s)))
    }

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Variant for `Option<DateTime<Utc>>` fields (pair with `#[serde(default)]`).
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(s) => super::parse(&s)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("Invalid timestamp: {}", s))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::flexible_utc;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_with_offset() {
        let dt = flexible_utc::parse("2026-08-07T12:30:00+00:00").unwrap();
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_parse_naive_assumed_utc() {
        let dt = flexible_utc::parse("2026-08-07T12:30:00.123456").unwrap();
        assert_eq!(dt.day(), 7);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(flexible_utc::parse("yesterday").is_none());
    }
}
