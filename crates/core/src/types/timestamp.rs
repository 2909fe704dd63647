//! Millisecond-precision write timestamps.
//!
//! Timestamps are persisted as integer milliseconds since the Unix epoch so
//! that the document store orders them numerically and a value read back is
//! exactly the value written.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A UTC instant truncated to millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current time, truncated to whole milliseconds.
    #[must_use]
    pub fn now() -> Self {
        Self::from_millis(Utc::now().timestamp_millis())
    }

    /// Build a timestamp from milliseconds since the Unix epoch.
    ///
    /// Out-of-range values clamp to the epoch.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        Self(
            Utc.timestamp_millis_opt(millis)
                .single()
                .unwrap_or(DateTime::UNIX_EPOCH),
        )
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// The underlying `chrono` value.
    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_millis())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::from_millis)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from_millis(value.timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_has_no_sub_millisecond_part() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_json_roundtrip_is_exact() {
        let ts = Timestamp::from_millis(1_760_000_000_123);
        let json = serde_json::to_value(ts).unwrap_or_default();
        assert_eq!(json, serde_json::json!(1_760_000_000_123_i64));
        let back: Timestamp = serde_json::from_value(json).unwrap_or(Timestamp::from_millis(0));
        assert_eq!(back, ts);
    }

    #[test]
    fn test_ordering_follows_time() {
        assert!(Timestamp::from_millis(10) < Timestamp::from_millis(11));
    }
}
