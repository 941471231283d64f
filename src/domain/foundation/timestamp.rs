//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Converts provider epoch seconds into a UTC timestamp.
    ///
    /// Returns `None` for values chrono cannot represent.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Moves back `days`, or `None` when the result is out of range.
    pub fn checked_sub_days(&self, days: i64) -> Option<Self> {
        Duration::try_days(days)
            .and_then(|d| self.0.checked_sub_signed(d))
            .map(Self)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn from_unix_secs_converts_to_utc() {
        let ts = Timestamp::from_unix_secs(1_700_000_000).unwrap();
        assert_eq!(ts.as_datetime().to_rfc3339(), "2023-11-14T22:13:20+00:00");
        assert_eq!(ts.as_unix_secs(), 1_700_000_000);
    }

    #[test]
    fn from_unix_secs_rejects_out_of_range() {
        assert!(Timestamp::from_unix_secs(i64::MAX).is_none());
    }

    #[test]
    fn add_days_moves_forward_and_back() {
        let ts = Timestamp::from_unix_secs(0).unwrap();
        assert_eq!(ts.add_days(1).as_unix_secs(), 86_400);
        assert_eq!(ts.add_days(-1).as_unix_secs(), -86_400);
    }

    #[test]
    fn checked_sub_days_rejects_out_of_range() {
        let ts = Timestamp::from_unix_secs(86_400).unwrap();
        assert_eq!(ts.checked_sub_days(1).map(|t| t.as_unix_secs()), Some(0));
        assert!(ts.checked_sub_days(i64::MAX).is_none());
        assert!(ts.checked_sub_days(100_000_000).is_none());
    }

    #[test]
    fn duration_since_is_signed() {
        let earlier = Timestamp::from_unix_secs(100).unwrap();
        let later = Timestamp::from_unix_secs(160).unwrap();

        assert_eq!(later.duration_since(&earlier).num_seconds(), 60);
        assert_eq!(earlier.duration_since(&later).num_seconds(), -60);
        assert!(earlier.is_before(&later));
    }
}
