use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::value::Value;

/// `expires_at` marker for entries that never expire
pub const NO_EXPIRATION: i64 = 0;

/// Current wall-clock time in nanoseconds since the Unix epoch
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(duration_nanos)
        .unwrap_or_default()
}

/// Converts a duration to nanoseconds, saturating at `i64::MAX`
pub(crate) fn duration_nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

/// Requested lifetime of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Keep the entry until it is deleted or overwritten
    Never,
    /// Use the store's configured default TTL
    #[default]
    Default,
    /// Expire this long after the write.
    ///
    /// A zero duration is treated as `Default`.
    After(Duration),
}

impl Ttl {
    /// Resolves the TTL to an absolute `expires_at` timestamp.
    ///
    /// `default_ttl` of `None` means the store default is "never expire".
    pub(crate) fn expires_at(self, default_ttl: Option<Duration>, now: i64) -> i64 {
        let lifetime = match self {
            Ttl::Never => None,
            Ttl::Default => default_ttl,
            Ttl::After(d) if d.is_zero() => default_ttl,
            Ttl::After(d) => Some(d),
        };

        match lifetime {
            Some(d) if !d.is_zero() => now.saturating_add(duration_nanos(d)),
            _ => NO_EXPIRATION,
        }
    }
}

impl From<Duration> for Ttl {
    fn from(d: Duration) -> Self {
        Ttl::After(d)
    }
}

impl From<Option<Duration>> for Ttl {
    fn from(d: Option<Duration>) -> Self {
        match d {
            Some(d) => Ttl::After(d),
            None => Ttl::Never,
        }
    }
}

/// Represents a stored value with its expiration time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    value: Value,
    expires_at: i64,
}

impl Entry {
    /// Creates a new entry. `expires_at` is in Unix nanoseconds, `0` for never.
    pub fn new(value: Value, expires_at: i64) -> Self {
        Self { value, expires_at }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Returns the expiration timestamp (`0` = never)
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Returns the expiration as a wall-clock time, or `None` if it never expires
    pub fn expiration_time(&self) -> Option<SystemTime> {
        if self.expires_at == NO_EXPIRATION {
            return None;
        }
        let nanos = u64::try_from(self.expires_at).unwrap_or(0);
        Some(UNIX_EPOCH + Duration::from_nanos(nanos))
    }

    /// Checks if this entry is expired at `now` (Unix nanoseconds)
    #[inline]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at != NO_EXPIRATION && now > self.expires_at
    }

    /// Checks if this entry has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_nanos())
    }

    /// Time left before expiry, `None` for entries that never expire
    pub fn ttl_remaining(&self, now: i64) -> Option<Duration> {
        if self.expires_at == NO_EXPIRATION {
            return None;
        }
        let left = self.expires_at.saturating_sub(now).max(0);
        Some(Duration::from_nanos(left as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: i64 = 1_000_000_000;

    #[test]
    fn test_never_expiring_entry() {
        let entry = Entry::new(Value::from("v"), NO_EXPIRATION);

        assert!(!entry.is_expired_at(i64::MAX));
        assert!(!entry.is_expired());
        assert_eq!(entry.ttl_remaining(now_nanos()), None);
        assert_eq!(entry.expiration_time(), None);
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        let t = 1_000 * SECOND;
        let entry = Entry::new(Value::from(1), t);

        assert!(!entry.is_expired_at(t - 1));
        assert!(!entry.is_expired_at(t));
        assert!(entry.is_expired_at(t + 1));
    }

    #[test]
    fn test_entry_expired() {
        let entry = Entry::new(Value::from("test_value"), now_nanos() - SECOND);
        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(now_nanos()), Some(Duration::ZERO));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = Entry::new(Value::Null, 10 * SECOND);
        assert_eq!(entry.ttl_remaining(4 * SECOND), Some(Duration::from_secs(6)));
    }

    #[test]
    fn test_ttl_resolution() {
        let now = 100 * SECOND;
        let default = Some(Duration::from_secs(30));

        assert_eq!(Ttl::Never.expires_at(default, now), NO_EXPIRATION);
        assert_eq!(Ttl::Default.expires_at(default, now), 130 * SECOND);
        assert_eq!(Ttl::Default.expires_at(None, now), NO_EXPIRATION);
        assert_eq!(
            Ttl::After(Duration::from_secs(5)).expires_at(default, now),
            105 * SECOND
        );
        // zero falls back to the default
        assert_eq!(Ttl::After(Duration::ZERO).expires_at(default, now), 130 * SECOND);
        assert_eq!(Ttl::After(Duration::ZERO).expires_at(None, now), NO_EXPIRATION);
    }

    #[test]
    fn test_extreme_ttl_saturates() {
        let expires_at = Ttl::After(Duration::MAX).expires_at(None, now_nanos());
        assert_eq!(expires_at, i64::MAX);
    }

    #[test]
    fn test_ttl_conversions() {
        assert_eq!(Ttl::from(Duration::from_secs(1)), Ttl::After(Duration::from_secs(1)));
        assert_eq!(Ttl::from(None), Ttl::Never);
        assert_eq!(Ttl::default(), Ttl::Default);
    }

    #[test]
    fn test_expiration_time() {
        let entry = Entry::new(Value::Null, 5 * SECOND);
        assert_eq!(
            entry.expiration_time(),
            Some(UNIX_EPOCH + Duration::from_secs(5))
        );
    }
}
