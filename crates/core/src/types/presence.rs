//! Presence derived from last-seen timestamps.
//!
//! Nothing pushes presence; it is recomputed from the stored timestamp each
//! time a view is built.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A participant counts as online for this many seconds after last being seen.
pub const ONLINE_WINDOW_SECS: i64 = 300;

/// Presence of a chat participant or user at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Presence {
    pub online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    /// "Just now", "5m ago", "3h ago", "2d ago", or "Never".
    pub label: String,
}

impl Presence {
    #[must_use]
    pub fn at(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        Self {
            online: is_online(last_seen, now),
            last_seen,
            label: last_seen.map_or_else(|| "Never".to_owned(), |t| time_since(t, now)),
        }
    }
}

/// Online iff last seen strictly less than five minutes before `now`.
#[must_use]
pub fn is_online(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    last_seen.is_some_and(|t| (now - t).num_seconds() < ONLINE_WINDOW_SECS)
}

/// Coarse relative time label, floored to whole units.
#[must_use]
pub fn time_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        "Just now".to_owned()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn ago(now: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
        now - TimeDelta::seconds(secs)
    }

    #[test]
    fn test_online_window_is_strict() {
        let now = Utc::now();
        assert!(is_online(Some(ago(now, 0)), now));
        assert!(is_online(Some(ago(now, 299)), now));
        assert!(!is_online(Some(ago(now, 300)), now));
        assert!(!is_online(Some(ago(now, 3600)), now));
        assert!(!is_online(None, now));
    }

    #[test]
    fn test_online_window_sub_second() {
        let now = Utc::now();
        let just_inside = now - TimeDelta::milliseconds(299_999);
        assert!(is_online(Some(just_inside), now));
        let exactly = now - TimeDelta::milliseconds(300_000);
        assert!(!is_online(Some(exactly), now));
    }

    #[test]
    fn test_time_since_labels() {
        let now = Utc::now();
        assert_eq!(time_since(ago(now, 30), now), "Just now");
        assert_eq!(time_since(ago(now, 60), now), "1m ago");
        assert_eq!(time_since(ago(now, 59 * 60 + 59), now), "59m ago");
        assert_eq!(time_since(ago(now, 60 * 60), now), "1h ago");
        assert_eq!(time_since(ago(now, 23 * 3600 + 3599), now), "23h ago");
        assert_eq!(time_since(ago(now, 24 * 3600), now), "1d ago");
        assert_eq!(time_since(ago(now, 10 * 24 * 3600), now), "10d ago");
    }

    #[test]
    fn test_future_timestamp_reads_as_now() {
        let now = Utc::now();
        assert_eq!(time_since(now + TimeDelta::seconds(90), now), "Just now");
    }

    #[test]
    fn test_presence_never_seen() {
        let presence = Presence::at(None, Utc::now());
        assert!(!presence.online);
        assert_eq!(presence.label, "Never");
    }
}
