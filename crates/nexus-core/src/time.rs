//! Millisecond UTC timestamps and the clock port (no chrono dependency).
//!
//! Uses Howard Hinnant's civil_from_days / days_from_civil algorithms for
//! Unix-to-date conversion in both directions.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::DAY_MS;

/// Milliseconds since the Unix epoch, UTC.
pub type Timestamp = i64;

/// Source of "now" for everything that schedules or animates.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now_unix_millis()
    }
}

/// Hand-advanced clock. Clones share the same instant.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn set(&self, ts: Timestamp) {
        self.now.store(ts, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Current UTC time as Unix milliseconds.
pub fn now_unix_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Convert Unix milliseconds to an ISO-8601 UTC string (second precision).
pub fn to_iso8601(ts: Timestamp) -> String {
    let days = ts.div_euclid(DAY_MS);
    let secs_of_day = ts.rem_euclid(DAY_MS) / 1000;
    let hours = secs_of_day / 3600;
    let minutes = (secs_of_day % 3600) / 60;
    let seconds = secs_of_day % 60;

    let (y, m, d) = civil_from_days(days);
    format!("{y:04}-{m:02}-{d:02}T{hours:02}:{minutes:02}:{seconds:02}Z")
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SSZ` into Unix milliseconds.
pub fn parse_iso8601(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    let (date, time) = match s.split_once('T') {
        Some((d, t)) => (d, Some(t.trim_end_matches('Z'))),
        None => (s, None),
    };

    let mut parts = date.splitn(3, '-');
    let y: i64 = parts.next()?.parse().ok()?;
    let m: u32 = parts.next()?.parse().ok()?;
    let d: u32 = parts.next()?.parse().ok()?;
    if !(0..=9999).contains(&y) || !(1..=12).contains(&m) {
        return None;
    }
    if !(1..=days_in_month(y, m)).contains(&d) {
        return None;
    }

    let mut secs_of_day = 0i64;
    if let Some(time) = time {
        let mut hms = time.splitn(3, ':');
        let h: u32 = hms.next()?.parse().ok()?;
        let mi: u32 = hms.next()?.parse().ok()?;
        let se: u32 = hms.next().unwrap_or("0").parse().ok()?;
        if h > 23 || mi > 59 || se > 60 {
            return None;
        }
        secs_of_day = i64::from(h * 3600 + mi * 60 + se);
    }

    days_from_civil(y, m, d)
        .checked_mul(DAY_MS)?
        .checked_add(secs_of_day * 1000)
}

fn is_leap_year(y: i64) -> bool {
    y % 4 == 0 && (y % 100 != 0 || y % 400 == 0)
}

fn days_in_month(y: i64, m: u32) -> u32 {
    match m {
        2 if is_leap_year(y) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Howard Hinnant's civil_from_days: Unix epoch days → (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

/// Inverse of `civil_from_days`.
fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let mp = if m > 2 { m - 3 } else { m + 9 } as u64;
    let doy = (153 * mp + 2) / 5 + d as u64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe as i64 - 719468
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_epoch() {
        assert_eq!(to_iso8601(0), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_known_date() {
        // 2026-02-21T00:00:00Z = 1771632000s
        assert_eq!(to_iso8601(1_771_632_000_000), "2026-02-21T00:00:00Z");
    }

    #[test]
    fn test_parse_date_only() {
        assert_eq!(parse_iso8601("2026-02-21"), Some(1_771_632_000_000));
    }

    #[test]
    fn test_parse_roundtrip_with_time() {
        let ts = 1_771_632_000_000 + 13 * 3_600_000 + 7 * 60_000 + 9_000;
        let s = to_iso8601(ts);
        assert_eq!(s, "2026-02-21T13:07:09Z");
        assert_eq!(parse_iso8601(&s), Some(ts));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_iso8601("yesterday"), None);
        assert_eq!(parse_iso8601("2026-13-01"), None);
        assert_eq!(parse_iso8601("2026-01-01T25:00:00Z"), None);
        assert_eq!(parse_iso8601("2026-01-01T-1:00:00Z"), None);
    }

    #[test]
    fn test_parse_rejects_out_of_range_year() {
        assert_eq!(parse_iso8601("999999999999-01-01"), None);
        assert_eq!(parse_iso8601("10000-01-01"), None);
        assert!(parse_iso8601("9999-12-31T23:59:59Z").is_some());
        assert!(parse_iso8601("0000-01-01").is_some());
    }

    #[test]
    fn test_parse_checks_day_against_month() {
        assert_eq!(parse_iso8601("2026-02-31"), None);
        assert_eq!(parse_iso8601("2026-02-29"), None);
        assert_eq!(parse_iso8601("2026-04-31"), None);
        assert_eq!(parse_iso8601("1900-02-29"), None);
        assert!(parse_iso8601("2024-02-29").is_some());
        assert!(parse_iso8601("2000-02-29").is_some());
        assert_eq!(
            parse_iso8601("2026-03-01").zip(parse_iso8601("2026-02-28")),
            Some((1_772_323_200_000, 1_772_236_800_000))
        );
    }

    #[test]
    fn test_pre_epoch() {
        assert_eq!(to_iso8601(-DAY_MS), "1969-12-31T00:00:00Z");
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();
        clock.advance(500);
        assert_eq!(other.now(), 1_500);
        other.set(42);
        assert_eq!(clock.now(), 42);
    }

    #[test]
    fn test_system_clock_is_recent() {
        let ts = to_iso8601(SystemClock.now());
        assert!(ts.starts_with("20"), "timestamp should be in 2000s: {ts}");
    }
}
