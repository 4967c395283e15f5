// src/core/recency.rs
// Timestamp parsing + trailing-window check. Unparseable means "not recent".

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::consts::SHEETS_EPOCH;

/// Full date-time layouts, tried in order. First match wins.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M",
    "%Y%m%d%H%M%S",
    "%Y%m%dT%H%M%S",
];

/// Date-only layouts; the time is taken as midnight.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y%m%d",
];

/// Parse a sheet timestamp in any accepted layout.
///
/// Order: RFC 3339 (converted to local time), the date-time layouts, the
/// date-only layouts, then a Google Sheets serial number (days since
/// 1899-12-30, fraction is the time of day).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() { return None; }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    from_sheets_serial(s)
}

/// "45306.5" -> 2024-01-15 12:00:00. Rejects negatives and absurd values.
fn from_sheets_serial(s: &str) -> Option<NaiveDateTime> {
    let serial: f64 = s.parse().ok()?;
    if !serial.is_finite() || !(1.0..=2_958_465.0).contains(&serial) { return None; }
    let epoch = sheets_epoch()?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

/// Inverse of `from_sheets_serial`; used when appending timestamp cells.
pub fn to_sheets_serial(dt: NaiveDateTime) -> f64 {
    match sheets_epoch() {
        Some(epoch) => (dt - epoch).num_milliseconds() as f64 / 86_400_000.0,
        None => 0.0,
    }
}

fn sheets_epoch() -> Option<NaiveDateTime> {
    let (y, m, d) = SHEETS_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d).map(|d| d.and_time(NaiveTime::MIN))
}

/// True iff `timestamp` parses and is at most `window_days` old (inclusive).
pub fn is_recent(timestamp: &str, window_days: u32) -> bool {
    is_recent_at(timestamp, window_days, Local::now().naive_local())
}

/// `is_recent` against an explicit clock.
pub fn is_recent_at(timestamp: &str, window_days: u32, now: NaiveDateTime) -> bool {
    match parse_timestamp(timestamp) {
        Some(ts) => now - ts <= Duration::days(i64::from(window_days)),
        None => false,
    }
}
