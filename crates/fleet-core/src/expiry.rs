//! Days-remaining and severity buckets for MOT and insurance expiry dates.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Upper bound (inclusive) of the critical bucket, in days.
pub const CRITICAL_WITHIN_DAYS: i64 = 30;
/// Upper bound (inclusive) of the warning bucket, in days.
pub const WARNING_WITHIN_DAYS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpiryBucket {
    Ok,
    Warning,
    Critical,
}

impl ExpiryBucket {
    pub fn for_days(days_remaining: i64) -> Self {
        if days_remaining <= CRITICAL_WITHIN_DAYS {
            ExpiryBucket::Critical
        } else if days_remaining <= WARNING_WITHIN_DAYS {
            ExpiryBucket::Warning
        } else {
            ExpiryBucket::Ok
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpiryStatus {
    pub days_remaining: i64,
    pub bucket: ExpiryBucket,
}

/// Classifies `target` against the current local time.
pub fn classify(target: NaiveDate) -> ExpiryStatus {
    classify_at(target, Local::now().naive_local())
}

/// Classifies `target` (taken as midnight) against `reference`.
///
/// Days are whole and truncated toward zero, so an expiry later today counts as zero days and
/// anything already past is negative.
pub fn classify_at(target: NaiveDate, reference: NaiveDateTime) -> ExpiryStatus {
    let days_remaining = (target.and_time(chrono::NaiveTime::MIN) - reference).num_days();
    ExpiryStatus {
        days_remaining,
        bucket: ExpiryBucket::for_days(days_remaining),
    }
}

/// Classifies `target` against a reference date at midnight.
pub fn classify_on(target: NaiveDate, reference: NaiveDate) -> ExpiryStatus {
    classify_at(target, reference.and_time(chrono::NaiveTime::MIN))
}

/// Parses the ISO-8601 forms the history API and the date input produce.
///
/// Accepts bare dates (`2025-05-12`), naive timestamps, and RFC 3339 timestamps; the date part is
/// taken as written without shifting zones.
pub fn parse_api_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.date_naive());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(stamp.date());
    }
    NaiveDate::parse_from_str(raw, "%Y.%m.%d").ok()
}
