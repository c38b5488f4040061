//! Display helpers shared by the page views.

use chrono::{DateTime, NaiveDate, Utc};

/// Human-friendly age of a timestamp relative to `now`.
///
/// Under a week reads as "N minutes/hours/days ago"; older dates read as
/// `Mon D, YYYY`.
pub fn relative_date(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    if hours < 24 {
        return plural(hours, "hour");
    }
    if days < 7 {
        return plural(days, "day");
    }
    at.format("%b %-d, %Y").to_string()
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

/// Parse a stored date, accepting either a full timestamp or a bare date
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Relative date for an optional timestamp; blank when absent
pub fn relative_or_blank(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    at.map(|at| relative_date(at, now)).unwrap_or_default()
}
