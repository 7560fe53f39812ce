// ABOUTME: Flexible parsing of the raw date strings found on blog pages.
// ABOUTME: Tries machine formats, month-name layouts and relative "N days ago" phrases in order.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static ORDINAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").unwrap());

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+|an?)\s+(minute|min|hour|hr|day|week|month|year)s?\s+ago$").unwrap()
});

/// Parses a date string relative to the current time.
pub fn parse_flexible_time(s: &str) -> Option<DateTime<Utc>> {
    parse_flexible_time_at(s, Utc::now())
}

/// Parses a date string, resolving relative phrases against `now`.
/// Returns None if no layout matches.
///
/// Layouts are tried in order: RFC 3339, RFC 2822, named time zones,
/// numeric offsets, naive date-times, month-name and numeric dates, and
/// finally relative phrases such as "3 days ago".
pub fn parse_flexible_time_at(s: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = parse_with_named_timezone(s) {
        return Some(dt);
    }

    let formats_with_tz = [
        // "Mon, 02 Jan 2006 15:04:05 -0700"
        "%a, %d %b %Y %H:%M:%S %z",
        // "02 Jan 2006 15:04:05 -0700"
        "%d %b %Y %H:%M:%S %z",
        // "2006-01-02T15:04:05-0700"
        "%Y-%m-%dT%H:%M:%S%z",
        // "2006-01-02 15:04:05 -07:00"
        "%Y-%m-%d %H:%M:%S %:z",
    ];
    for fmt in &formats_with_tz {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let formats_naive = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%d %b %Y %H:%M:%S",
        "%B %d, %Y %H:%M",
        "%B %d, %Y at %I:%M %p",
    ];
    for fmt in &formats_naive {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Some(dt) = parse_date_only(s) {
        return Some(dt);
    }

    parse_relative(s, now)
}

const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "mon", "tue",
    "wed", "thu", "fri", "sat", "sun",
];

/// Date-only layouts. Ordinal suffixes ("March 3rd") and a leading
/// weekday ("Tuesday, March 5, 2024") are removed first.
fn parse_date_only(s: &str) -> Option<DateTime<Utc>> {
    let cleaned = ORDINAL_RE.replace_all(s, "$1");
    let cleaned = cleaned.trim();
    let without_weekday = cleaned
        .split_once(", ")
        .filter(|(head, _)| WEEKDAYS.contains(&head.to_ascii_lowercase().as_str()))
        .map(|(_, rest)| rest.trim());

    let formats = [
        // "2006-01-02"
        "%Y-%m-%d",
        // "2006/01/02"
        "%Y/%m/%d",
        // "September 19, 2024" and "Sep 19, 2024"
        "%B %d, %Y",
        "%b %d, %Y",
        // "September 19 2024"
        "%B %d %Y",
        // "19 September 2024" and "19 Sep 2024"
        "%d %B %Y",
        "%d %b %Y",
        // "01/02/2006" (US order)
        "%m/%d/%Y",
        // "02.01.2006"
        "%d.%m.%Y",
    ];

    for candidate in std::iter::once(cleaned).chain(without_weekday) {
        for fmt in &formats {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, fmt) {
                let naive = date.and_hms_opt(0, 0, 0)?;
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
    }
    None
}

/// "3 days ago", "an hour ago", "yesterday" and "today".
fn parse_relative(s: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match s.to_ascii_lowercase().as_str() {
        "today" | "just now" => return Some(now),
        "yesterday" => return Some(now - Duration::days(1)),
        _ => {}
    }

    let caps = RELATIVE_RE.captures(s)?;
    let amount: i64 = match caps[1].to_ascii_lowercase().as_str() {
        "a" | "an" => 1,
        n => n.parse().ok()?,
    };
    let span = match caps[2].to_ascii_lowercase().as_str() {
        "minute" | "min" => Duration::try_minutes(amount)?,
        "hour" | "hr" => Duration::try_hours(amount)?,
        "day" => Duration::try_days(amount)?,
        "week" => Duration::try_weeks(amount)?,
        "month" => Duration::try_days(amount.checked_mul(30)?)?,
        _ => Duration::try_days(amount.checked_mul(365)?)?,
    };
    now.checked_sub_signed(span)
}

/// Parses datetime strings with named timezones (EST, PST, GMT, etc.).
/// chrono's %Z doesn't parse these, so the abbreviation is mapped by hand.
fn parse_with_named_timezone(s: &str) -> Option<DateTime<Utc>> {
    let tz_offsets: &[(&str, i32)] = &[
        ("GMT", 0),
        ("UTC", 0),
        ("EST", -5 * 3600),
        ("EDT", -4 * 3600),
        ("CST", -6 * 3600),
        ("CDT", -5 * 3600),
        ("MST", -7 * 3600),
        ("MDT", -6 * 3600),
        ("PST", -8 * 3600),
        ("PDT", -7 * 3600),
        ("AKST", -9 * 3600),
        ("AKDT", -8 * 3600),
        ("HST", -10 * 3600),
        ("CET", 3600),
        ("CEST", 2 * 3600),
        ("BST", 3600),
        ("AEST", 10 * 3600),
        ("AEDT", 11 * 3600),
    ];

    for (tz_name, offset_secs) in tz_offsets {
        let Some(base) = s.strip_suffix(tz_name) else {
            continue;
        };
        let base = base.trim_end();
        let formats = [
            "%a, %d %b %Y %H:%M:%S",
            "%d %b %Y %H:%M:%S",
            "%Y-%m-%d %H:%M:%S",
            "%B %d, %Y %I:%M %p",
        ];
        for fmt in &formats {
            if let Ok(naive) = NaiveDateTime::parse_from_str(base, fmt) {
                let offset = FixedOffset::east_opt(*offset_secs)?;
                let dt = offset.from_local_datetime(&naive).single()?;
                return Some(dt.with_timezone(&Utc));
            }
        }
    }

    None
}

/// The post date, or `fallback` when the raw string matches no layout.
pub fn post_date_or(raw: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    parse_flexible_time_at(raw, fallback).unwrap_or(fallback)
}

/// RSS `pubDate` form: "Mon, 15 Jan 2024 09:30:00 +0000".
pub fn format_rfc2822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

/// WordPress `post_date` form: "2024-01-15 09:30:00".
pub fn format_wp_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn ymd(dt: Option<DateTime<Utc>>) -> Option<(i32, u32, u32)> {
        dt.map(|d| (d.year(), d.month(), d.day()))
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            ymd(parse_flexible_time("2024-01-15T09:30:00+00:00")),
            Some((2024, 1, 15))
        );
    }

    #[test]
    fn test_rfc2822() {
        let dt = parse_flexible_time("Mon, 02 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(format_wp_date(&dt), "2006-01-02 22:04:05");
    }

    #[test]
    fn test_named_timezone() {
        let dt = parse_flexible_time("Mon, 02 Jan 2006 15:04:05 MST").unwrap();
        assert_eq!(format_wp_date(&dt), "2006-01-02 22:04:05");
    }

    #[test]
    fn test_month_name_layouts() {
        assert_eq!(ymd(parse_flexible_time("September 19, 2024")), Some((2024, 9, 19)));
        assert_eq!(ymd(parse_flexible_time("Sep 19, 2024")), Some((2024, 9, 19)));
        assert_eq!(ymd(parse_flexible_time("Mar 3, 2024")), Some((2024, 3, 3)));
        assert_eq!(ymd(parse_flexible_time("19 September 2024")), Some((2024, 9, 19)));
        assert_eq!(ymd(parse_flexible_time("March 3rd, 2024")), Some((2024, 3, 3)));
        assert_eq!(
            ymd(parse_flexible_time("Tuesday, March 5, 2024")),
            Some((2024, 3, 5))
        );
    }

    #[test]
    fn test_numeric_dates() {
        assert_eq!(ymd(parse_flexible_time("2023-12-25")), Some((2023, 12, 25)));
        assert_eq!(ymd(parse_flexible_time("12/25/2023")), Some((2023, 12, 25)));
        assert_eq!(ymd(parse_flexible_time("25.12.2023")), Some((2023, 12, 25)));
    }

    #[test]
    fn test_relative_phrases() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(
            parse_flexible_time_at("3 days ago", now),
            Some(Utc.with_ymd_and_hms(2024, 5, 7, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse_flexible_time_at("an hour ago", now),
            Some(Utc.with_ymd_and_hms(2024, 5, 10, 11, 0, 0).unwrap())
        );
        assert_eq!(
            parse_flexible_time_at("Yesterday", now),
            Some(Utc.with_ymd_and_hms(2024, 5, 9, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unparseable_falls_back() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(parse_flexible_time_at("not a date", now), None);
        assert_eq!(post_date_or("not a date", now), now);
        assert_eq!(post_date_or("", now), now);
    }

    #[test]
    fn test_output_formats() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        assert_eq!(format_rfc2822(&dt), "Mon, 15 Jan 2024 09:30:00 +0000");
        assert_eq!(format_wp_date(&dt), "2024-01-15 09:30:00");
    }
}
