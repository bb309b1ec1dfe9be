//! Calendar-month arithmetic and timezone handling.
//!
//! Nothing in this module reads the wall clock except [`TimezoneHandler::now`];
//! all bucketing helpers take explicit years, months and timezones so they are
//! deterministic under test.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{ExpenseError, Result};

// ── Month arithmetic ──────────────────────────────────────────────────────────

/// Move `(year, month)` by `delta` calendar months, carrying across years.
///
/// `month` is 1-based.
///
/// ```
/// use expense_core::calendar::shift_months;
///
/// assert_eq!(shift_months(2024, 2, -5), (2023, 9));
/// assert_eq!(shift_months(2023, 12, 1), (2024, 1));
/// ```
pub fn shift_months(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Inclusive bounds of a calendar month in `tz`.
///
/// The start is the first instant of day 1; the end is the last representable
/// instant before the following month starts. Returns `None` only when the
/// month lies outside chrono's representable range.
pub fn month_bounds<Z: TimeZone>(
    tz: &Z,
    year: i32,
    month: u32,
) -> Option<(DateTime<Z>, DateTime<Z>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = shift_months(year, month, 1);
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;

    let start = start_of_day(tz, first);
    let end = start_of_day(tz, first_of_next) - Duration::nanoseconds(1);
    Some((start, end))
}

/// Human-readable month label, e.g. `"Jan 2024"`.
pub fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|| format!("{month:02}/{year}"))
}

/// First valid local instant of `date` in `tz`.
///
/// Midnight can be skipped by a DST transition in some zones; in that case the
/// earliest valid instant later that day is used.
fn start_of_day<Z: TimeZone>(tz: &Z, date: NaiveDate) -> DateTime<Z> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => (1..=24 * 60)
            .find_map(|minutes| {
                tz.from_local_datetime(&(midnight + Duration::minutes(minutes)))
                    .earliest()
            })
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight)),
    }
}

// ── Date parsing ──────────────────────────────────────────────────────────────

/// When an expense happened, as written in the data.
///
/// A bare `YYYY-MM-DD` is a calendar day with no time of day; it belongs to
/// that day in every timezone. Anything with a time is a precise instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseDate {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

impl ExpenseDate {
    /// Accepts RFC 3339 (`2024-01-15T10:30:00Z`, any fixed offset), a naive
    /// datetime (interpreted as UTC) or a bare `YYYY-MM-DD` date. Returns
    /// `None` for empty strings or unrecognised formats.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Self::Instant(dt.with_timezone(&Utc)));
        }

        const FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];
        for fmt in FMTS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Self::Instant(naive.and_utc()));
            }
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Self::Day)
    }

    /// The instant used for ordering. A calendar day sorts at its midnight UTC.
    pub fn to_utc(self) -> DateTime<Utc> {
        match self {
            Self::Day(day) => day.and_time(NaiveTime::MIN).and_utc(),
            Self::Instant(instant) => instant,
        }
    }

    pub fn is_day(self) -> bool {
        matches!(self, Self::Day(_))
    }
}

/// Parse a `YYYY-MM-DD` calendar date supplied on the command line.
pub fn parse_calendar_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ExpenseError::DateParse(s.to_string()))
}

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Resolves the timezone in which calendar months are bucketed.
pub struct TimezoneHandler {
    tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler for the given IANA timezone name.
    ///
    /// `"auto"` resolves to the system timezone. Unrecognised names fall back
    /// to UTC and log a warning.
    pub fn new(tz_name: &str) -> Self {
        let resolved = if tz_name.eq_ignore_ascii_case("auto") {
            get_system_timezone()
        } else {
            tz_name.to_string()
        };
        let tz = resolved.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                resolved
            );
            Tz::UTC
        });
        Self { tz }
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// The current instant in the handler's timezone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// The start of `date` in the handler's timezone, for use as an explicit
    /// reference instant.
    pub fn at_date(&self, date: NaiveDate) -> DateTime<Tz> {
        start_of_day(&self.tz, date)
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    // ── shift_months ─────────────────────────────────────────────────────────

    #[test]
    fn test_shift_months_within_year() {
        assert_eq!(shift_months(2024, 6, -5), (2024, 1));
        assert_eq!(shift_months(2024, 1, 0), (2024, 1));
    }

    #[test]
    fn test_shift_months_across_year_boundary() {
        assert_eq!(shift_months(2024, 1, -1), (2023, 12));
        assert_eq!(shift_months(2024, 3, -15), (2022, 12));
        assert_eq!(shift_months(2023, 11, 3), (2024, 2));
    }

    // ── month_bounds ─────────────────────────────────────────────────────────

    #[test]
    fn test_month_bounds_utc_leap_february() {
        let (start, end) = month_bounds(&Utc, 2024, 2).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(end.day(), 29);
        assert_eq!(end.hour(), 23);
        assert_eq!(end.minute(), 59);
        assert_eq!(end.second(), 59);
        assert_eq!(end.nanosecond(), 999_999_999);
    }

    #[test]
    fn test_month_bounds_december_rolls_into_next_year() {
        let (_, end) = month_bounds(&Utc, 2023, 12).unwrap();
        assert_eq!(
            end + Duration::nanoseconds(1),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_month_bounds_in_named_timezone() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let (start, _) = month_bounds(&tz, 2024, 1).unwrap();
        // Midnight EST is 05:00 UTC.
        assert_eq!(
            start.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_month_bounds_when_local_midnight_is_skipped() {
        // Paraguay moved clocks forward at 00:00 on 2023-10-01, so October
        // starts at 01:00 local time.
        let tz: Tz = "America/Asuncion".parse().unwrap();
        let (_, sep_end) = month_bounds(&tz, 2023, 9).unwrap();
        let (oct_start, _) = month_bounds(&tz, 2023, 10).unwrap();

        assert_eq!(oct_start.day(), 1);
        assert_eq!(oct_start.hour(), 1);
        assert_eq!(
            oct_start.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2023, 10, 1, 4, 0, 0).unwrap()
        );
        assert_eq!(sep_end + Duration::nanoseconds(1), oct_start);
    }

    // ── month_label ──────────────────────────────────────────────────────────

    #[test]
    fn test_month_label() {
        assert_eq!(month_label(2024, 1), "Jan 2024");
        assert_eq!(month_label(2023, 9), "Sep 2023");
    }

    // ── ExpenseDate ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_bare_date_is_calendar_day() {
        let date = ExpenseDate::parse("2024-01-15").unwrap();
        assert_eq!(date, ExpenseDate::Day(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));
        assert!(date.is_day());
        assert_eq!(date.to_utc(), Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let date = ExpenseDate::parse("2024-01-15T12:00:00+02:00").unwrap();
        assert!(!date.is_day());
        assert_eq!(date.to_utc().hour(), 10);
    }

    #[test]
    fn test_parse_z_suffix_and_naive() {
        assert!(ExpenseDate::parse("2024-01-15T10:30:00Z").is_some());
        let naive = ExpenseDate::parse("2024-01-15 10:30:00").unwrap();
        assert_eq!(naive.to_utc().minute(), 30);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ExpenseDate::parse("").is_none());
        assert!(ExpenseDate::parse("   ").is_none());
        assert!(ExpenseDate::parse("15/01/2024").is_none());
        assert!(ExpenseDate::parse("2023-02-29").is_none());
    }

    #[test]
    fn test_parse_calendar_date() {
        assert_eq!(
            parse_calendar_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(matches!(
            parse_calendar_date("2024-13-01"),
            Err(ExpenseError::DateParse(_))
        ));
    }

    // ── TimezoneHandler ──────────────────────────────────────────────────────

    #[test]
    fn test_validate_timezone() {
        assert!(TimezoneHandler::validate_timezone("Europe/London"));
        assert!(TimezoneHandler::validate_timezone("UTC"));
        assert!(!TimezoneHandler::validate_timezone("Mars/Olympus"));
    }

    #[test]
    fn test_invalid_timezone_falls_back_to_utc() {
        let handler = TimezoneHandler::new("Invalid/Timezone");
        assert_eq!(handler.tz(), Tz::UTC);
    }

    #[test]
    fn test_named_timezone_is_used() {
        let handler = TimezoneHandler::new("Asia/Tokyo");
        assert_eq!(handler.tz(), Tz::Asia__Tokyo);
    }

    #[test]
    fn test_at_date_is_local_midnight() {
        let handler = TimezoneHandler::new("Asia/Tokyo");
        let dt = handler.at_date(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(dt.hour(), 0);
        assert_eq!(
            dt.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 3, 9, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_get_system_timezone_returns_nonempty_string() {
        assert!(!get_system_timezone().is_empty());
    }
}
