//! Date windows and vendor date formats.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive range of calendar days a sync covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// `[today - days_back, today]`.
    pub fn trailing(today: NaiveDate, days_back: u32) -> Self {
        let start = today
            .checked_sub_days(Days::new(u64::from(days_back)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Parse the `YYYYMMDD` form GA4 reports use. Anything else maps to `fallback`.
pub fn parse_compact_date(value: &str, fallback: NaiveDate) -> NaiveDate {
    if value.len() != 8 {
        return fallback;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").unwrap_or(fallback)
}

/// Parse the `YYYY-MM-DD` form Search Console and YouTube use.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_trailing_window() {
        let window = DateWindow::trailing(date(2026, 3, 31), 30);
        assert_eq!(window.start, date(2026, 3, 1));
        assert_eq!(window.end, date(2026, 3, 31));
        assert_eq!(window.len_days(), 31);
        assert_eq!(window.start_param(), "2026-03-01");
    }

    #[test]
    fn test_zero_days_back_is_today_only() {
        let today = date(2026, 1, 1);
        let window = DateWindow::trailing(today, 0);
        assert_eq!(window.start, today);
        assert_eq!(window.len_days(), 1);
        assert!(window.contains(today));
        assert!(!window.contains(date(2025, 12, 31)));
    }

    #[test]
    fn test_parse_compact_date() {
        let fallback = date(2000, 1, 1);
        assert_eq!(parse_compact_date("20260214", fallback), date(2026, 2, 14));
        assert_eq!(parse_compact_date("2026-02-14", fallback), fallback);
        assert_eq!(parse_compact_date("", fallback), fallback);
        assert_eq!(parse_compact_date("20261399", fallback), fallback);
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2026-02-14"), Some(date(2026, 2, 14)));
        assert_eq!(parse_iso_date("20260214"), None);
    }
}
