//! Report cadence rules.
//!
//! Cadence decisions are made against the UTC calendar day: weekly projects
//! measure on Mondays, monthly projects on the first of the month.

use chrono::{Datelike, NaiveDate, Weekday};

/// How often a project's URLs are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl ReportFrequency {
    /// Parses the stored cadence value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(ReportFrequency::Daily),
            "weekly" => Some(ReportFrequency::Weekly),
            "monthly" => Some(ReportFrequency::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFrequency::Daily => "daily",
            ReportFrequency::Weekly => "weekly",
            ReportFrequency::Monthly => "monthly",
        }
    }

    /// Whether a scheduled run on `today` measures URLs of this cadence.
    pub fn qualifies(&self, today: NaiveDate) -> bool {
        match self {
            ReportFrequency::Daily => true,
            ReportFrequency::Weekly => today.weekday() == Weekday::Mon,
            ReportFrequency::Monthly => today.day() == 1,
        }
    }
}

impl std::fmt::Display for ReportFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_always_qualifies() {
        assert!(ReportFrequency::Daily.qualifies(date(2025, 6, 2)));
        assert!(ReportFrequency::Daily.qualifies(date(2025, 6, 3)));
        assert!(ReportFrequency::Daily.qualifies(date(2025, 12, 31)));
    }

    #[test]
    fn test_weekly_qualifies_only_on_monday() {
        // 2025-06-02 is a Monday.
        assert!(ReportFrequency::Weekly.qualifies(date(2025, 6, 2)));
        assert!(!ReportFrequency::Weekly.qualifies(date(2025, 6, 3)));
        assert!(!ReportFrequency::Weekly.qualifies(date(2025, 6, 8)));
        assert!(ReportFrequency::Weekly.qualifies(date(2025, 6, 9)));
    }

    #[test]
    fn test_monthly_qualifies_only_on_first() {
        assert!(ReportFrequency::Monthly.qualifies(date(2025, 6, 1)));
        assert!(!ReportFrequency::Monthly.qualifies(date(2025, 6, 2)));
        assert!(!ReportFrequency::Monthly.qualifies(date(2025, 6, 30)));
        assert!(ReportFrequency::Monthly.qualifies(date(2025, 7, 1)));
    }

    #[test]
    fn test_parse_round_trips() {
        for freq in [
            ReportFrequency::Daily,
            ReportFrequency::Weekly,
            ReportFrequency::Monthly,
        ] {
            assert_eq!(ReportFrequency::parse(freq.as_str()), Some(freq));
        }
        assert_eq!(ReportFrequency::parse("hourly"), None);
        assert_eq!(ReportFrequency::parse(""), None);
    }
}
