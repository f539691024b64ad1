//! Relative reporting periods (`LAST_12_MONTHS`, `THIS_YEAR`, ...).

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};

/// A named window relative to the current date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativePeriod {
    Today,
    Yesterday,
    Last7Days,
    Last14Days,
    Last30Days,
    ThisMonth,
    LastMonth,
    Last3Months,
    Last6Months,
    Last12Months,
    ThisYear,
    LastYear,
}

impl RelativePeriod {
    pub const ALL: [RelativePeriod; 12] = [
        Self::Today,
        Self::Yesterday,
        Self::Last7Days,
        Self::Last14Days,
        Self::Last30Days,
        Self::ThisMonth,
        Self::LastMonth,
        Self::Last3Months,
        Self::Last6Months,
        Self::Last12Months,
        Self::ThisYear,
        Self::LastYear,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "TODAY",
            Self::Yesterday => "YESTERDAY",
            Self::Last7Days => "LAST_7_DAYS",
            Self::Last14Days => "LAST_14_DAYS",
            Self::Last30Days => "LAST_30_DAYS",
            Self::ThisMonth => "THIS_MONTH",
            Self::LastMonth => "LAST_MONTH",
            Self::Last3Months => "LAST_3_MONTHS",
            Self::Last6Months => "LAST_6_MONTHS",
            Self::Last12Months => "LAST_12_MONTHS",
            Self::ThisYear => "THIS_YEAR",
            Self::LastYear => "LAST_YEAR",
        }
    }

    /// Parse a period name. Names are upper-case as stored in visualizations.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    /// Inclusive `(start, end)` date range of this period as seen on `today`.
    ///
    /// Day windows reach back the full count of days (`LAST_7_DAYS` on the
    /// 10th starts on the 3rd); month windows subtract calendar months,
    /// clamping to the end of shorter months.
    #[must_use]
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let month_start = today.with_day(1).unwrap_or(today);
        match self {
            Self::Today => (today, today),
            Self::Yesterday => {
                let yesterday = days_before(today, 1);
                (yesterday, yesterday)
            }
            Self::Last7Days => (days_before(today, 7), today),
            Self::Last14Days => (days_before(today, 14), today),
            Self::Last30Days => (days_before(today, 30), today),
            Self::ThisMonth => (month_start, today),
            Self::LastMonth => {
                let end = days_before(month_start, 1);
                (end.with_day(1).unwrap_or(end), end)
            }
            Self::Last3Months => (months_before(today, 3), today),
            Self::Last6Months => (months_before(today, 6), today),
            Self::Last12Months => (months_before(today, 12), today),
            Self::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
                today,
            ),
            Self::LastYear => {
                let year = today.year() - 1;
                (
                    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(today),
                    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(today),
                )
            }
        }
    }

    /// Whether `date` falls inside this period as seen on `today`.
    #[must_use]
    pub fn contains(&self, today: NaiveDate, date: NaiveDate) -> bool {
        let (start, end) = self.range(today);
        start <= date && date <= end
    }
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

impl fmt::Display for RelativePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelativePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown relative period: {s}"))
    }
}
