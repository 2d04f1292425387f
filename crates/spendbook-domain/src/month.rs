//! Month keys, month filters, and the selectable month range.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Token used by filters to mean "every month".
pub const ALL_MONTHS_TOKEN: &str = "all";

/// A calendar month, rendered as `YYYY-MM`.
///
/// Backed by the first day of the month so ordering and arithmetic reuse
/// `NaiveDate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthKeyError> {
        if !(1..=12).contains(&month) {
            return Err(MonthKeyError::InvalidMonth(month));
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(MonthKey)
            .ok_or(MonthKeyError::OutOfRange(year))
    }

    /// Month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        MonthKey(date.with_day(1).unwrap_or(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn days_in_month(&self) -> u32 {
        (28..=31)
            .rev()
            .find(|day| self.0.with_day(*day).is_some())
            .unwrap_or(28)
    }

    /// Returns the `day`-th day of this month, clamped to the month's last day.
    pub fn day_clamped(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days_in_month());
        self.0.with_day(day).unwrap_or(self.0)
    }

    pub fn succ(&self) -> Option<MonthKey> {
        self.0.checked_add_months(Months::new(1)).map(MonthKey)
    }

    /// Long label such as `November 2025`.
    pub fn label(&self) -> String {
        self.0.format("%B %Y").to_string()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let (year, month) = raw
            .split_once('-')
            .ok_or_else(|| MonthKeyError::Malformed(raw.to_string()))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(MonthKeyError::Malformed(raw.to_string()));
        }
        let year = year
            .parse::<i32>()
            .map_err(|_| MonthKeyError::Malformed(raw.to_string()))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| MonthKeyError::Malformed(raw.to_string()))?;
        MonthKey::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = MonthKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Errors that can occur when parsing or constructing [`MonthKey`] values.
pub enum MonthKeyError {
    Malformed(String),
    InvalidMonth(u32),
    OutOfRange(i32),
}

impl fmt::Display for MonthKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthKeyError::Malformed(raw) => {
                write!(f, "invalid month `{raw}` (use YYYY-MM)")
            }
            MonthKeyError::InvalidMonth(month) => {
                write!(f, "month must be between 01 and 12, got {month}")
            }
            MonthKeyError::OutOfRange(year) => write!(f, "year {year} is out of range"),
        }
    }
}

impl std::error::Error for MonthKeyError {}

/// Which expenses a view or total covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MonthFilter {
    #[default]
    All,
    Month(MonthKey),
}

impl MonthFilter {
    pub fn matches(&self, key: MonthKey) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(selected) => *selected == key,
        }
    }

    pub fn month(&self) -> Option<MonthKey> {
        match self {
            MonthFilter::All => None,
            MonthFilter::Month(key) => Some(*key),
        }
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str(ALL_MONTHS_TOKEN),
            MonthFilter::Month(key) => key.fmt(f),
        }
    }
}

impl FromStr for MonthFilter {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(ALL_MONTHS_TOKEN) {
            Ok(MonthFilter::All)
        } else {
            s.parse().map(MonthFilter::Month)
        }
    }
}

impl From<MonthKey> for MonthFilter {
    fn from(value: MonthKey) -> Self {
        MonthFilter::Month(value)
    }
}

/// Month an expense is recorded against when it is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributedMonth {
    /// Stamp the expense with the current moment.
    #[default]
    Current,
    /// Stamp the expense inside the given month.
    Month(MonthKey),
}

impl From<MonthFilter> for AttributedMonth {
    fn from(value: MonthFilter) -> Self {
        match value {
            MonthFilter::All => AttributedMonth::Current,
            MonthFilter::Month(key) => AttributedMonth::Month(key),
        }
    }
}

/// Inclusive range of selectable months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRange {
    pub start: MonthKey,
    pub end: MonthKey,
}

impl MonthRange {
    pub fn new(start: MonthKey, end: MonthKey) -> Result<Self, MonthRangeError> {
        if end < start {
            return Err(MonthRangeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, key: MonthKey) -> bool {
        key >= self.start && key <= self.end
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Months from `start` through `end`, in ascending order.
    pub fn months(&self) -> Vec<MonthKey> {
        let mut months = Vec::new();
        let mut cursor = Some(self.start);
        while let Some(key) = cursor {
            if key > self.end {
                break;
            }
            months.push(key);
            cursor = key.succ();
        }
        months
    }

    /// Selector entries: the `all` sentinel first, then every month in range.
    pub fn options(&self) -> Vec<MonthOption> {
        let mut options = vec![MonthOption {
            filter: MonthFilter::All,
            label: "Month".into(),
        }];
        options.extend(self.months().into_iter().map(|key| MonthOption {
            filter: MonthFilter::Month(key),
            label: key.label(),
        }));
        options
    }

    /// Accepts `all` or any month inside the range.
    pub fn allows(&self, filter: MonthFilter) -> bool {
        match filter {
            MonthFilter::All => true,
            MonthFilter::Month(key) => self.contains(key),
        }
    }
}

impl Default for MonthRange {
    fn default() -> Self {
        Self {
            start: MonthKey(NaiveDate::from_ymd_opt(2025, 11, 1).unwrap_or_default()),
            end: MonthKey(NaiveDate::from_ymd_opt(2026, 12, 1).unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One entry of the month selector.
pub struct MonthOption {
    pub filter: MonthFilter,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur when constructing [`MonthRange`] values.
pub enum MonthRangeError {
    InvalidRange { start: MonthKey, end: MonthKey },
}

impl fmt::Display for MonthRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthRangeError::InvalidRange { start, end } => {
                write!(f, "month range end {end} is before start {start}")
            }
        }
    }
}

impl std::error::Error for MonthRangeError {}
