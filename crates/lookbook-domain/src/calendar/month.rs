use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::iter;

use crate::shared::DomainError;

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One-month navigation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthStep {
    Previous,
    Next,
}

impl TryFrom<i32> for MonthStep {
    type Error = DomainError;

    fn try_from(delta: i32) -> Result<Self, Self::Error> {
        match delta {
            -1 => Ok(MonthStep::Previous),
            1 => Ok(MonthStep::Next),
            other => Err(DomainError::Validation(format!(
                "Month step must be -1 or +1, got {other}"
            ))),
        }
    }
}

/// A calendar month; `month` is always in 1..=12
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, DomainError> {
        if !(1..=12).contains(&month) {
            return Err(DomainError::Validation(format!("Invalid month: {month}")));
        }
        // Rejects years outside chrono's range
        NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| DomainError::Validation(format!("Invalid year: {year}")))?;
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Roll by one month, carrying the year at the January/December boundary
    pub fn navigate(self, step: MonthStep) -> Self {
        match (step, self.month) {
            (MonthStep::Previous, 1) => Self {
                year: self.year - 1,
                month: 12,
            },
            (MonthStep::Previous, m) => Self {
                year: self.year,
                month: m - 1,
            },
            (MonthStep::Next, 12) => Self {
                year: self.year + 1,
                month: 1,
            },
            (MonthStep::Next, m) => Self {
                year: self.year,
                month: m + 1,
            },
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn days_in_month(&self) -> u32 {
        let next = self.navigate(MonthStep::Next);
        NaiveDate::from_ymd_opt(next.year, next.month, 1)
            .and_then(|d| d.pred_opt())
            .map(|d| d.day())
            .unwrap_or(0)
    }

    /// The date for a day of this month, if it exists
    pub fn day(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or_default()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

/// Cells of a Sunday-first month view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    month: YearMonth,
}

impl MonthGrid {
    pub fn new(month: YearMonth) -> Self {
        Self { month }
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    /// Blank cells before day 1
    pub fn leading_blanks(&self) -> usize {
        self.month
            .first_day()
            .map(|d| d.weekday().num_days_from_sunday() as usize)
            .unwrap_or(0)
    }

    /// Blank cells after the last day, completing the final week
    pub fn trailing_blanks(&self) -> usize {
        let used = self.leading_blanks() + self.month.days_in_month() as usize;
        (7 - used % 7) % 7
    }

    pub fn cell_count(&self) -> usize {
        self.leading_blanks() + self.month.days_in_month() as usize + self.trailing_blanks()
    }

    /// Leading blanks, every day of the month, trailing blanks.
    ///
    /// Derived from the month on every call; iterating twice yields the same cells.
    pub fn cells(&self) -> impl Iterator<Item = Option<NaiveDate>> + Clone {
        let month = self.month;
        iter::repeat(None)
            .take(self.leading_blanks())
            .chain((1..=month.days_in_month()).map(move |d| month.day(d)))
            .chain(iter::repeat(None).take(self.trailing_blanks()))
    }

    /// The cells split into rows of seven
    pub fn weeks(&self) -> Vec<Vec<Option<NaiveDate>>> {
        let cells: Vec<_> = self.cells().collect();
        cells.chunks(7).map(<[_]>::to_vec).collect()
    }
}
