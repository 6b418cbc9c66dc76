use chrono::NaiveDate;

use crate::calendar::{MonthStep, YearMonth};
use crate::shared::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewPhase {
    Loading,
    Ready,
    /// Terminal until a manual retry
    Error(String),
}

/// State of the calendar screen
///
/// `Loading -> Ready | Error`, `Ready <-> popup open` through date selection
/// and close, `Error -> Loading` only through `retry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    month: YearMonth,
    selected_date: Option<NaiveDate>,
    phase: ViewPhase,
}

impl ViewState {
    /// A screen that has just started its first fetch
    pub fn new(month: YearMonth) -> Self {
        Self {
            month,
            selected_date: None,
            phase: ViewPhase::Loading,
        }
    }

    pub fn phase(&self) -> &ViewPhase {
        &self.phase
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.month.year()
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    pub fn is_loading(&self) -> bool {
        self.phase == ViewPhase::Loading
    }

    pub fn is_ready(&self) -> bool {
        self.phase == ViewPhase::Ready
    }

    pub fn is_popup_open(&self) -> bool {
        self.is_ready() && self.selected_date.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            ViewPhase::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn load_succeeded(&mut self) -> Result<(), DomainError> {
        self.require(ViewPhase::Loading, "complete loading")?;
        self.phase = ViewPhase::Ready;
        Ok(())
    }

    pub fn load_failed(&mut self, message: impl Into<String>) -> Result<(), DomainError> {
        self.require(ViewPhase::Loading, "fail loading")?;
        self.phase = ViewPhase::Error(message.into());
        self.selected_date = None;
        Ok(())
    }

    /// Leave the error state and start a new fetch
    pub fn retry(&mut self) -> Result<(), DomainError> {
        if self.error().is_none() {
            return Err(self.invalid("retry"));
        }
        self.phase = ViewPhase::Loading;
        Ok(())
    }

    /// Open the popup for a day of the displayed month
    pub fn select_date(&mut self, date: NaiveDate) -> Result<(), DomainError> {
        self.require(ViewPhase::Ready, "select a date")?;
        if !self.month.contains(date) {
            return Err(DomainError::Validation(format!(
                "{date} is not in {}",
                self.month
            )));
        }
        self.selected_date = Some(date);
        Ok(())
    }

    pub fn close_popup(&mut self) {
        self.selected_date = None;
    }

    /// Move one month back or forward; an open popup is closed
    pub fn navigate(&mut self, step: MonthStep) -> Result<YearMonth, DomainError> {
        self.require(ViewPhase::Ready, "navigate")?;
        self.month = self.month.navigate(step);
        self.selected_date = None;
        Ok(self.month)
    }

    fn require(&self, phase: ViewPhase, action: &str) -> Result<(), DomainError> {
        if self.phase != phase {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    fn invalid(&self, action: &str) -> DomainError {
        DomainError::InvalidState(format!("Cannot {action} while {:?}", self.phase))
    }
}
