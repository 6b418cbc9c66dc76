use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use lookbook_domain::calendar::{CalendarIndex, MonthGrid, YearMonth, WEEKDAY_LABELS};
use lookbook_domain::favorites::FavoriteSet;
use lookbook_domain::view::ViewState;

pub const EMPTY_DAY_TEXT: &str = "No items for this date.";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Render-ready month screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    /// e.g. "March 2025"
    pub label: String,
    pub weekdays: [&'static str; 7],
    /// Sunday-first, padded to whole weeks
    pub cells: Vec<DayCell>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    /// `None` for padding cells
    pub date: Option<String>,
    pub day: Option<u32>,
    pub images: Vec<String>,
    pub selected: bool,
}

impl DayCell {
    fn blank() -> Self {
        Self {
            date: None,
            day: None,
            images: Vec::new(),
            selected: false,
        }
    }
}

/// Day detail shown for the selected date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupView {
    pub date: String,
    /// e.g. "Outfits of March 14"
    pub title: String,
    pub images: Vec<PopupImage>,
    /// Set when the day has no images
    pub empty_text: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupImage {
    pub url: String,
    pub favorite: bool,
    /// A favorite change for this image is still syncing
    pub pending: bool,
}

impl MonthView {
    pub fn build(view: &ViewState, index: &CalendarIndex) -> Self {
        let month = view.month();
        let selected = view.selected_date();

        let cells = MonthGrid::new(month)
            .cells()
            .map(|cell| match cell {
                Some(date) => DayCell {
                    date: Some(date.format(DATE_FORMAT).to_string()),
                    day: Some(date.day()),
                    images: index.images_for(date).to_vec(),
                    selected: selected == Some(date),
                },
                None => DayCell::blank(),
            })
            .collect();

        Self {
            year: month.year(),
            month: month.month(),
            label: month.to_string(),
            weekdays: WEEKDAY_LABELS,
            cells,
            loading: view.is_loading(),
            error: view.error().map(str::to_string),
        }
    }
}

impl PopupView {
    pub fn build(date: NaiveDate, index: &CalendarIndex, favorites: &FavoriteSet) -> Self {
        let images: Vec<PopupImage> = index
            .images_for(date)
            .iter()
            .map(|url| PopupImage {
                url: url.clone(),
                favorite: favorites.contains(url),
                pending: favorites.is_pending(url),
            })
            .collect();

        Self {
            date: date.format(DATE_FORMAT).to_string(),
            title: format!("Outfits of {} {}", YearMonth::of(date).month_name(), date.day()),
            empty_text: images.is_empty().then_some(EMPTY_DAY_TEXT),
            images,
        }
    }
}
