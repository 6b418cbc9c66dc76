mod calendar_view;

pub use calendar_view::{DayCell, MonthView, PopupImage, PopupView, EMPTY_DAY_TEXT};
