mod index;
mod items;
mod month;


pub use index::{join_asset_url, CalendarIndex};
pub use items::{CalendarItem, Category, ProductRef};
pub use month::{MonthGrid, MonthStep, YearMonth, WEEKDAY_LABELS};
