// Application layer - composes domain rules with infrastructure adapters
// Consumed by a UI shell; there is no binary target

pub mod application;

pub use application::bootstrap::AppContext;
pub use application::services::{CalendarController, LoginForm};
