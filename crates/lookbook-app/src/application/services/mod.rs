mod calendar_controller;
mod login_form;

#[cfg(test)]
pub(crate) mod test_support;

pub use calendar_controller::{CalendarController, NO_DATA_MESSAGE};
pub use login_form::{LoginFailureHandler, LoginForm, LoginSuccessHandler};
