// Domain layer - Pure types and rules
// No I/O; infrastructure implements the traits declared here

pub mod auth;
pub mod calendar;
pub mod favorites;
pub mod gateway;
pub mod shared;
pub mod view;

// Re-exports for convenience
pub use gateway::{BackendGateway, CalendarFetch};
pub use shared::{DomainError, ErrorCode, ErrorSeverity};
