pub mod bootstrap;
pub mod dtos;
pub mod services;
