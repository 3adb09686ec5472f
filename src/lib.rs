// Core of the exam trainer. The terminal front end in main.rs drives these
// modules; integration tests use them directly.

pub mod bank;
pub mod config;
pub mod engine;
pub mod session;
pub mod store;
