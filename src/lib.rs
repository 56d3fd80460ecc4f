// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod analysis;
pub mod app;
pub mod config;
pub mod eventlog;
pub mod nlp;
pub mod protocol;
pub mod repair;
pub mod tui;
